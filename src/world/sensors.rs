//! Range, proximity and line-of-sight sensor interface.

use crate::core::{LandmarkId, Point3};

/// Handle to an entity a sensor can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityHandle {
    /// A uniquely identified localization landmark.
    Landmark(LandmarkId),
    /// An anonymous solid obstacle (shelving, wall, column).
    Obstacle(u32),
}

/// Sensor queries available to a robot.
pub trait SensorSuite {
    /// Cast rays from `origin` along world-frame yaw angles (radians).
    ///
    /// Returns one distance per direction; misses report `max_range`.
    fn range_scan(&self, origin: Point3, directions_rad: &[f32], max_range: f32) -> Vec<f32>;

    /// Entities within `radius` of `origin` (omnidirectional), with their
    /// sensed positions.
    fn proximity(&self, origin: Point3, radius: f32) -> Vec<(EntityHandle, Point3)>;

    /// First entity hit on the ray from `origin` toward `target`, if any
    /// within that segment. Used to confirm landmark visibility.
    fn line_of_sight(&self, origin: Point3, target: Point3) -> Option<EntityHandle>;
}

/// Ray/circle intersection on the floor plane.
///
/// Returns the distance along the ray to the first intersection with a
/// circle at `center` with `radius`, if it is in front of the origin.
pub fn ray_circle_distance(
    origin: Point3,
    dir_x: f32,
    dir_z: f32,
    center: Point3,
    radius: f32,
) -> Option<f32> {
    let ox = center.x - origin.x;
    let oz = center.z - origin.z;

    // Projection of center onto the ray
    let t = ox * dir_x + oz * dir_z;
    if t < 0.0 {
        return None;
    }

    // Perpendicular distance from center to the ray
    let px = origin.x + dir_x * t;
    let pz = origin.z + dir_z * t;
    let dx = center.x - px;
    let dz = center.z - pz;
    let perp_sq = dx * dx + dz * dz;

    let r_sq = radius * radius;
    if perp_sq > r_sq {
        return None;
    }

    let offset = (r_sq - perp_sq).sqrt();
    let hit = t - offset;
    if hit >= 0.0 { Some(hit) } else { Some(0.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_circle_ahead() {
        let d = ray_circle_distance(
            Point3::ZERO,
            1.0,
            0.0,
            Point3::new(5.0, 0.0, 0.0),
            1.0,
        );
        assert!((d.unwrap() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_offset_circle() {
        let d = ray_circle_distance(
            Point3::ZERO,
            1.0,
            0.0,
            Point3::new(5.0, 0.0, 3.0),
            1.0,
        );
        assert!(d.is_none());
    }

    #[test]
    fn test_ray_ignores_circle_behind() {
        let d = ray_circle_distance(
            Point3::ZERO,
            1.0,
            0.0,
            Point3::new(-5.0, 0.0, 0.0),
            1.0,
        );
        assert!(d.is_none());
    }
}
