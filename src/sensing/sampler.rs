//! Obstacle field sampling.
//!
//! Casts a fan or ring of range probes around a robot and converts the
//! hits into an angular distance profile. Angles are in the sensor frame:
//! integer degrees 0..ray_count, with 90 pointing straight ahead.

use crate::core::Point3;
use crate::estimation::ScalarFilter;
use crate::world::SensorSuite;

/// One range probe result.
#[derive(Debug, Clone, Copy)]
pub struct RaySample {
    /// Sensor-frame angle in degrees (index into the sweep).
    pub angle_deg: usize,
    /// Measured distance, capped at max range (meters).
    pub distance: f32,
    /// True when the distance is below the obstacle threshold.
    pub blocked: bool,
}

/// A full sweep of ray samples for one decision cycle.
#[derive(Debug, Clone)]
pub struct RangeProfile {
    samples: Vec<RaySample>,
}

impl RangeProfile {
    /// Build a profile from raw distances, tagging each ray against the
    /// threshold. Sample `i` is the ray at `i` sensor-frame degrees.
    pub fn from_distances(distances: &[f32], threshold: f32) -> Self {
        Self::with_offset(distances, threshold, 0)
    }

    /// Like [`RangeProfile::from_distances`], with sample `i` at angle
    /// `start_deg + i` (arc sweeps that do not begin at 0°).
    pub fn with_offset(distances: &[f32], threshold: f32, start_deg: usize) -> Self {
        let samples = distances
            .iter()
            .enumerate()
            .map(|(i, &d)| RaySample {
                angle_deg: start_deg + i,
                distance: d,
                blocked: d < threshold,
            })
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample(&self, index: usize) -> &RaySample {
        &self.samples[index]
    }

    pub fn is_blocked(&self, index: usize) -> bool {
        self.samples[index].blocked
    }

    pub fn blocked_count(&self) -> usize {
        self.samples.iter().filter(|s| s.blocked).count()
    }

    /// Fraction of rays classified as obstacles, in [0, 1].
    pub fn blocked_fraction(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.blocked_count() as f32 / self.samples.len() as f32
    }
}

/// Sweeps range probes through the sensor suite into a [`RangeProfile`].
pub struct ObstacleSampler {
    ray_count: usize,
    max_range: f32,
    threshold: f32,
    /// Optional per-ray denoising filter bank, keyed by ray index.
    filters: Option<Vec<ScalarFilter>>,
    /// Scratch direction buffer, reused between sweeps.
    directions: Vec<f32>,
}

impl ObstacleSampler {
    pub fn new(ray_count: usize, max_range: f32, threshold: f32) -> Self {
        Self {
            ray_count,
            max_range,
            threshold,
            filters: None,
            directions: Vec::with_capacity(ray_count),
        }
    }

    /// Enable per-ray denoising with the given filter noise model.
    pub fn with_denoise(mut self, process_noise: f32, measurement_noise: f32) -> Self {
        self.filters = Some(
            (0..self.ray_count)
                .map(|_| ScalarFilter::new(self.max_range, 1.0, process_noise, measurement_noise))
                .collect(),
        );
        self
    }

    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    /// Full 360° sweep around the robot.
    ///
    /// Ray `i` points at sensor-frame angle `i` degrees; sensor-frame 90
    /// maps to the robot's forward yaw.
    pub fn sweep(
        &mut self,
        sensors: &dyn SensorSuite,
        origin: Point3,
        forward_yaw: f32,
    ) -> RangeProfile {
        self.cast(sensors, origin, forward_yaw, 0, self.ray_count)
    }

    /// Forward fan of `arc_deg` degrees centered on the heading.
    pub fn arc(
        &mut self,
        sensors: &dyn SensorSuite,
        origin: Point3,
        forward_yaw: f32,
        arc_deg: usize,
    ) -> RangeProfile {
        let half = (arc_deg / 2).min(90);
        self.cast(sensors, origin, forward_yaw, 90 - half, 90 + half + 1)
    }

    fn cast(
        &mut self,
        sensors: &dyn SensorSuite,
        origin: Point3,
        forward_yaw: f32,
        from_deg: usize,
        to_deg: usize,
    ) -> RangeProfile {
        self.directions.clear();
        for i in from_deg..to_deg {
            let sensor_angle = i as f32;
            self.directions
                .push(forward_yaw + (sensor_angle - 90.0).to_radians());
        }

        let mut distances = sensors.range_scan(origin, &self.directions, self.max_range);

        if let Some(filters) = &mut self.filters {
            for (i, d) in distances.iter_mut().enumerate() {
                let ray = from_deg + i;
                if let Some(filter) = filters.get_mut(ray) {
                    *d = filter.update(*d).min(self.max_range);
                }
            }
        }

        RangeProfile::with_offset(&distances, self.threshold, from_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::sim::Arena;

    #[test]
    fn test_profile_tags_threshold() {
        let profile = RangeProfile::from_distances(&[0.5, 1.5, 0.99, 1.0], 1.0);
        assert!(profile.is_blocked(0));
        assert!(!profile.is_blocked(1));
        assert!(profile.is_blocked(2));
        assert!(!profile.is_blocked(3)); // exactly at threshold is clear
        assert_eq!(profile.blocked_count(), 2);
        assert!((profile.blocked_fraction() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sweep_sees_obstacle_ahead() {
        let mut arena = Arena::default();
        // Obstacle straight ahead of a robot facing +x
        arena.add_obstacle(1, Point3::new(2.0, 0.0, 0.0), 0.3);

        let mut sampler = ObstacleSampler::new(360, 4.0, 2.5);
        let profile = sampler.sweep(&arena, Point3::ZERO, 0.0);

        assert_eq!(profile.len(), 360);
        // Forward ray (sensor frame 90) hits at 1.7m
        assert!(profile.is_blocked(90));
        assert!((profile.sample(90).distance - 1.7).abs() < 0.01);
        // Rear ray is clear at max range
        assert!(!profile.is_blocked(270));
        assert!((profile.sample(270).distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_arc_is_centered_on_forward() {
        let arena = Arena::default();
        let mut sampler = ObstacleSampler::new(360, 4.0, 1.0);
        let profile = sampler.arc(&arena, Point3::ZERO, 0.0, 60);

        // 30 each side of the forward ray, inclusive
        assert_eq!(profile.len(), 61);
        assert_eq!(profile.sample(0).angle_deg, 60);
        assert_eq!(profile.sample(60).angle_deg, 120);
    }

    #[test]
    fn test_denoise_converges_on_repeated_sweeps() {
        let mut arena = Arena::default();
        arena.add_obstacle(1, Point3::new(2.0, 0.0, 0.0), 0.3);

        let mut sampler = ObstacleSampler::new(360, 4.0, 2.5).with_denoise(0.5, 0.1);

        let mut forward = 0.0;
        for _ in 0..20 {
            let profile = sampler.sweep(&arena, Point3::ZERO, 0.0);
            forward = profile.sample(90).distance;
        }
        assert!((forward - 1.7).abs() < 0.05);
    }
}
