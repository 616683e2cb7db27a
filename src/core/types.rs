//! Core geometric and identity types.
//!
//! Robots move on the warehouse floor plane (x/z); y is the vertical axis
//! used by the mast. All distances are meters, angles are radians unless a
//! name says degrees.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Robot identity within the fleet.
pub type RobotId = u32;

/// Parcel identity in the backing store.
pub type ParcelId = u32;

/// Shelf slot identity in the backing store.
pub type SlotId = u32;

/// Landmark identity used for localization correction.
pub type LandmarkId = u32;

/// A 3-D position (floor plane x/z, vertical y).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance projected onto the floor plane (ignores y).
    pub fn distance_xz(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Linear interpolation toward `other` by factor `t` in [0, 1].
    pub fn lerp(&self, other: &Point3, t: f32) -> Point3 {
        let t = t.clamp(0.0, 1.0);
        Point3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    /// Floor-plane heading from this point to another (radians).
    pub fn bearing_to(&self, other: &Point3) -> f32 {
        (other.z - self.z).atan2(other.x - self.x)
    }

    /// Point offset from `self` along the line toward `target`, stopping
    /// `standoff` meters short of it. Used for approach poses.
    pub fn approach_point(&self, target: &Point3, standoff: f32) -> Point3 {
        let d = self.distance_xz(target);
        if d <= standoff || d <= f32::EPSILON {
            return *self;
        }
        let t = (d - standoff) / d;
        Point3::new(
            self.x + (target.x - self.x) * t,
            target.y,
            self.z + (target.z - self.z) * t,
        )
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f32) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Position quantized to millimeters, usable as a hash map key.
///
/// The assignment maps key parcels by their source position; f32 cannot be
/// hashed directly, so positions are snapped to a 1mm grid first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PosKey {
    x_mm: i64,
    y_mm: i64,
    z_mm: i64,
}

impl From<Point3> for PosKey {
    fn from(p: Point3) -> Self {
        Self {
            x_mm: (p.x * 1000.0).round() as i64,
            y_mm: (p.y * 1000.0).round() as i64,
            z_mm: (p.z * 1000.0).round() as i64,
        }
    }
}

/// Normalize an angle in degrees to [0, 360).
pub fn normalize_deg(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a < 0.0 {
        a += 360.0;
    }
    a
}

/// Absolute circular difference between two angles in degrees, in [0, 180].
pub fn angular_diff_deg(a: f32, b: f32) -> f32 {
    let d = (normalize_deg(a) - normalize_deg(b)).abs();
    if d > 180.0 { 360.0 - d } else { d }
}

/// Normalize an angle in radians to [-pi, pi].
pub fn normalize_rad(angle: f32) -> f32 {
    let mut a = angle % std::f32::consts::TAU;
    if a > std::f32::consts::PI {
        a -= std::f32::consts::TAU;
    } else if a < -std::f32::consts::PI {
        a += std::f32::consts::TAU;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_xz_ignores_y() {
        let a = Point3::new(0.0, 5.0, 0.0);
        let b = Point3::new(3.0, -2.0, 4.0);
        assert!((a.distance_xz(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_clamps() {
        let a = Point3::ZERO;
        let b = Point3::new(2.0, 0.0, 0.0);
        assert!((a.lerp(&b, 0.5).x - 1.0).abs() < 1e-6);
        assert!((a.lerp(&b, 2.0).x - 2.0).abs() < 1e-6);
        assert!((a.lerp(&b, -1.0).x - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_approach_point_stops_short() {
        let robot = Point3::ZERO;
        let target = Point3::new(10.0, 0.0, 0.0);
        let p = robot.approach_point(&target, 1.0);
        assert!((p.x - 9.0).abs() < 1e-5);
        assert!((p.z - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_pos_key_quantizes() {
        let a = Point3::new(1.0001, 0.0, -2.0);
        let b = Point3::new(1.0003, 0.0, -2.0002);
        assert_eq!(PosKey::from(a), PosKey::from(b));

        let c = Point3::new(1.01, 0.0, -2.0);
        assert_ne!(PosKey::from(a), PosKey::from(c));
    }

    #[test]
    fn test_normalize_deg() {
        assert!((normalize_deg(-30.0) - 330.0).abs() < 1e-6);
        assert!((normalize_deg(370.0) - 10.0).abs() < 1e-6);
        assert!((angular_diff_deg(350.0, 10.0) - 20.0).abs() < 1e-6);
    }
}
