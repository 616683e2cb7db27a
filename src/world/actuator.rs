//! Robot actuator interface.
//!
//! Command-then-poll surface over the drive base and the vertical mast.
//! Commands return immediately; the control code polls the settled checks
//! at its own tick rate and suspends until they pass.

use crate::core::{ParcelId, Point3};

/// Actuator rig of a single robot.
pub trait RobotRig {
    /// Current pose on the floor plane.
    fn position(&self) -> Point3;

    /// Current yaw (radians, world frame).
    fn yaw(&self) -> f32;

    /// Dead-reckoned odometry position (drifts; localization corrects it).
    fn odometry(&self) -> Point3;

    /// Current mast carriage height (meters).
    fn mast_height(&self) -> f32;

    /// Drive toward a target position.
    fn command_move(&mut self, target: Point3);

    /// Rotate in place toward a yaw (radians, world frame).
    fn command_orient(&mut self, yaw: f32);

    /// Move the mast carriage to a height, clamped to the safety bounds.
    fn command_mast(&mut self, height: f32);

    /// Stop all drive motion immediately (mast keeps settling).
    fn halt(&mut self);

    /// True when within `tolerance` of the last commanded move target.
    fn arrived(&self, tolerance: f32) -> bool;

    /// True when within `tolerance_rad` of the last commanded yaw.
    fn oriented(&self, tolerance_rad: f32) -> bool;

    /// True when the mast is within `tolerance` of its commanded height.
    fn mast_settled(&self, tolerance: f32) -> bool;

    /// Parent the parcel to the mast carriage (disables its physics).
    fn attach_payload(&mut self, parcel: ParcelId);

    /// Release the payload at the carriage position plus `release_offset`.
    ///
    /// Returns the parcel that was carried, if any.
    fn detach_payload(&mut self, release_offset: Point3) -> Option<ParcelId>;

    /// Parcel currently attached, if any.
    fn carrying(&self) -> Option<ParcelId>;
}
