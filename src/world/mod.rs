//! Boundary interfaces to the world outside the core.
//!
//! The orchestration and navigation layers only ever see these traits: the
//! persistent store, the robot actuator rig, and the range/proximity
//! sensors. [`sim`] provides the kinematic simulation backing used by the
//! binary and the integration tests.

pub mod actuator;
pub mod sensors;
pub mod sim;
pub mod store;

pub use actuator::RobotRig;
pub use sensors::{EntityHandle, SensorSuite};
pub use store::{StoreError, WarehouseStore};

use crate::core::{Point3, RobotId};

/// The facets of the world one robot's control code needs in a tick.
///
/// The rig is exclusive (commands mutate it); the sensors are shared.
pub struct WorldView<'a> {
    pub rig: &'a mut dyn RobotRig,
    pub sensors: &'a dyn SensorSuite,
}

/// World access for the orchestrator's tick loop.
pub trait FleetWorld {
    /// Number of robots in the world.
    fn robot_count(&self) -> usize;

    /// Exclusive rig plus shared sensors for one robot.
    fn view(&mut self, robot: RobotId) -> WorldView<'_>;

    /// Read-only rig access (telemetry, distances).
    fn rig(&self, robot: RobotId) -> &dyn RobotRig;

    /// Home/charging pose of a robot.
    fn home_pose(&self, robot: RobotId) -> Point3;

    /// Advance the physical simulation by `dt` seconds.
    fn step(&mut self, dt: f32);
}
