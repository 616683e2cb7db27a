//! Foundation types shared by all layers.

pub mod types;

pub use types::{LandmarkId, ParcelId, Point3, PosKey, RobotId, SlotId};
