//! Warehouse robot fleet controller.
//!
//! A fleet of lift-mast robots stores inbound parcels onto category
//! shelves and ships ordered parcels to conveyor drop points. The crate
//! is organized in layers:
//!
//! - [`core`]: geometry primitives and shared id types.
//! - [`world`]: boundary traits (store, actuator rig, sensors) plus the
//!   kinematic simulation that backs them.
//! - [`estimation`]: scalar recursive filtering and landmark-corrected
//!   pose estimation.
//! - [`sensing`]: obstacle field sampling and the steering decision
//!   engine.
//! - [`planning`]: the walkability grid, A* planner, and the FIFO path
//!   request queue.
//! - [`fleet`]: the orchestrator and per-robot task sequences.
//!
//! Everything runs on a single-threaded cooperative tick loop: one
//! orchestrator tick, one path-queue pump, one simulation step.

pub mod config;
pub mod core;
pub mod error;
pub mod estimation;
pub mod fleet;
pub mod planning;
pub mod sensing;
pub mod world;

pub use config::FleetConfig;
pub use error::{GodamError, Result};
