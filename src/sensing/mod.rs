//! Local obstacle sensing and avoidance.
//!
//! [`ObstacleSampler`] sweeps range probes into an angular distance
//! profile; [`SteeringEngine`] turns a profile into a single steering
//! decision.

pub mod sampler;
pub mod steering;

pub use sampler::{ObstacleSampler, RangeProfile, RaySample};
pub use steering::{SteerDecision, SteeringEngine};
