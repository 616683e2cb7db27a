//! Fleet orchestration and per-robot task sequencing.
//!
//! [`Orchestrator`] owns all robot bookkeeping and runs once per tick;
//! [`TaskSequence`] drives one robot's store or ship task step by step
//! and reports completion back over a channel.

pub mod orchestrator;
pub mod robot;
pub mod sequence;
pub mod task;

pub use orchestrator::Orchestrator;
pub use robot::{Robot, RobotState};
pub use sequence::{SeqStatus, TaskMessage, TaskSequence};
pub use task::{AssignmentMaps, Task};
