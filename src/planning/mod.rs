//! Grid pathfinding.
//!
//! [`NavGrid`] tiles the floor into walkable cells, [`GridPlanner`] runs
//! A* over it, and [`PathRequestQueue`] serializes queries so the
//! planner's search scratch is never reentered.

pub mod astar;
pub mod grid;
pub mod queue;

pub use astar::{GridPlanner, PathPlanner, PlanError, PlannedPath};
pub use grid::{Cell, NavGrid};
pub use queue::{PathCallback, PathRequestQueue};
