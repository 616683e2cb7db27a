//! FIFO serialization of path queries.
//!
//! The planner holds mutable search scratch, so only one query may run at
//! a time. Requests queue in arrival order; the owner pumps the queue
//! once per control cycle and callbacks fire with the query result.

use crate::core::Point3;
use crate::planning::astar::{PathPlanner, PlanError, PlannedPath};
use std::collections::VecDeque;
use tracing::debug;

/// Callback invoked with the outcome of one path request.
pub type PathCallback = Box<dyn FnOnce(Result<PlannedPath, PlanError>) + Send>;

struct PathRequest {
    start: Point3,
    goal: Point3,
    callback: PathCallback,
}

/// Owns a planner and feeds it queued requests strictly in arrival order.
pub struct PathRequestQueue<P: PathPlanner> {
    planner: P,
    queue: VecDeque<PathRequest>,
    in_flight: bool,
}

impl<P: PathPlanner> PathRequestQueue<P> {
    pub fn new(planner: P) -> Self {
        Self {
            planner,
            queue: VecDeque::new(),
            in_flight: false,
        }
    }

    pub fn planner_mut(&mut self) -> &mut P {
        &mut self.planner
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue a path query. The callback fires from a later [`pump`]
    /// call, never from inside `request`.
    ///
    /// [`pump`]: PathRequestQueue::pump
    pub fn request(&mut self, start: Point3, goal: Point3, callback: PathCallback) {
        self.queue.push_back(PathRequest {
            start,
            goal,
            callback,
        });
    }

    /// Run the head request, if any. At most one query executes per pump
    /// and no query overlaps another.
    pub fn pump(&mut self) {
        if self.in_flight {
            return;
        }
        let Some(request) = self.queue.pop_front() else {
            return;
        };

        self.in_flight = true;
        let result = self.planner.find_path(request.start, request.goal);
        if let Err(e) = &result {
            debug!(error = %e, "path request failed");
        }
        (request.callback)(result);
        self.in_flight = false;
    }

    /// Pump until the queue is empty. Callbacks still fire in FIFO order.
    pub fn drain(&mut self) {
        while !self.queue.is_empty() {
            self.pump();
        }
    }
}
