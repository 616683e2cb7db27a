//! A* search over a [`NavGrid`].
//!
//! The planner owns per-cell scratch records (cost, parent, open/closed
//! state) stamped with a search generation, so repeated queries reuse the
//! same allocation without clearing it.

use crate::core::Point3;
use crate::planning::grid::{Cell, NavGrid};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;
use tracing::trace;

/// Why a path query produced no path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("start position outside the grid")]
    StartOutOfBounds,
    #[error("goal position outside the grid")]
    GoalOutOfBounds,
    #[error("start cell is not walkable")]
    StartBlocked,
    #[error("goal cell is not walkable")]
    GoalBlocked,
    #[error("no path between start and goal")]
    NoPath,
}

/// A successful path query result.
#[derive(Debug, Clone)]
pub struct PlannedPath {
    /// Grid cells from start to goal, inclusive.
    pub cells: Vec<Cell>,
    /// World-space waypoints at the cell centers, start to goal.
    pub waypoints: Vec<Point3>,
    /// Accumulated step cost of the goal cell.
    pub cost: u32,
}

/// Anything that can answer path queries. The queue is generic over this
/// so tests can substitute a recording stub.
pub trait PathPlanner {
    fn find_path(&mut self, start: Point3, goal: Point3) -> Result<PlannedPath, PlanError>;
}

const NO_PARENT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Open,
    Closed,
}

/// Per-cell scratch, valid only when `generation` matches the search.
#[derive(Debug, Clone, Copy)]
struct NodeRecord {
    g: u32,
    h: u32,
    parent: u32,
    state: NodeState,
    generation: u32,
}

impl NodeRecord {
    fn stale() -> Self {
        Self {
            g: 0,
            h: 0,
            parent: NO_PARENT,
            state: NodeState::Open,
            generation: 0,
        }
    }
}

/// Open-set entry. Ordering is reversed so the `BinaryHeap` pops the
/// lowest f cost first, ties broken by lower h.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    h: u32,
    index: u32,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* planner holding the grid and its reusable search scratch.
#[derive(Debug)]
pub struct GridPlanner {
    grid: NavGrid,
    records: Vec<NodeRecord>,
    heap: BinaryHeap<OpenNode>,
    generation: u32,
}

impl GridPlanner {
    pub fn new(grid: NavGrid) -> Self {
        let cells = grid.cell_count();
        Self {
            grid,
            records: vec![NodeRecord::stale(); cells],
            heap: BinaryHeap::with_capacity(cells),
            generation: 0,
        }
    }

    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut NavGrid {
        &mut self.grid
    }

    fn heuristic(a: Cell, b: Cell) -> u32 {
        ((a.x - b.x).unsigned_abs() + (a.y - b.y).unsigned_abs()) as u32
    }

    fn record(&mut self, index: usize) -> &mut NodeRecord {
        let record = &mut self.records[index];
        if record.generation != self.generation {
            *record = NodeRecord {
                g: u32::MAX,
                h: 0,
                parent: NO_PARENT,
                state: NodeState::Open,
                generation: self.generation,
            };
        }
        record
    }

    fn retrace(&self, goal_index: usize) -> (Vec<Cell>, Vec<Point3>) {
        let mut cells = Vec::new();
        let mut index = goal_index as u32;
        while index != NO_PARENT {
            cells.push(self.grid.cell_at(index as usize));
            index = self.records[index as usize].parent;
        }
        cells.reverse();
        let waypoints = cells.iter().map(|&c| self.grid.cell_to_world(c)).collect();
        (cells, waypoints)
    }
}

impl PathPlanner for GridPlanner {
    fn find_path(&mut self, start: Point3, goal: Point3) -> Result<PlannedPath, PlanError> {
        let start_cell = self.grid.world_to_cell(start);
        let goal_cell = self.grid.world_to_cell(goal);

        if !self.grid.in_bounds(start_cell) {
            return Err(PlanError::StartOutOfBounds);
        }
        if !self.grid.in_bounds(goal_cell) {
            return Err(PlanError::GoalOutOfBounds);
        }
        if !self.grid.is_walkable(start_cell) {
            return Err(PlanError::StartBlocked);
        }
        if !self.grid.is_walkable(goal_cell) {
            return Err(PlanError::GoalBlocked);
        }

        // New generation invalidates all previous scratch records
        self.generation = self.generation.wrapping_add(1);
        self.heap.clear();

        let start_index = self.grid.index(start_cell);
        let goal_index = self.grid.index(goal_cell);

        let h0 = Self::heuristic(start_cell, goal_cell);
        {
            let record = self.record(start_index);
            record.g = 0;
            record.h = h0;
        }
        self.heap.push(OpenNode {
            f: h0,
            h: h0,
            index: start_index as u32,
        });

        let mut expanded = 0usize;
        while let Some(node) = self.heap.pop() {
            let index = node.index as usize;
            {
                let record = self.record(index);
                if record.state == NodeState::Closed {
                    continue; // stale heap entry
                }
                record.state = NodeState::Closed;
            }
            expanded += 1;

            if index == goal_index {
                let cost = self.records[index].g;
                let (cells, waypoints) = self.retrace(index);
                trace!(expanded, cost, steps = cells.len(), "path found");
                return Ok(PlannedPath {
                    cells,
                    waypoints,
                    cost,
                });
            }

            let cell = self.grid.cell_at(index);
            let g = self.records[index].g;

            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = Cell::new(cell.x + dx, cell.y + dy);
                if !self.grid.is_walkable(next) {
                    continue;
                }

                let next_index = self.grid.index(next);
                let tentative = g + 1 + self.grid.penalty_at(next);

                let record = self.record(next_index);
                if record.state == NodeState::Closed || tentative >= record.g {
                    continue;
                }

                record.g = tentative;
                record.h = Self::heuristic(next, goal_cell);
                record.parent = index as u32;
                let h = record.h;

                self.heap.push(OpenNode {
                    f: tentative + h,
                    h,
                    index: next_index as u32,
                });
            }
        }

        trace!(expanded, "open set exhausted without reaching goal");
        Err(PlanError::NoPath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn open_grid(size: usize) -> NavGrid {
        NavGrid::new(size, size, 1.0, Point3::ZERO)
    }

    /// Breadth-first shortest path length in steps, ignoring penalties.
    fn bfs_steps(grid: &NavGrid, start: Cell, goal: Cell) -> Option<usize> {
        let mut dist = vec![usize::MAX; grid.cell_count()];
        let mut queue = VecDeque::new();
        dist[grid.index(start)] = 0;
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            if cell == goal {
                return Some(dist[grid.index(cell)]);
            }
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = Cell::new(cell.x + dx, cell.y + dy);
                if grid.is_walkable(next) && dist[grid.index(next)] == usize::MAX {
                    dist[grid.index(next)] = dist[grid.index(cell)] + 1;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    #[test]
    fn test_matches_bfs_length_on_maze() {
        let mut grid = open_grid(12);
        // Wall with a single doorway
        for y in 0..12 {
            if y != 7 {
                grid.set_walkable(Cell::new(6, y), false);
            }
        }

        let start = Point3::new(1.5, 0.0, 1.5);
        let goal = Point3::new(10.5, 0.0, 10.5);
        let start_cell = grid.world_to_cell(start);
        let goal_cell = grid.world_to_cell(goal);
        let expected = bfs_steps(&grid, start_cell, goal_cell).unwrap();

        let mut planner = GridPlanner::new(grid);
        let path = planner.find_path(start, goal).unwrap();

        assert_eq!(path.cells.len() - 1, expected);
        assert_eq!(path.cost as usize, expected);
        assert_eq!(path.cells[0], start_cell);
        assert_eq!(*path.cells.last().unwrap(), goal_cell);
    }

    #[test]
    fn test_blocked_endpoints_fail_fast() {
        let mut grid = open_grid(8);
        grid.set_walkable(Cell::new(0, 0), false);

        let mut planner = GridPlanner::new(grid);
        let blocked = Point3::new(0.5, 0.0, 0.5);
        let free = Point3::new(5.5, 0.0, 5.5);

        assert_eq!(
            planner.find_path(blocked, free).unwrap_err(),
            PlanError::StartBlocked
        );
        assert_eq!(
            planner.find_path(free, blocked).unwrap_err(),
            PlanError::GoalBlocked
        );
        assert_eq!(
            planner
                .find_path(Point3::new(-3.0, 0.0, 0.5), free)
                .unwrap_err(),
            PlanError::StartOutOfBounds
        );
    }

    #[test]
    fn test_no_path_when_goal_enclosed() {
        let mut grid = open_grid(8);
        // Box around (5,5)
        for (x, y) in [(4, 4), (5, 4), (6, 4), (4, 5), (6, 5), (4, 6), (5, 6), (6, 6)] {
            grid.set_walkable(Cell::new(x, y), false);
        }

        let mut planner = GridPlanner::new(grid);
        let result = planner.find_path(Point3::new(0.5, 0.0, 0.5), Point3::new(5.5, 0.0, 5.5));
        assert_eq!(result.unwrap_err(), PlanError::NoPath);
    }

    #[test]
    fn test_penalties_divert_path() {
        let mut grid = open_grid(9);
        // Straight route runs through a heavily penalized band
        for y in 0..9 {
            grid.set_penalty(Cell::new(4, y), 10);
        }
        grid.set_penalty(Cell::new(4, 0), 0); // cheap crossing at the edge

        let mut planner = GridPlanner::new(grid);
        let path = planner
            .find_path(Point3::new(1.5, 0.0, 4.5), Point3::new(7.5, 0.0, 4.5))
            .unwrap();

        // The path must cross column 4 exactly once, at the free row
        let crossings: Vec<_> = path.cells.iter().filter(|c| c.x == 4).collect();
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].y, 0);
    }

    #[test]
    fn test_scratch_is_fresh_between_searches() {
        let mut planner = GridPlanner::new(open_grid(10));
        let a = Point3::new(0.5, 0.0, 0.5);
        let b = Point3::new(9.5, 0.0, 9.5);
        let c = Point3::new(9.5, 0.0, 0.5);

        let first = planner.find_path(a, b).unwrap();
        let second = planner.find_path(b, a).unwrap();
        let third = planner.find_path(a, c).unwrap();

        // Costs are pure Manhattan distances on an open grid; stale
        // parents from an earlier search would corrupt the retrace.
        assert_eq!(first.cost, 18);
        assert_eq!(second.cost, 18);
        assert_eq!(third.cost, 9);
        assert_eq!(third.cells.len(), 10);
    }
}
