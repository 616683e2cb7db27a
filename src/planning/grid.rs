//! Walkability grid over the warehouse floor.
//!
//! Cells tile the x/z plane at a fixed size. Shelves and fixed obstacles
//! are stamped in as unwalkable circles; shelf aisles can carry a
//! traversal penalty so planned paths prefer open floor.

use crate::core::Point3;

/// Integer cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A fixed-size walkability grid.
#[derive(Debug, Clone)]
pub struct NavGrid {
    width: usize,
    height: usize,
    cell_size: f32,
    /// World position of the grid's (0, 0) cell corner.
    origin: Point3,
    walkable: Vec<bool>,
    penalty: Vec<u32>,
}

impl NavGrid {
    /// Create an all-walkable, zero-penalty grid. `origin` is the world
    /// position of the lower corner of cell (0, 0).
    pub fn new(width: usize, height: usize, cell_size: f32, origin: Point3) -> Self {
        Self {
            width,
            height,
            cell_size,
            origin,
            walkable: vec![true; width * height],
            penalty: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Flat index of an in-bounds cell.
    pub fn index(&self, cell: Cell) -> usize {
        cell.y as usize * self.width + cell.x as usize
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        Cell::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.walkable[self.index(cell)]
    }

    pub fn penalty_at(&self, cell: Cell) -> u32 {
        self.penalty[self.index(cell)]
    }

    pub fn set_walkable(&mut self, cell: Cell, walkable: bool) {
        if self.in_bounds(cell) {
            let i = self.index(cell);
            self.walkable[i] = walkable;
        }
    }

    pub fn set_penalty(&mut self, cell: Cell, penalty: u32) {
        if self.in_bounds(cell) {
            let i = self.index(cell);
            self.penalty[i] = penalty;
        }
    }

    /// Mark every cell whose center lies within `radius` of `center` as
    /// unwalkable.
    pub fn block_circle(&mut self, center: Point3, radius: f32) {
        self.stamp_circle(center, radius, |grid, cell| {
            let i = grid.index(cell);
            grid.walkable[i] = false;
        });
    }

    /// Add `penalty` to every cell whose center lies within `radius` of
    /// `center`. Used for shelf aisles.
    pub fn add_penalty_circle(&mut self, center: Point3, radius: f32, penalty: u32) {
        self.stamp_circle(center, radius, |grid, cell| {
            let i = grid.index(cell);
            grid.penalty[i] = grid.penalty[i].saturating_add(penalty);
        });
    }

    fn stamp_circle(&mut self, center: Point3, radius: f32, mut apply: impl FnMut(&mut Self, Cell)) {
        let reach = (radius / self.cell_size).ceil() as i32 + 1;
        let center_cell = self.world_to_cell(center);
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let cell = Cell::new(center_cell.x + dx, center_cell.y + dy);
                if !self.in_bounds(cell) {
                    continue;
                }
                if self.cell_to_world(cell).distance_xz(&center) <= radius {
                    apply(self, cell);
                }
            }
        }
    }

    /// Cell containing a world position. May be out of bounds.
    pub fn world_to_cell(&self, position: Point3) -> Cell {
        Cell::new(
            ((position.x - self.origin.x) / self.cell_size).floor() as i32,
            ((position.z - self.origin.z) / self.cell_size).floor() as i32,
        )
    }

    /// World position of a cell's center, on the floor plane.
    pub fn cell_to_world(&self, cell: Cell) -> Point3 {
        Point3::new(
            self.origin.x + (cell.x as f32 + 0.5) * self.cell_size,
            0.0,
            self.origin.z + (cell.y as f32 + 0.5) * self.cell_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_cell_round_trip() {
        let grid = NavGrid::new(20, 20, 0.5, Point3::new(-5.0, 0.0, -5.0));

        let cell = grid.world_to_cell(Point3::new(0.2, 0.0, -1.3));
        assert!(grid.in_bounds(cell));

        let center = grid.cell_to_world(cell);
        assert_eq!(grid.world_to_cell(center), cell);
        assert!(center.distance_xz(&Point3::new(0.2, 0.0, -1.3)) < 0.5);
    }

    #[test]
    fn test_block_circle_marks_cells() {
        let mut grid = NavGrid::new(20, 20, 0.5, Point3::ZERO);
        grid.block_circle(Point3::new(5.0, 0.0, 5.0), 1.0);

        assert!(!grid.is_walkable(grid.world_to_cell(Point3::new(5.0, 0.0, 5.0))));
        assert!(grid.is_walkable(grid.world_to_cell(Point3::new(8.0, 0.0, 8.0))));
    }

    #[test]
    fn test_out_of_bounds_is_not_walkable() {
        let grid = NavGrid::new(4, 4, 1.0, Point3::ZERO);
        assert!(!grid.is_walkable(Cell::new(-1, 0)));
        assert!(!grid.is_walkable(Cell::new(0, 4)));
    }

    #[test]
    fn test_penalty_accumulates() {
        let mut grid = NavGrid::new(10, 10, 1.0, Point3::ZERO);
        let center = Point3::new(5.0, 0.0, 5.0);
        grid.add_penalty_circle(center, 1.0, 3);
        grid.add_penalty_circle(center, 1.0, 3);

        let cell = grid.world_to_cell(center);
        assert_eq!(grid.penalty_at(cell), 6);
        assert!(grid.is_walkable(cell));
    }
}
