//! Expandable spatial grid.
//!
//! Every coordinate inside the current bounds has a materialized cell;
//! cells live in a `BTreeMap` keyed by position, so iteration order is
//! deterministic. Bounds grow monotonically: accessing a position outside
//! them triggers an expansion in `expansion_step` increments, subject to
//! an optional maximum extent and a hard per-expansion cell ceiling, and
//! the newly covered rectangle is materialized immediately. Cells are
//! never destroyed, only cleared.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::fixed::Fixed64;
use crate::id::BuildingId;
use crate::math::{Vec2Fixed, WorldPos};

/// Hard ceiling on how many cells a single expansion may add.
pub const MAX_EXPANSION_CELLS: i64 = 10_000;

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }

    /// Manhattan (L1) distance. Used as the pathfinding heuristic.
    pub fn manhattan_distance(&self, other: &GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbors, in a fixed order.
    pub fn neighbors4(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.x + 1, self.y),
            GridPos::new(self.x - 1, self.y),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x, self.y - 1),
        ]
    }
}

/// Per-cell terrain modifiers, stamped by level generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellModifiers {
    pub walkable: bool,
    pub spawnable: bool,
    pub production_bonus: Fixed64,
    pub biome: String,
}

impl Default for CellModifiers {
    fn default() -> Self {
        CellModifiers {
            walkable: true,
            spawnable: true,
            production_bonus: Fixed64::ONE,
            biome: "default".to_string(),
        }
    }
}

/// A single grid cell: occupancy plus terrain modifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridCell {
    pub occupied: bool,
    pub owner: Option<BuildingId>,
    pub modifiers: CellModifiers,
}

/// Immutable grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// World-space edge length of one cell.
    pub cell_size: Fixed64,
    pub initial_width: i32,
    pub initial_height: i32,
    /// Bounds grow in multiples of this when a position outside is touched.
    pub expansion_step: i32,
    /// Optional cap on total width/height. `None` = unbounded.
    pub max_grid_size: Option<i32>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            cell_size: Fixed64::ONE,
            initial_width: 20,
            initial_height: 20,
            expansion_step: 10,
            max_grid_size: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("position ({x}, {y}) is outside the maximum grid extent")]
    MaxSizeReached { x: i32, y: i32 },
    #[error("expansion to ({x}, {y}) would add {cells} cells, over the per-expansion ceiling")]
    ExpansionTooLarge { x: i32, y: i32, cells: i64 },
    #[error("area at ({x}, {y}) size {width}x{height} is not available")]
    AreaUnavailable {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

/// The expandable grid. Single-threaded; callers hold `&mut` for anything
/// that can create cells (availability checks included).
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    config: GridConfig,
    cells: BTreeMap<GridPos, GridCell>,
    min: GridPos,
    max: GridPos,
}

impl SpatialGrid {
    pub fn new(config: GridConfig) -> Self {
        let max = GridPos::new(
            config.initial_width.max(1) - 1,
            config.initial_height.max(1) - 1,
        );
        let mut grid = SpatialGrid {
            config,
            cells: BTreeMap::new(),
            min: GridPos::new(0, 0),
            max,
        };
        grid.materialize_bounds();
        grid
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Current inclusive bounds `(min, max)`.
    pub fn bounds(&self) -> (GridPos, GridPos) {
        (self.min, self.max)
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Existing cell, if any. Does not create or expand.
    pub fn cell(&self, pos: GridPos) -> Option<&GridCell> {
        self.cells.get(&pos)
    }

    /// The cell at `pos`, expanding bounds first when `pos` lies outside
    /// them. Inside the bounds every cell already exists.
    pub fn ensure_cell(&mut self, pos: GridPos) -> Result<&mut GridCell, GridError> {
        if !self.in_bounds(pos) {
            self.expand_to(pos)?;
        }
        Ok(self.cells.entry(pos).or_default())
    }

    /// Every coordinate within the bounds has a cell. Existing cells keep
    /// their state.
    fn materialize_bounds(&mut self) {
        for y in self.min.y..=self.max.y {
            for x in self.min.x..=self.max.x {
                self.cells.entry(GridPos::new(x, y)).or_default();
            }
        }
    }

    /// Grow the bounds to cover `pos`, in `expansion_step` increments.
    ///
    /// Bounds never shrink. Fails when the maximum extent would be exceeded
    /// or when a single expansion would add more than
    /// [`MAX_EXPANSION_CELLS`] cells.
    pub fn expand_to(&mut self, pos: GridPos) -> Result<(), GridError> {
        if self.in_bounds(pos) {
            return Ok(());
        }
        let step = self.config.expansion_step.max(1);
        let grow = |bound: i32, target: i32, dir: i32| -> i32 {
            let mut b = bound;
            while (target - b) * dir > 0 {
                b += step * dir;
            }
            b
        };
        let mut new_min = GridPos::new(
            grow(self.min.x, pos.x, -1),
            grow(self.min.y, pos.y, -1),
        );
        let mut new_max = GridPos::new(grow(self.max.x, pos.x, 1), grow(self.max.y, pos.y, 1));

        if let Some(limit) = self.config.max_grid_size {
            // Per axis only one bound can move (pos is a single point), so
            // pull the moved side back when the span exceeds the cap.
            if new_max.x - new_min.x + 1 > limit {
                if new_min.x < self.min.x {
                    new_min.x = new_max.x - limit + 1;
                } else {
                    new_max.x = new_min.x + limit - 1;
                }
            }
            if new_max.y - new_min.y + 1 > limit {
                if new_min.y < self.min.y {
                    new_min.y = new_max.y - limit + 1;
                } else {
                    new_max.y = new_min.y + limit - 1;
                }
            }
            let covered = pos.x >= new_min.x
                && pos.x <= new_max.x
                && pos.y >= new_min.y
                && pos.y <= new_max.y;
            if !covered {
                log::warn!(
                    "grid expansion to ({}, {}) refused: max extent {} reached",
                    pos.x,
                    pos.y,
                    limit
                );
                return Err(GridError::MaxSizeReached { x: pos.x, y: pos.y });
            }
        }

        let old_area =
            (self.max.x - self.min.x + 1) as i64 * (self.max.y - self.min.y + 1) as i64;
        let new_area =
            (new_max.x - new_min.x + 1) as i64 * (new_max.y - new_min.y + 1) as i64;
        let added = new_area - old_area;
        if added > MAX_EXPANSION_CELLS {
            log::warn!(
                "grid expansion to ({}, {}) refused: would add {} cells",
                pos.x,
                pos.y,
                added
            );
            return Err(GridError::ExpansionTooLarge {
                x: pos.x,
                y: pos.y,
                cells: added,
            });
        }

        self.min = new_min;
        self.max = new_max;
        self.materialize_bounds();
        Ok(())
    }

    /// Every cell in the area exists (created on demand), is unoccupied,
    /// and is spawnable. Expansion failure makes the area unavailable.
    pub fn is_area_available(&mut self, origin: GridPos, width: i32, height: i32) -> bool {
        for y in 0..height {
            for x in 0..width {
                let pos = GridPos::new(origin.x + x, origin.y + y);
                match self.ensure_cell(pos) {
                    Ok(cell) => {
                        if cell.occupied || !cell.modifiers.spawnable {
                            return false;
                        }
                    }
                    Err(_) => return false,
                }
            }
        }
        true
    }

    /// Re-validates availability, then marks every cell occupied by `owner`.
    pub fn occupy_area(
        &mut self,
        origin: GridPos,
        width: i32,
        height: i32,
        owner: BuildingId,
    ) -> Result<(), GridError> {
        if !self.is_area_available(origin, width, height) {
            return Err(GridError::AreaUnavailable {
                x: origin.x,
                y: origin.y,
                width,
                height,
            });
        }
        for y in 0..height {
            for x in 0..width {
                let pos = GridPos::new(origin.x + x, origin.y + y);
                // Cells exist after the availability pass.
                if let Some(cell) = self.cells.get_mut(&pos) {
                    cell.occupied = true;
                    cell.owner = Some(owner);
                }
            }
        }
        Ok(())
    }

    /// Unconditionally clears occupancy over the area. Out-of-bounds cells
    /// are skipped; modifiers are untouched.
    pub fn free_area(&mut self, origin: GridPos, width: i32, height: i32) {
        for y in 0..height {
            for x in 0..width {
                let pos = GridPos::new(origin.x + x, origin.y + y);
                if let Some(cell) = self.cells.get_mut(&pos) {
                    cell.occupied = false;
                    cell.owner = None;
                }
            }
        }
    }

    /// Stamp terrain modifiers onto a cell, creating it as needed.
    pub fn set_modifiers(&mut self, pos: GridPos, mods: CellModifiers) -> Result<(), GridError> {
        self.ensure_cell(pos)?.modifiers = mods;
        Ok(())
    }

    /// A cell is walkable only if it is inside the bounds and its
    /// modifiers allow it.
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.cells
            .get(&pos)
            .map(|c| c.modifiers.walkable)
            .unwrap_or(false)
    }

    /// World-space position of a cell's lower-left corner. Grid origin is
    /// world zero.
    pub fn grid_to_world(&self, pos: GridPos) -> WorldPos {
        Vec2Fixed::new(
            Fixed64::from_num(pos.x) * self.config.cell_size,
            Fixed64::from_num(pos.y) * self.config.cell_size,
        )
    }

    /// Grid cell containing a world-space point.
    pub fn world_to_grid(&self, pos: WorldPos) -> GridPos {
        let x: i64 = (pos.x / self.config.cell_size).floor().to_num();
        let y: i64 = (pos.y / self.config.cell_size).floor().to_num();
        GridPos::new(x as i32, y as i32)
    }

    /// World-space centroid of a footprint: corner + size * cell / 2.
    pub fn center_position(&self, origin: GridPos, width: i32, height: i32) -> WorldPos {
        let half = Fixed64::from_num(0.5);
        let corner = self.grid_to_world(origin);
        Vec2Fixed::new(
            corner.x + Fixed64::from_num(width) * self.config.cell_size * half,
            corner.y + Fixed64::from_num(height) * self.config.cell_size * half,
        )
    }

    /// Number of cells that have been materialized.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.values().filter(|c| c.occupied).count()
    }

    /// Deterministic iteration over existing cells.
    pub fn iter_cells(&self) -> impl Iterator<Item = (&GridPos, &GridCell)> {
        self.cells.iter()
    }
}
