//! Seeded block-based level generation.
//!
//! A level is a rectangle of NxN blocks. Each [`BlockDef`] is a template of
//! cell modifiers plus door edges; the generator fills the block grid
//! left-to-right, bottom-to-top, picking uniformly among blocks whose door
//! edges are compatible with the already-placed west and south neighbors.
//! The chosen layout is stamped onto the spatial grid, and enemy spawn
//! cells derive from doors on the outer boundary.
//!
//! Generation is deterministic: the same blocks, dimensions, and seed
//! always produce the same plan.

use thiserror::Error;

use forgegate_core::grid::{CellModifiers, GridError, GridPos, SpatialGrid};
use forgegate_core::rng::SimRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// A resolved block template. Local coordinates run 0..size on both axes,
/// y increasing northward.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDef {
    pub name: String,
    pub size: i32,
    pub base: CellModifiers,
    pub overrides: Vec<(GridPos, CellModifiers)>,
    pub doors: Vec<Direction>,
}

impl BlockDef {
    pub fn has_door(&self, dir: Direction) -> bool {
        self.doors.contains(&dir)
    }

    /// Modifiers for a local cell, override first.
    pub fn modifiers_at(&self, local: GridPos) -> &CellModifiers {
        self.overrides
            .iter()
            .find(|(pos, _)| *pos == local)
            .map(|(_, m)| m)
            .unwrap_or(&self.base)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfig {
    /// Block columns.
    pub blocks_x: i32,
    /// Block rows.
    pub blocks_y: i32,
    pub seed: u64,
}

/// One placed block in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlacement {
    /// Index into the block list handed to the generator.
    pub block: usize,
    /// Position in the block grid.
    pub block_pos: GridPos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelPlan {
    pub placements: Vec<BlockPlacement>,
    /// Candidate enemy spawn cells: outer-boundary door cells that are
    /// spawnable.
    pub spawn_cells: Vec<GridPos>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("no blocks to generate from")]
    NoBlocks,
    #[error("blocks must share one size, found {0} and {1}")]
    MixedSizes(i32, i32),
    #[error("no block fits at block position ({x}, {y})")]
    NoCompatibleBlock { x: i32, y: i32 },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Generate a level and stamp it onto `grid`, growing the grid as needed.
pub fn generate_level(
    grid: &mut SpatialGrid,
    blocks: &[BlockDef],
    config: &LevelConfig,
) -> Result<LevelPlan, LevelError> {
    if blocks.is_empty() {
        return Err(LevelError::NoBlocks);
    }
    let size = blocks[0].size;
    for b in blocks {
        if b.size != size {
            return Err(LevelError::MixedSizes(size, b.size));
        }
    }

    let mut rng = SimRng::new(config.seed);
    let mut chosen: Vec<usize> = Vec::with_capacity((config.blocks_x * config.blocks_y) as usize);
    let mut placements = Vec::with_capacity(chosen.capacity());

    // Bottom-to-top, left-to-right, so west and south neighbors are always
    // already placed.
    for by in 0..config.blocks_y {
        for bx in 0..config.blocks_x {
            let west = (bx > 0).then(|| chosen[(by * config.blocks_x + bx - 1) as usize]);
            let south = (by > 0).then(|| chosen[((by - 1) * config.blocks_x + bx) as usize]);

            let candidates: Vec<usize> = (0..blocks.len())
                .filter(|&i| {
                    let b = &blocks[i];
                    let west_ok = west
                        .map(|w| blocks[w].has_door(Direction::East) == b.has_door(Direction::West))
                        .unwrap_or(true);
                    let south_ok = south
                        .map(|s| {
                            blocks[s].has_door(Direction::North) == b.has_door(Direction::South)
                        })
                        .unwrap_or(true);
                    west_ok && south_ok
                })
                .collect();
            let Some(&pick) =
                candidates.get(rng.next_range(candidates.len() as u64) as usize)
            else {
                return Err(LevelError::NoCompatibleBlock { x: bx, y: by });
            };
            chosen.push(pick);
            placements.push(BlockPlacement {
                block: pick,
                block_pos: GridPos::new(bx, by),
            });
        }
    }

    // Stamp modifiers and collect boundary spawn cells.
    let mut spawn_cells = Vec::new();
    for placement in &placements {
        let block = &blocks[placement.block];
        let origin = GridPos::new(
            placement.block_pos.x * size,
            placement.block_pos.y * size,
        );
        for ly in 0..size {
            for lx in 0..size {
                let local = GridPos::new(lx, ly);
                let world = GridPos::new(origin.x + lx, origin.y + ly);
                grid.expand_to(world)?;
                grid.set_modifiers(world, block.modifiers_at(local).clone())?;
            }
        }

        let mid = size / 2;
        let mut boundary_door = |dir: Direction, cell: GridPos| {
            if block.has_door(dir) && block.modifiers_at(cell_to_local(cell, origin)).spawnable {
                spawn_cells.push(cell);
            }
        };
        if placement.block_pos.y == config.blocks_y - 1 {
            boundary_door(Direction::North, GridPos::new(origin.x + mid, origin.y + size - 1));
        }
        if placement.block_pos.y == 0 {
            boundary_door(Direction::South, GridPos::new(origin.x + mid, origin.y));
        }
        if placement.block_pos.x == config.blocks_x - 1 {
            boundary_door(Direction::East, GridPos::new(origin.x + size - 1, origin.y + mid));
        }
        if placement.block_pos.x == 0 {
            boundary_door(Direction::West, GridPos::new(origin.x, origin.y + mid));
        }
    }

    Ok(LevelPlan {
        placements,
        spawn_cells,
    })
}

fn cell_to_local(cell: GridPos, origin: GridPos) -> GridPos {
    GridPos::new(cell.x - origin.x, cell.y - origin.y)
}

/// An open 4x4 block with doors on every edge, the fallback terrain.
pub fn open_block() -> BlockDef {
    BlockDef {
        name: "open".to_string(),
        size: 4,
        base: CellModifiers::default(),
        overrides: Vec::new(),
        doors: vec![
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ],
    }
}
