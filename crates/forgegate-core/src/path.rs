//! A* pathfinding with a bounded result cache.
//!
//! Movement is 4-directional with uniform step cost and a Manhattan
//! heuristic (admissible, so paths are optimal). A cell is traversable only
//! if it lies inside the grid bounds and its modifiers mark it walkable.
//!
//! Results are cached by `(start, end)`. The cache never invalidates
//! itself: callers that change walkability or occupancy must call
//! [`Pathfinder::invalidate`]. At capacity the whole cache is cleared
//! rather than evicting single entries.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::grid::{GridPos, SpatialGrid};

/// Default cache capacity, in cached paths.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// A computed path from start to end inclusive. Empty means unreachable.
pub type PathResult = Vec<GridPos>;

#[derive(Debug)]
pub struct Pathfinder {
    cache: HashMap<(GridPos, GridPos), PathResult>,
    cache_capacity: usize,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Pathfinder::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl Pathfinder {
    pub fn new(cache_capacity: usize) -> Self {
        Pathfinder {
            cache: HashMap::new(),
            cache_capacity,
        }
    }

    /// Shortest 4-directional path from `start` to `end`, endpoints
    /// included. Returns an empty vector when no path exists; the caller
    /// decides what unreachable means.
    pub fn find_path(&mut self, grid: &SpatialGrid, start: GridPos, end: GridPos) -> PathResult {
        if let Some(cached) = self.cache.get(&(start, end)) {
            return cached.clone();
        }
        let path = astar(grid, start, end);
        if self.cache.len() >= self.cache_capacity {
            log::debug!("path cache full ({} entries), clearing", self.cache.len());
            self.cache.clear();
        }
        self.cache.insert((start, end), path.clone());
        path
    }

    /// Drop every cached path. Call after any walkability change.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }
}

fn astar(grid: &SpatialGrid, start: GridPos, end: GridPos) -> PathResult {
    if !grid.is_walkable(start) || !grid.is_walkable(end) {
        return Vec::new();
    }
    if start == end {
        return vec![start];
    }

    // Heap entries are (f_score, insertion_seq, pos) wrapped in Reverse for
    // a min-heap. The sequence number makes tie-breaks deterministic.
    let mut open: BinaryHeap<Reverse<(u32, u64, GridPos)>> = BinaryHeap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut g_score: HashMap<GridPos, u32> = HashMap::new();
    let mut seq: u64 = 0;

    g_score.insert(start, 0);
    open.push(Reverse((start.manhattan_distance(&end), seq, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == end {
            return reconstruct(&came_from, current);
        }
        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);
        for neighbor in current.neighbors4() {
            if !grid.is_walkable(neighbor) {
                continue;
            }
            let tentative = current_g + 1;
            if tentative < g_score.get(&neighbor).copied().unwrap_or(u32::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative);
                seq += 1;
                let f = tentative + neighbor.manhattan_distance(&end);
                open.push(Reverse((f, seq, neighbor)));
            }
        }
    }
    Vec::new()
}

fn reconstruct(came_from: &HashMap<GridPos, GridPos>, mut current: GridPos) -> PathResult {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}
