//! Property-based tests for the grid, pathfinding, and routing layers.
//!
//! Uses proptest to generate random placements, expansions, and obstacle
//! layouts, then verifies structural invariants hold.

use forgegate_core::building::Rotation;
use forgegate_core::fixed::Seconds;
use forgegate_core::grid::{CellModifiers, GridConfig, GridPos, SpatialGrid};
use forgegate_core::path::Pathfinder;
use forgegate_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_pos(extent: i32) -> impl Strategy<Value = GridPos> {
    (0..extent, 0..extent).prop_map(|(x, y)| GridPos::new(x, y))
}

fn open_grid(extent: i32) -> SpatialGrid {
    SpatialGrid::new(GridConfig {
        initial_width: extent,
        initial_height: extent,
        ..GridConfig::default()
    })
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Occupy then free restores availability for any area inside bounds.
    #[test]
    fn occupy_free_round_trip(
        origin in arb_pos(16),
        w in 1..4i32,
        h in 1..4i32,
    ) {
        let mut grid = open_grid(20);
        let mut sm = slotmap::SlotMap::<forgegate_core::id::BuildingId, ()>::with_key();
        let id = sm.insert(());

        prop_assume!(grid.is_area_available(origin, w, h));
        grid.occupy_area(origin, w, h, id).unwrap();
        prop_assert!(!grid.is_area_available(origin, w, h));
        grid.free_area(origin, w, h);
        prop_assert!(grid.is_area_available(origin, w, h));
    }

    /// Expansion is idempotent and monotone: expanding to a position twice
    /// changes nothing, and bounds only grow.
    #[test]
    fn expansion_idempotent_and_monotone(target in -40..60i32, target_y in -40..60i32) {
        let mut grid = SpatialGrid::new(GridConfig::default());
        let pos = GridPos::new(target, target_y);

        grid.expand_to(pos).unwrap();
        let bounds_after_first = grid.bounds();
        prop_assert!(grid.in_bounds(pos));

        grid.expand_to(pos).unwrap();
        prop_assert_eq!(grid.bounds(), bounds_after_first);

        let (min, max) = bounds_after_first;
        prop_assert!(min.x <= 0 && min.y <= 0);
        prop_assert!(max.x >= 19 && max.y >= 19);
        // Every in-bounds coordinate is materialized.
        prop_assert_eq!(
            grid.cell_count() as i64,
            (max.x - min.x + 1) as i64 * (max.y - min.y + 1) as i64
        );
    }

    /// On an open grid, A* always finds a path of Manhattan length + 1.
    #[test]
    fn astar_is_manhattan_on_open_grid(start in arb_pos(12), end in arb_pos(12)) {
        let grid = open_grid(12);
        let mut pf = Pathfinder::default();
        let path = pf.find_path(&grid, start, end);
        prop_assert_eq!(
            path.len() as u32,
            start.manhattan_distance(&end) + 1
        );
        prop_assert_eq!(path.first(), Some(&start));
        prop_assert_eq!(path.last(), Some(&end));
        // Consecutive waypoints are orthogonal neighbors.
        for pair in path.windows(2) {
            prop_assert_eq!(pair[0].manhattan_distance(&pair[1]), 1);
        }
    }

    /// Random obstacles never break path validity: every returned path
    /// steps only on walkable cells.
    #[test]
    fn astar_paths_avoid_obstacles(
        walls in proptest::collection::hash_set((0..10i32, 0..10i32), 0..30),
        start in arb_pos(10),
        end in arb_pos(10),
    ) {
        let mut grid = open_grid(10);
        for &(x, y) in &walls {
            let mut mods = CellModifiers::default();
            mods.walkable = false;
            grid.set_modifiers(GridPos::new(x, y), mods).unwrap();
        }
        let mut pf = Pathfinder::default();
        let path = pf.find_path(&grid, start, end);
        for pos in &path {
            prop_assert!(grid.is_walkable(*pos), "path crosses wall at {pos:?}");
        }
        if !path.is_empty() {
            prop_assert_eq!(path.first(), Some(&start));
            prop_assert_eq!(path.last(), Some(&end));
        }
    }

    /// The cache never changes results: a cached lookup equals a fresh
    /// computation.
    #[test]
    fn path_cache_is_transparent(start in arb_pos(12), end in arb_pos(12)) {
        let grid = open_grid(12);
        let mut cached = Pathfinder::default();
        let first = cached.find_path(&grid, start, end);
        let second = cached.find_path(&grid, start, end);
        prop_assert_eq!(&first, &second);

        let mut fresh = Pathfinder::default();
        prop_assert_eq!(first, fresh.find_path(&grid, start, end));
    }

    /// Ticking a world with arbitrary small placements never panics and
    /// conserves pooled units (everything live sits on some conveyor).
    #[test]
    fn tick_safety_with_random_layouts(
        placements in proptest::collection::vec((0..4u8, arb_pos(10)), 1..12),
        ticks in 1..40usize,
    ) {
        let (mut world, ids) = test_world();
        for (kind, origin) in placements {
            let type_id = match kind {
                0 => ids.miner,
                1 => ids.belt,
                2 => ids.smelter,
                _ => ids.turret,
            };
            // Overlaps are expected; refusals are part of the contract.
            let _ = world.place_building(type_id, origin, Rotation::None);
        }
        for _ in 0..ticks {
            world.tick(Seconds::from_num(0.1));
        }
        let on_belts: usize = world
            .building_order()
            .iter()
            .filter_map(|&id| world.conveyor(id))
            .map(|c| c.items().len())
            .sum();
        prop_assert_eq!(world.live_resource_units(), on_belts);
    }
}
