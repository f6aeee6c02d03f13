//! Property tests for pathfinding, the store and the tick pipeline.

use std::collections::HashSet;

use gridtrap_core::components::{EntityId, Fightable, Position};
use gridtrap_core::grid::{Extent, GridPos};
use gridtrap_core::pathfinding::find_grid_path;
use gridtrap_core::simulation::Simulation;
use gridtrap_core::store::Store;
use gridtrap_test_utils::determinism::strategies::{
    arb_extent_and_two_tiles, arb_inputs, arb_seed,
};
use gridtrap_test_utils::determinism::verify_simulation_determinism;
use gridtrap_test_utils::fixtures::busy_arena;
use gridtrap_test_utils::proptest::prelude::*;

// =============================================================================
// A*
// =============================================================================

proptest! {
    /// On an open grid every path is a Manhattan-length chain of orthogonal
    /// steps from start to goal.
    #[test]
    fn prop_open_grid_paths_are_manhattan((extent, start, goal) in arb_extent_and_two_tiles(12)) {
        let path = find_grid_path(extent, &HashSet::new(), start, goal);
        prop_assert!(path.is_some());
        let path = path.unwrap_or_default();

        prop_assert_eq!(path.first(), Some(&start));
        prop_assert_eq!(path.last(), Some(&goal));
        prop_assert_eq!((path.len() - 1) as i64, start.manhattan_distance(goal));
        for pair in path.windows(2) {
            prop_assert!(pair[0].is_orthogonally_adjacent(pair[1]));
            prop_assert!(extent.contains(pair[1]));
        }
    }

    /// A goal whose every neighbour is blocked cannot be reached from
    /// anywhere else.
    #[test]
    fn prop_enclosed_goal_has_no_path((extent, start, goal) in arb_extent_and_two_tiles(10)) {
        prop_assume!(start != goal);
        prop_assume!(!start.is_orthogonally_adjacent(goal));

        let walls: HashSet<GridPos> = goal
            .orthogonal_neighbors()
            .into_iter()
            .filter(|n| extent.contains(*n))
            .collect();
        prop_assert_eq!(find_grid_path(extent, &walls, start, goal), None);
    }

    /// Identical inputs give identical paths.
    #[test]
    fn prop_pathfinding_is_repeatable(
        (extent, start, goal) in arb_extent_and_two_tiles(10),
        walls in prop::collection::hash_set((0i32..10, 0i32..10), 0..30),
    ) {
        let walls: HashSet<GridPos> = walls
            .into_iter()
            .map(|(x, y)| GridPos::new(x, y))
            .filter(|p| *p != start)
            .collect();
        let first = find_grid_path(extent, &walls, start, goal);
        let second = find_grid_path(extent, &walls, start, goal);
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone)]
enum StoreOp {
    Create,
    SetPosition(usize, i32, i32),
    RemovePosition(usize),
    SetFightable(usize),
    Despawn(usize),
}

fn arb_store_op() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        Just(StoreOp::Create),
        (0usize..8, 0i32..5, 0i32..5).prop_map(|(i, x, y)| StoreOp::SetPosition(i, x, y)),
        (0usize..8).prop_map(StoreOp::RemovePosition),
        (0usize..8).prop_map(StoreOp::SetFightable),
        (0usize..8).prop_map(StoreOp::Despawn),
    ]
}

proptest! {
    /// `get` returns a value exactly for the ids listed by `ids_with`, and
    /// ids are never reused.
    #[test]
    fn prop_store_lookup_matches_id_sets(ops in prop::collection::vec(arb_store_op(), 0..60)) {
        let mut store = Store::new();
        let mut created: Vec<EntityId> = Vec::new();
        let pick = |created: &[EntityId], i: usize| created.get(i % created.len().max(1)).copied();

        for op in ops {
            match op {
                StoreOp::Create => {
                    let id = store.create_entity(|_, _| {});
                    prop_assert!(!created.contains(&id));
                    created.push(id);
                }
                StoreOp::SetPosition(i, x, y) => {
                    if let Some(id) = pick(&created, i) {
                        store.set(id, Position::at(x, y));
                    }
                }
                StoreOp::RemovePosition(i) => {
                    if let Some(id) = pick(&created, i) {
                        store.remove::<Position>(id);
                    }
                }
                StoreOp::SetFightable(i) => {
                    if let Some(id) = pick(&created, i) {
                        store.set(id, Fightable);
                    }
                }
                StoreOp::Despawn(i) => {
                    if let Some(id) = pick(&created, i) {
                        store.despawn(id);
                    }
                }
            }

            let positions = store.ids_with::<Position>();
            let fightables = store.ids_with::<Fightable>();
            for &id in &created {
                prop_assert_eq!(store.get::<Position>(id).is_some(), positions.contains(&id));
                prop_assert_eq!(store.get::<Fightable>(id).is_some(), fightables.contains(&id));
            }
        }
    }
}

// =============================================================================
// Tick pipeline
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Same seed and inputs always reach the same state.
    #[test]
    fn prop_random_games_are_deterministic(seed in arb_seed(), inputs in arb_inputs(60)) {
        prop_assert!(verify_simulation_determinism(|| busy_arena(seed), &inputs));
    }

    /// The player never leaves the grid and a rejected input changes nothing.
    #[test]
    fn prop_player_stays_in_bounds(seed in arb_seed(), inputs in arb_inputs(60)) {
        let mut sim = busy_arena(seed);
        let extent: Extent = sim.extent();

        for dir in inputs {
            let before = sim.store().clone();
            let tick = sim.get_tick();
            let outcome = sim.step(dir);

            if outcome.is_advanced() {
                prop_assert_eq!(sim.get_tick(), tick + 1);
            } else {
                prop_assert_eq!(sim.store(), &before);
                prop_assert_eq!(sim.get_tick(), tick);
            }
            if let Some((_, pos)) = sim.store().player() {
                prop_assert!(extent.contains(pos.value));
            }
        }
    }

    /// Restoring a saved game mid-way continues identically.
    #[test]
    fn prop_save_restore_continues(seed in arb_seed(), inputs in arb_inputs(40), split in 0usize..40) {
        let mut sim = busy_arena(seed);
        let split = split.min(inputs.len());
        for &dir in &inputs[..split] {
            sim.step(dir);
        }
        let bytes = sim.serialize().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut restored = Simulation::deserialize(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;

        for &dir in &inputs[split..] {
            prop_assert_eq!(sim.step(dir), restored.step(dir));
        }
        prop_assert_eq!(sim.state_hash(), restored.state_hash());
    }
}
