//! Test fixtures and helpers.
//!
//! Pre-built stores, levels and simulations for consistent testing.

use gridtrap_core::grid::{Direction, Extent, GridPos};
use gridtrap_core::level::{FinishRule, Level};
use gridtrap_core::prefabs::Prefab;
use gridtrap_core::simulation::Simulation;
use gridtrap_core::store::Store;

/// Fluent builder for hand-placed stores.
///
/// ```
/// use gridtrap_test_utils::fixtures::StoreBuilder;
///
/// let store = StoreBuilder::new().player(0, 0).wall(1, 0).coin(2, 2).build();
/// assert_eq!(store.live_ids().len(), 3);
/// ```
#[derive(Debug, Default, Clone)]
pub struct StoreBuilder {
    store: Store,
}

impl StoreBuilder {
    /// Start from an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place any prefab.
    #[must_use]
    pub fn with(mut self, prefab: Prefab, x: i32, y: i32) -> Self {
        prefab.spawn(&mut self.store, GridPos::new(x, y));
        self
    }

    /// Place the player.
    #[must_use]
    pub fn player(self, x: i32, y: i32) -> Self {
        self.with(Prefab::Player, x, y)
    }

    /// Place a wall.
    #[must_use]
    pub fn wall(self, x: i32, y: i32) -> Self {
        self.with(Prefab::Wall, x, y)
    }

    /// Place a coin.
    #[must_use]
    pub fn coin(self, x: i32, y: i32) -> Self {
        self.with(Prefab::Coin, x, y)
    }

    /// Place a chaser.
    #[must_use]
    pub fn chaser(self, x: i32, y: i32) -> Self {
        self.with(Prefab::Chaser, x, y)
    }

    /// Place a wanderer.
    #[must_use]
    pub fn wanderer(self, x: i32, y: i32) -> Self {
        self.with(Prefab::Wanderer, x, y)
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Store {
        self.store
    }
}

/// Build a level from an ASCII map with the default finish rule.
///
/// # Panics
///
/// Panics if the map is invalid.
#[must_use]
pub fn ascii_level(rows: &[&str]) -> Level {
    Level::from_ascii("fixture", "", FinishRule::default(), rows)
        .unwrap_or_else(|e| panic!("invalid fixture map: {e}"))
}

/// An open arena with the player in one corner and a mix of enemies.
#[must_use]
pub fn busy_arena(seed: u64) -> Simulation {
    let level = ascii_level(&[
        "@.........",
        "......w...",
        "..$.......",
        "......C...",
        ".w....T...",
        "..........",
        "...S....o.",
        ".........$",
    ]);
    Simulation::from_level(&level, seed)
}

/// A fixed input script that walks the player around in loops.
#[must_use]
pub fn looping_inputs(len: usize) -> Vec<Direction> {
    const PATTERN: [Direction; 8] = [
        Direction::Right,
        Direction::Right,
        Direction::Down,
        Direction::Down,
        Direction::Left,
        Direction::Left,
        Direction::Up,
        Direction::Up,
    ];
    PATTERN.iter().copied().cycle().take(len).collect()
}

/// Empty extent-sized store with only the player.
#[must_use]
pub fn lone_player(extent: Extent, at: GridPos) -> Simulation {
    let store = StoreBuilder::new().player(at.x, at.y).build();
    Simulation::new(extent, store, 0)
}
