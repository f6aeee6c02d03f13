//! ECS component definitions.
//!
//! Components are pure data with no behavior. All game entities
//! are composed of these components, stored per kind in [`crate::store::Store`].

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;

/// Unique identifier for entities.
pub type EntityId = u64;

/// Ticks a switcher stays in its area-control phase.
pub const SWITCHER_CONTROL_TICKS: u32 = 2;

/// Ticks a switcher spends chasing before it locks down its area again.
pub const SWITCHER_IDLE_TICKS: u32 = 5;

/// Position component in grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Tile the entity occupies.
    pub value: GridPos,
}

impl Position {
    /// Create a new position at the given tile.
    #[must_use]
    pub const fn new(value: GridPos) -> Self {
        Self { value }
    }

    /// Create a position from raw coordinates.
    #[must_use]
    pub const fn at(x: i32, y: i32) -> Self {
        Self {
            value: GridPos::new(x, y),
        }
    }
}

/// Marks the entity steered by the player's input.
///
/// Exactly one entity should carry this. Nothing enforces it; a store with
/// no player rejects every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Player;

/// How an AI entity picks its next tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    /// Step to a uniformly chosen free neighbour.
    Random,
    /// Step along an A* path towards the player.
    Chase,
}

/// Blocks pathfinding and movement of other AI entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Obstruction;

/// Area-effect shape, rasterized around the owner's position.
///
/// See [`crate::zones`] for the exact tile sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlShape {
    /// The owner's tile and its eight neighbours.
    Switcher,
    /// The owner's tile only.
    Mine,
    /// The owner's full row and column.
    Rook,
    /// Both diagonals through the owner.
    Archer,
}

/// The player may not step into tiles covered by this entity's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Control {
    /// Zone shape.
    pub shape: ControlShape,
}

impl Control {
    /// Create a control component with the given shape.
    #[must_use]
    pub const fn new(shape: ControlShape) -> Self {
        Self { shape }
    }
}

/// Removed entirely when the player ends its move on the same tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Fightable;

/// Alternates between chasing and locking down its 3x3 neighbourhood.
///
/// Whether the switcher is currently controlling is read from the presence of
/// a [`Control`] component, not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Switcher {
    /// Ticks until the next phase flip.
    pub left: u32,
}

impl Switcher {
    /// A switcher starting in its idle (chasing) phase.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            left: SWITCHER_IDLE_TICKS,
        }
    }
}

impl Switcher {
    /// Advance the countdown by one tick.
    ///
    /// Returns `true` when the phase should flip. The caller sets the new
    /// `left` for the phase it switches into.
    pub fn advance(&mut self) -> bool {
        count_down(&mut self.left)
    }
}

impl Default for Switcher {
    fn default() -> Self {
        Self::idle()
    }
}

/// Drops a mine behind itself every `interval` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trapper {
    /// Ticks until the next mine.
    pub left: u32,
    /// Countdown value after each mine.
    pub interval: u32,
}

impl Trapper {
    /// Create a trapper whose first mine drops after `interval` ticks.
    #[must_use]
    pub const fn new(interval: u32) -> Self {
        Self {
            left: interval,
            interval,
        }
    }

    /// Advance the countdown by one tick.
    ///
    /// Returns `true` when the countdown reaches zero; it is then reset to
    /// `interval` and the caller should drop a mine. A zero interval fires
    /// every tick.
    pub fn advance(&mut self) -> bool {
        advance_countdown(&mut self.left, self.interval)
    }
}

/// What a [`Spawner`] creates when its countdown expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRecipe {
    /// A fightable enemy that paths towards the player.
    Chaser,
    /// A fightable enemy that walks randomly.
    Wanderer,
    /// A random-walking trapper with the given mine interval.
    Trapper {
        /// Mine interval for the spawned trapper.
        interval: u32,
    },
    /// A switcher in its idle phase.
    Switcher,
    /// A collectible coin.
    Coin,
}

/// Periodically creates a new entity at its own position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spawner {
    /// Ticks until the next spawn.
    pub left: u32,
    /// Countdown value after each spawn.
    pub interval: u32,
    /// Entity kind to create.
    pub recipe: SpawnRecipe,
}

impl Spawner {
    /// Create a spawner that fires on its first tick, then every `interval` ticks.
    #[must_use]
    pub const fn new(interval: u32, recipe: SpawnRecipe) -> Self {
        Self {
            left: 0,
            interval,
            recipe,
        }
    }

    /// Advance the countdown by one tick. See [`Trapper::advance`].
    pub fn advance(&mut self) -> bool {
        advance_countdown(&mut self.left, self.interval)
    }
}

/// Decrement a running countdown. Returns `true` once it is at zero.
fn count_down(left: &mut u32) -> bool {
    if *left > 0 {
        *left -= 1;
    }
    *left == 0
}

fn advance_countdown(left: &mut u32, interval: u32) -> bool {
    if !count_down(left) {
        return false;
    }
    *left = interval;
    true
}

/// Cosmetic tag read by renderers. Has no effect on the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sprite {
    /// The player token.
    Player,
    /// Static wall.
    Wall,
    /// Mine left by a trapper.
    Mine,
    /// Switcher enemy.
    Switcher,
    /// Trapper enemy.
    Trapper,
    /// Rook enemy.
    Rook,
    /// Archer tower.
    Archer,
    /// Stationary defeatable blocker.
    Rester,
    /// Spawn point.
    Spawner,
    /// Chasing enemy.
    Chaser,
    /// Random-walking enemy.
    Wanderer,
    /// Collectible.
    Coin,
}

impl Sprite {
    /// Single-character glyph used by text renderers.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Player => '@',
            Self::Wall => '#',
            Self::Mine => '*',
            Self::Switcher => 'S',
            Self::Trapper => 'T',
            Self::Rook => 'R',
            Self::Archer => 'A',
            Self::Rester => 'r',
            Self::Spawner => 'O',
            Self::Chaser => 'C',
            Self::Wanderer => 'w',
            Self::Coin => '$',
        }
    }
}
