//! # Gridtrap Core
//!
//! Deterministic simulation core for a turn-based grid game.
//!
//! This crate contains **only** the game rules:
//! - No rendering
//! - No terminal or file IO outside replays
//! - No unseeded randomness
//!
//! This separation enables:
//! - Headless batch runs
//! - Replay verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`store`] - Entity/component store
//! - [`components`] - Component definitions
//! - [`pathfinding`] - Generic A* search
//! - [`zones`] - Control-zone shapes
//! - [`systems`] - Per-tick systems
//! - [`simulation`] - Tick pipeline and seeded simulation
//! - [`level`] - Levels and finish rules

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod error;
pub mod grid;
pub mod level;
pub mod pathfinding;
pub mod prefabs;
pub mod replay;
pub mod simulation;
pub mod store;
pub mod systems;
pub mod zones;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Direction, Extent, GridPos};
    pub use crate::level::{builtin, FinishRule, GameStatus, Level, LoseCondition, WinCondition};
    pub use crate::pathfinding::{find_grid_path, find_path};
    pub use crate::prefabs::Prefab;
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::simulation::{step, Simulation, StepOutcome, TickEvents};
    pub use crate::store::{Component, Store};
    pub use crate::systems::MoveRejection;
}
