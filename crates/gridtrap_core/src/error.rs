//! Error types for the game simulation.
//!
//! The tick pipeline itself never fails; these errors cover the edges
//! around it (parsing input tokens, loading levels, replay files).

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Input token is not one of `up`, `down`, `left`, `right`.
    #[error("Unknown direction token: {0:?}")]
    UnknownDirection(String),

    /// No built-in level with this name.
    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    /// Level data does not describe a playable grid.
    #[error("Invalid level '{name}': {message}")]
    InvalidLevel {
        /// Level name.
        name: String,
        /// What is wrong with it.
        message: String,
    },

    /// Binary (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// File system access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Replay was recorded with an incompatible format version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Desync detected while re-running a replay.
    #[error("Desync detected at tick {tick}: expected hash {expected}, got {actual}")]
    DesyncDetected {
        /// Tick where the mismatch was found.
        tick: u64,
        /// Recorded hash.
        expected: u64,
        /// Hash produced by this run.
        actual: u64,
    },
}
