//! Headless game runner for scripted play and CI verification.
//!
//! This crate drives a [`gridtrap_core`] game without any rendering:
//!
//! - **Scripted play**: direction tokens on stdin, the outcome on stdout
//! - **Outcome statistics**: many random-input games in parallel
//! - **Replay verification**: check that replays reproduce their final hash
//!
//! # Protocol
//!
//! - **stdin**: one direction per line (`up`, `down`, `left`, `right`)
//! - **stdout**: the final `WON`, `LOST` or `FAIL` line
//! - **stderr**: logs
//!
//! See [`protocol`] for details.
//!
//! # Example
//!
//! ```bash
//! printf 'right\nright\ndown\n' | cargo run -p gridtrap_headless -- play --level meadow
//! cargo run -p gridtrap_headless -- batch --level hive --count 1000 --output results/
//! cargo run -p gridtrap_headless -- replay --file game.replay --verify
//! ```

pub mod batch;
pub mod level_file;
pub mod metrics;
pub mod protocol;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use level_file::{resolve_level, LevelFile, LevelFileError};
pub use metrics::{BatchSummary, GameMetrics};
pub use protocol::{Input, Outcome, ProtocolError};
pub use runner::{GameSession, HeadlessConfig, HeadlessRunner};
