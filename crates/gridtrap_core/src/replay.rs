//! Replay system for recording and playing back games.
//!
//! A replay stores the serialized starting simulation (store, extent and
//! seeded RNG) plus every direction the player entered, rejected ones
//! included. Re-running the inputs from the starting state must reproduce
//! the recorded final hash.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GameError, Result};
use crate::grid::Direction;
use crate::simulation::Simulation;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Level name, for display.
    pub level: String,
    /// Seed the simulation was created with.
    pub seed: u64,
    /// Serialized starting simulation.
    pub initial_state: Vec<u8>,
    /// Every input in order.
    pub inputs: Vec<Direction>,
    /// Advanced ticks at the end of the game.
    pub final_tick: u64,
    /// Final state hash for verification.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording from `initial`.
    pub fn new(level: impl Into<String>, initial: &Simulation) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            level: level.into(),
            seed: initial.seed(),
            initial_state: initial.serialize()?,
            inputs: Vec::new(),
            final_tick: initial.get_tick(),
            final_hash: initial.state_hash(),
        })
    }

    /// Append one input.
    pub fn record_input(&mut self, direction: Direction) {
        self.inputs.push(direction);
    }

    /// Stamp the end state of the recorded game.
    pub fn finalize(&mut self, simulation: &Simulation) {
        self.final_tick = simulation.get_tick();
        self.final_hash = simulation.state_hash();
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize replay: {e}")))
    }

    /// Decode and check the format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }

        Ok(replay)
    }

    /// Save the replay to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        tracing::info!(path = %path.as_ref().display(), inputs = self.inputs.len(), "Replay saved");
        Ok(())
    }

    /// Load a replay from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Get the initial simulation state for playback.
    pub fn restore_initial_state(&self) -> Result<Simulation> {
        Simulation::deserialize(&self.initial_state)
    }

    /// Get the total number of recorded inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    cursor: usize,
}

impl ReplayPlayer {
    /// Create a player positioned before the first input.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            simulation,
            cursor: 0,
        })
    }

    /// Apply the next input.
    ///
    /// Returns `true` if there are more inputs to play.
    pub fn advance(&mut self) -> bool {
        if let Some(&direction) = self.replay.inputs.get(self.cursor) {
            self.simulation.step(direction);
            self.cursor += 1;
        }
        !self.is_finished()
    }

    /// Rewind and replay up to input index `target`.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        self.simulation = self.replay.restore_initial_state()?;
        self.cursor = 0;
        while self.cursor < target && !self.is_finished() {
            self.advance();
        }
        Ok(())
    }

    /// Number of inputs applied so far.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get a reference to the current simulation state.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Get the replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Check if every input has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.inputs.len()
    }

    /// Play the whole replay and compare against the recorded end state.
    pub fn verify(&mut self) -> Result<()> {
        self.seek(self.replay.inputs.len())?;
        let actual = self.simulation.state_hash();
        if actual != self.replay.final_hash || self.simulation.get_tick() != self.replay.final_tick
        {
            return Err(GameError::DesyncDetected {
                tick: self.simulation.get_tick(),
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(())
    }
}
