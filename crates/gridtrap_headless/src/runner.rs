//! Headless game runner implementation.
//!
//! [`GameSession`] owns one game: the level, its simulation, the metrics
//! being collected and optionally a replay recording. [`HeadlessRunner`]
//! drives a session from a line-based reader (stdin in the binary) and
//! writes the outcome to a writer (stdout).

use std::io::{BufRead, Write};

use gridtrap_core::components::{Player, Position, Sprite};
use gridtrap_core::error::Result as GameResult;
use gridtrap_core::grid::Direction;
use gridtrap_core::level::{GameStatus, Level};
use gridtrap_core::replay::Replay;
use gridtrap_core::simulation::{Simulation, StepOutcome};

use crate::metrics::GameMetrics;
use crate::protocol::{Input, Outcome, ProtocolError};

/// One game in progress.
#[derive(Debug)]
pub struct GameSession {
    level: Level,
    simulation: Simulation,
    status: GameStatus,
    metrics: GameMetrics,
    replay: Option<Replay>,
}

impl GameSession {
    /// Start `level` with the given seed.
    #[must_use]
    pub fn new(level: Level, seed: u64) -> Self {
        let simulation = Simulation::from_level(&level, seed);
        let status = level.is_finished(simulation.store());
        let metrics = GameMetrics::new(level.name.clone(), seed);
        Self {
            level,
            simulation,
            status,
            metrics,
            replay: None,
        }
    }

    /// Record every input into a replay.
    pub fn with_replay(mut self) -> GameResult<Self> {
        self.replay = Some(Replay::new(self.level.name.clone(), &self.simulation)?);
        Ok(self)
    }

    /// Apply one input. Inputs after the game has ended are ignored.
    pub fn apply(&mut self, direction: Direction) -> Option<StepOutcome> {
        if self.status.is_finished() {
            return None;
        }

        let outcome = self.simulation.step(direction);
        self.metrics.inputs += 1;
        if let Some(replay) = &mut self.replay {
            replay.record_input(direction);
        }

        if outcome.is_advanced() {
            self.status = self.level.is_finished(self.simulation.store());
            if self.status.is_finished() {
                tracing::info!(
                    level = %self.level.name,
                    tick = self.simulation.get_tick(),
                    status = ?self.status,
                    "Game finished"
                );
            }
        } else {
            self.metrics.rejected_moves += 1;
        }

        Some(outcome)
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Outcome so far. A running game counts as [`Outcome::Fail`].
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        Outcome::from_status(self.status).unwrap_or(Outcome::Fail)
    }

    /// The simulation being played.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// The level being played.
    #[must_use]
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// Close the session and return its metrics and replay.
    #[must_use]
    pub fn finish(mut self) -> (GameMetrics, Option<Replay>) {
        self.metrics.outcome = self.outcome();
        self.metrics.score = self.simulation.store().despawned_count() as u32;
        self.metrics.duration_ticks = self.simulation.get_tick();
        self.metrics.final_state_hash = self.simulation.state_hash();
        if let Some(replay) = &mut self.replay {
            replay.finalize(&self.simulation);
        }
        (self.metrics, self.replay)
    }
}

/// Draw the board with one glyph per tile. The player is drawn on top.
#[must_use]
pub fn render_board(simulation: &Simulation) -> String {
    let extent = simulation.extent();
    let store = simulation.store();
    let width = extent.width.max(0) as usize;
    let mut rows = vec![vec!['.'; width]; extent.height.max(0) as usize];

    let mut put = |pos: Position, glyph: char| {
        if extent.contains(pos.value) {
            rows[pos.value.y as usize][pos.value.x as usize] = glyph;
        }
    };
    for (id, (sprite, pos)) in store.entries_with_both::<Sprite, Position>() {
        if !store.has::<Player>(id) {
            put(*pos, sprite.glyph());
        }
    }
    if let Some((_, pos)) = store.player() {
        put(pos, Sprite::Player.glyph());
    }

    let mut board = String::with_capacity((width + 1) * rows.len());
    for row in rows {
        board.extend(row);
        board.push('\n');
    }
    board
}

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Simulation seed.
    pub seed: u64,
    /// Print the board after every advanced tick.
    pub show_board: bool,
    /// Record a replay of the session.
    pub record: bool,
}

/// Result of a headless session.
#[derive(Debug)]
pub struct SessionReport {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Replay, if recording was enabled.
    pub replay: Option<Replay>,
}

/// Reads direction tokens and plays one level.
pub struct HeadlessRunner {
    level: Level,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Create a runner for `level`.
    #[must_use]
    pub fn new(level: Level, config: HeadlessConfig) -> Self {
        Self { level, config }
    }

    /// Play until the game ends, the input ends, or `quit` is read.
    ///
    /// Unknown tokens are logged and skipped. The final line written is the
    /// outcome token.
    pub fn run<R: BufRead, W: Write>(
        self,
        input: R,
        mut output: W,
    ) -> Result<SessionReport, ProtocolError> {
        let mut session = GameSession::new(self.level, self.config.seed);
        if self.config.record {
            session = session.with_replay()?;
        }

        tracing::info!(
            level = %session.level().name,
            seed = self.config.seed,
            "Starting headless session"
        );
        if self.config.show_board {
            write!(output, "{}", render_board(session.simulation()))?;
            output.flush()?;
        }

        for (line_no, line) in input.lines().enumerate() {
            if session.status().is_finished() {
                break;
            }
            let line = line?;
            let direction = match Input::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Input::Quit)) => break,
                Ok(Some(Input::Move(direction))) => direction,
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "Skipping input");
                    continue;
                }
            };

            let Some(outcome) = session.apply(direction) else {
                break;
            };
            if let StepOutcome::Rejected(reason) = outcome {
                tracing::debug!(%direction, ?reason, "Move rejected");
            } else if self.config.show_board {
                writeln!(output)?;
                write!(output, "{}", render_board(session.simulation()))?;
                output.flush()?;
            }
        }

        let outcome = session.outcome();
        writeln!(output, "{outcome}")?;
        output.flush()?;

        let (metrics, replay) = session.finish();
        Ok(SessionReport { metrics, replay })
    }
}
