//! Batch game runner for outcome statistics.
//!
//! Plays many games of one level in parallel using rayon. Each game is fed
//! random moves from its own seeded stream, so a batch is reproducible from
//! `seed_start` alone.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use gridtrap_core::grid::Direction;
use gridtrap_core::level::Level;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::metrics::{BatchSummary, GameMetrics};
use crate::protocol::Outcome;
use crate::runner::GameSession;

/// Stream used for generated inputs, kept apart from the simulation stream.
const INPUT_STREAM: u64 = 1;

/// Errors raised by batch runs.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The worker pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// Reading or writing results failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Results file is not valid JSON.
    #[error("Invalid results file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Level name or path
    pub level: String,
    /// Number of games to run
    pub game_count: u32,
    /// Worker threads (0 = rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Seed of the first game; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Random moves fed to each game before it counts as failed
    pub max_moves: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            level: "meadow".to_string(),
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_moves: 500,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific level
    #[must_use]
    pub fn new(level: &str, game_count: u32) -> Self {
        Self {
            level: level.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the move budget per game
    #[must_use]
    pub fn with_max_moves(mut self, max_moves: u32) -> Self {
        self.max_moves = max_moves;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, ordered by seed
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), BatchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Live outcome counters shared by the worker threads.
#[derive(Debug, Default)]
pub struct BatchProgress {
    total: u32,
    won: AtomicU32,
    lost: AtomicU32,
    failed: AtomicU32,
}

impl BatchProgress {
    /// Create a tracker for `total` games.
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Record a completed game.
    pub fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Won => &self.won,
            Outcome::Lost => &self.lost,
            Outcome::Fail => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// `(won, lost, failed)` so far.
    #[must_use]
    pub fn snapshot(&self) -> (u32, u32, u32) {
        (
            self.won.load(Ordering::Relaxed),
            self.lost.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }

    /// Games completed so far.
    #[must_use]
    pub fn current(&self) -> u32 {
        let (won, lost, failed) = self.snapshot();
        won + lost + failed
    }

    /// Completion percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }
}

/// The random move sequence a batch game with `seed` receives.
#[must_use]
pub fn random_inputs(seed: u64, count: u32) -> Vec<Direction> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(INPUT_STREAM);
    (0..count)
        .map(|_| Direction::ALL[rng.gen_range(0..Direction::ALL.len())])
        .collect()
}

/// Play one game of `level` with random moves.
#[must_use]
pub fn run_single_game(level: &Level, seed: u64, max_moves: u32) -> GameMetrics {
    let mut session = GameSession::new(level.clone(), seed);
    for direction in random_inputs(seed, max_moves) {
        if session.apply(direction).is_none() {
            break;
        }
    }
    session.finish().0
}

/// Run a batch of games.
pub fn run_batch(level: &Level, config: BatchConfig) -> Result<BatchResults, BatchError> {
    let start = Instant::now();
    let progress = BatchProgress::new(config.game_count);

    info!(
        level = %level.name,
        games = config.game_count,
        seed_start = config.seed_start,
        "Starting batch run"
    );

    let mut builder = rayon::ThreadPoolBuilder::new();
    if config.parallel_games > 0 {
        builder = builder.num_threads(config.parallel_games as usize);
    }
    let pool = builder.build()?;

    let games: Vec<GameMetrics> = pool.install(|| {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let metrics = run_single_game(level, seed, config.max_moves);
                progress.record(metrics.outcome);

                let completed = progress.current();
                if completed % 100 == 0 {
                    let (won, lost, failed) = progress.snapshot();
                    debug!(
                        completed,
                        percent = progress.percentage(),
                        won,
                        lost,
                        failed,
                        "Batch progress"
                    );
                }
                metrics
            })
            .collect()
    });

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        won = summary.won,
        lost = summary.lost,
        failed = summary.failed,
        "Batch complete in {:.2}s",
        duration_seconds
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
    })
}

/// Play the same seed `runs` times and check every run ends identically.
#[must_use]
pub fn verify_determinism(level: &Level, seed: u64, runs: u32, max_moves: u32) -> bool {
    let results: Vec<GameMetrics> = (0..runs)
        .map(|_| run_single_game(level, seed, max_moves))
        .collect();

    let Some(first) = results.first() else {
        return true;
    };
    results.iter().all(|r| r == first)
}
