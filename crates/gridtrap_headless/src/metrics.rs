//! Game metrics for batch statistics.
//!
//! Each headless game produces one [`GameMetrics`]; a batch folds them into
//! a [`BatchSummary`].

use serde::{Deserialize, Serialize};

use crate::protocol::Outcome;

/// Metrics for a single game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Level name.
    pub level: String,
    /// Simulation seed.
    pub seed: u64,
    /// How the game ended.
    pub outcome: Outcome,
    /// Entities removed from play.
    pub score: u32,
    /// Inputs consumed, rejected ones included.
    pub inputs: u32,
    /// Advanced ticks.
    pub duration_ticks: u64,
    /// Inputs refused because the move was illegal.
    pub rejected_moves: u32,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Start metrics for a game that has not produced an outcome yet.
    #[must_use]
    pub fn new(level: impl Into<String>, seed: u64) -> Self {
        Self {
            level: level.into(),
            seed,
            outcome: Outcome::Fail,
            score: 0,
            inputs: 0,
            duration_ticks: 0,
            rejected_moves: 0,
            final_state_hash: 0,
        }
    }
}

/// Aggregate statistics across a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won.
    pub won: u32,
    /// Games lost.
    pub lost: u32,
    /// Games that ran out of inputs.
    pub failed: u32,
    /// `won / total_games`.
    pub win_rate: f64,
    /// Average score.
    pub avg_score: f64,
    /// Best score.
    pub max_score: u32,
    /// Average game duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest game.
    pub min_duration_ticks: u64,
    /// Longest game.
    pub max_duration_ticks: u64,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut score_sum = 0u64;
        let mut duration_sum = 0u64;

        for game in games {
            match game.outcome {
                Outcome::Won => summary.won += 1,
                Outcome::Lost => summary.lost += 1,
                Outcome::Fail => summary.failed += 1,
            }
            score_sum += u64::from(game.score);
            summary.max_score = summary.max_score.max(game.score);
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);
        }

        let n = f64::from(summary.total_games);
        summary.win_rate = f64::from(summary.won) / n;
        summary.avg_score = score_sum as f64 / n;
        summary.avg_duration_ticks = duration_sum as f64 / n;
        summary
    }
}
