//! Headless grid game runner.
//!
//! Plays levels without rendering, driven by direction tokens on stdin.
//! Designed for scripted play, CI testing and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Play a level from stdin
//! printf 'right\ndown\n' | cargo run -p gridtrap_headless -- play --level meadow
//!
//! # Run a batch of random-input games
//! cargo run -p gridtrap_headless -- batch --level hive --count 1000 --output results/
//!
//! # Check a replay still reproduces
//! cargo run -p gridtrap_headless -- replay --file game.replay --verify
//! ```
//!
//! Logs go to stderr; stdout carries only the protocol.

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gridtrap_core::level::builtin;
use gridtrap_core::replay::{Replay, ReplayPlayer};
use gridtrap_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    level_file::resolve_level,
    runner::{HeadlessConfig, HeadlessRunner},
};

#[derive(Parser)]
#[command(name = "gridtrap_headless")]
#[command(about = "Headless grid game runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game, reading moves from stdin
    Play {
        /// Built-in level name or path to a RON level file
        #[arg(short, long, default_value = "meadow")]
        level: String,

        /// Simulation seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print the board after every tick
        #[arg(long)]
        show: bool,

        /// Save a replay of the session to this path
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Run a batch of random-input games
    Batch {
        /// Built-in level name or path to a RON level file
        #[arg(short, long, default_value = "meadow")]
        level: String,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Random moves per game
        #[arg(long, default_value = "500")]
        max_moves: u32,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Built-in level name or path to a RON level file
        #[arg(short, long, default_value = "meadow")]
        level: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Random moves per run
        #[arg(long, default_value = "500")]
        max_moves: u32,
    },

    /// Replay a recorded game
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },

    /// List built-in levels
    Levels,
}

fn main() {
    let cli = Cli::parse();

    // stdout is reserved for the protocol
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Play {
            level,
            seed,
            show,
            record,
        } => cmd_play(&level, seed, show, record),
        Commands::Batch {
            level,
            count,
            parallel,
            output,
            seed,
            max_moves,
        } => {
            let config = BatchConfig {
                level,
                game_count: count,
                parallel_games: parallel,
                output_dir: output,
                seed_start: seed,
                max_moves,
            };
            cmd_batch(config);
        }
        Commands::Verify {
            level,
            seed,
            runs,
            max_moves,
        } => cmd_verify(&level, seed, runs, max_moves),
        Commands::Replay { file, verify } => cmd_replay(&file, verify),
        Commands::Levels => cmd_levels(),
    }
}

fn fatal(message: &str, error: &dyn std::fmt::Display) -> ! {
    tracing::error!(error = %error, "{message}");
    std::process::exit(1);
}

/// Play a single game over stdin/stdout
fn cmd_play(level: &str, seed: u64, show: bool, record: Option<PathBuf>) {
    let level = resolve_level(level).unwrap_or_else(|e| fatal("Failed to load level", &e));
    if !level.info.is_empty() {
        tracing::info!(level = %level.name, "{}", level.info);
    }

    let config = HeadlessConfig {
        seed,
        show_board: show,
        record: record.is_some(),
    };
    let stdin = io::stdin();
    let stdout = BufWriter::new(io::stdout().lock());
    let report = HeadlessRunner::new(level, config)
        .run(stdin.lock(), stdout)
        .unwrap_or_else(|e| fatal("Session failed", &e));

    tracing::info!(
        outcome = %report.metrics.outcome,
        score = report.metrics.score,
        ticks = report.metrics.duration_ticks,
        rejected = report.metrics.rejected_moves,
        "Session complete"
    );

    if let (Some(path), Some(replay)) = (record, report.replay) {
        replay
            .save(&path)
            .unwrap_or_else(|e| fatal("Failed to save replay", &e));
        tracing::info!(path = %path.display(), inputs = replay.input_count(), "Replay saved");
    }
}

/// Run a batch of games and save the results
fn cmd_batch(config: BatchConfig) {
    let level = resolve_level(&config.level).unwrap_or_else(|e| fatal("Failed to load level", &e));

    tracing::info!(
        level = %config.level,
        count = config.game_count,
        parallel = config.parallel_games,
        seed = config.seed_start,
        max_moves = config.max_moves,
        output = %config.output_dir.display(),
        "Batch configuration"
    );

    let results_path = config.output_dir.join("batch_results.json");
    let results = run_batch(&level, config).unwrap_or_else(|e| fatal("Batch failed", &e));
    results
        .save(&results_path)
        .unwrap_or_else(|e| fatal("Failed to save results", &e));

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", summary.total_games);
    eprintln!(
        "Won: {}  Lost: {}  Failed: {}",
        summary.won, summary.lost, summary.failed
    );
    eprintln!("Win rate: {:.1}%", summary.win_rate * 100.0);
    eprintln!(
        "Score: avg {:.2}, max {}",
        summary.avg_score, summary.max_score
    );
    eprintln!(
        "Ticks: avg {:.1} (min {}, max {})",
        summary.avg_duration_ticks, summary.min_duration_ticks, summary.max_duration_ticks
    );
    eprintln!("Duration: {:.2}s", results.duration_seconds);
    eprintln!("Results: {}", results_path.display());
}

/// Run the same seed several times and compare results
fn cmd_verify(level: &str, seed: u64, runs: u32, max_moves: u32) {
    let level = resolve_level(level).unwrap_or_else(|e| fatal("Failed to load level", &e));
    tracing::info!(level = %level.name, seed, runs, "Verifying determinism");

    if verify_determinism(&level, seed, runs, max_moves) {
        tracing::info!("Determinism verified: all {} runs identical", runs);
    } else {
        tracing::error!("Determinism check FAILED: runs diverged");
        std::process::exit(1);
    }
}

/// Re-run a recorded game
fn cmd_replay(file: &Path, verify: bool) {
    let replay = Replay::load(file).unwrap_or_else(|e| fatal("Failed to load replay", &e));
    tracing::info!(
        level = %replay.level,
        seed = replay.seed,
        inputs = replay.input_count(),
        "Loaded replay"
    );

    let mut player = ReplayPlayer::new(replay).unwrap_or_else(|e| fatal("Invalid replay", &e));
    if verify {
        player
            .verify()
            .unwrap_or_else(|e| fatal("Replay verification FAILED", &e));
        tracing::info!(
            tick = player.simulation().get_tick(),
            "Replay verified: final hash matches"
        );
    } else {
        while player.advance() {}
        tracing::info!(
            tick = player.simulation().get_tick(),
            hash = format!("{:016x}", player.simulation().state_hash()),
            "Replay complete"
        );
    }
}

/// Print the built-in level names
fn cmd_levels() {
    for name in builtin::NAMES {
        match builtin::load(name) {
            Ok(level) => println!(
                "{name:<12} {}x{}  {}",
                level.extent.width, level.extent.height, level.info
            ),
            Err(e) => tracing::warn!(level = name, error = %e, "Built-in level failed to load"),
        }
    }
}
