//! Cube alignment session runner.
//!
//! Drives a full session against the in-memory scene with a scripted
//! participant standing in for hand tracking.
//!
//! ```bash
//! # default 20-trial session, simulated time
//! cubealign
//!
//! # left-handed participant 7, paced at 90 Hz, results to disk
//! cubealign --participant 7 --left-handed --tick-rate 90 --realtime --results p7.json
//! ```

mod app;
mod participant;

use anyhow::Context;
use app::{App, RunOptions};
use clap::Parser;
use cubealign_core::Handedness;
use cubealign_experiment::SessionConfig;
use participant::Skill;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cubealign")]
#[command(author, version, about = "Die-to-target alignment trials", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Session config as JSON; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    participant: Option<u32>,

    #[arg(long)]
    left_handed: bool,

    #[arg(long)]
    max_trials: Option<u32>,

    /// Meters
    #[arg(long)]
    position_threshold: Option<f64>,

    /// Degrees
    #[arg(long)]
    rotation_threshold: Option<f64>,

    /// Seconds on target to complete a trial
    #[arg(long)]
    dwell: Option<f64>,

    /// Seconds before a trial times out
    #[arg(long)]
    timeout: Option<f64>,

    /// Simulation ticks per second
    #[arg(long, default_value = "72")]
    tick_rate: f64,

    /// Pace ticks against the wall clock
    #[arg(long)]
    realtime: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Write per-trial results as JSON
    #[arg(short, long)]
    results: Option<PathBuf>,

    #[arg(long, default_value = "0.1")]
    fumble_chance: f64,

    #[arg(long, default_value = "0.1")]
    reset_chance: f64,

    /// Give up on the session after this many simulated seconds
    #[arg(long, default_value = "3600")]
    max_session_secs: u64,
}

impl Cli {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SessionConfig::default(),
        };

        if let Some(num) = self.participant {
            config.participant_num = num;
        }
        if self.left_handed {
            config.handedness = Handedness::Left;
        }
        if let Some(max) = self.max_trials {
            config.max_trial_num = max;
        }
        if let Some(threshold) = self.position_threshold {
            config.position_threshold = threshold;
        }
        if let Some(threshold) = self.rotation_threshold {
            config.rotation_threshold_deg = threshold;
        }
        if let Some(dwell) = self.dwell {
            config.dwell_threshold = dwell;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_threshold = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            tick_rate_hz: self.tick_rate,
            realtime: self.realtime,
            seed: self.seed.unwrap_or_else(rand::random),
            results: self.results.clone(),
            max_session: Duration::from_secs(self.max_session_secs),
            skill: Skill {
                fumble_chance: self.fumble_chance,
                reset_chance: self.reset_chance,
                ..Skill::default()
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("cubealign v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.session_config()?;
    let options = cli.run_options();
    info!(seed = options.seed, "participant seed");

    App::new(config, options)?.run()
}
