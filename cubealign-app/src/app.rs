use crate::participant::{ScriptedParticipant, Skill};
use anyhow::{Context, Result};
use cubealign_core::{Handedness, TrialResult};
use cubealign_experiment::{
    Display, MemoryScene, OutlineColor, SessionConfig, SessionController, VisualFeedback,
};
use cubealign_timing::{FixedStep, FrameStats, HighPrecisionTimer, PacedClock, TickClock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Driver loop settings that are not part of the session itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tick_rate_hz: f64,
    pub realtime: bool,
    pub seed: u64,
    pub results: Option<PathBuf>,
    /// Simulated time after which an unfinished session is abandoned.
    pub max_session: Duration,
    pub skill: Skill,
}

struct LogDisplay;

impl Display for LogDisplay {
    fn show_text(&mut self, text: &str) {
        info!(target: "display", "{text}");
    }
}

#[derive(Default)]
struct LogOutline {
    highlight: bool,
}

impl VisualFeedback for LogOutline {
    fn set_highlight(&mut self, enabled: bool) {
        if self.highlight != enabled {
            debug!(target: "feedback", enabled, "highlight");
        }
        self.highlight = enabled;
    }

    fn set_color(&mut self, color: OutlineColor) {
        debug!(target: "feedback", ?color, "outline");
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    trials: usize,
    on_target: usize,
    timed_out: usize,
    mean_trial_duration_s: f64,
    elapsed_s: f64,
}

#[derive(Debug, Serialize)]
struct ResultsFile<'a> {
    participant_num: u32,
    handedness: Handedness,
    config: &'a SessionConfig,
    summary: Summary,
    trials: &'a [TrialResult],
}

pub struct App {
    session: SessionController<MemoryScene, StdRng>,
    participant: ScriptedParticipant,
    clock: Box<dyn TickClock>,
    options: RunOptions,
}

impl App {
    pub fn new(config: SessionConfig, options: RunOptions) -> Result<Self> {
        let hz = options.tick_rate_hz;
        let bad_rate = || format!("tick rate {hz} Hz has no usable period");
        let clock: Box<dyn TickClock> = if options.realtime {
            Box::new(PacedClock::new(HighPrecisionTimer::new(), hz).with_context(bad_rate)?)
        } else {
            Box::new(FixedStep::from_hz(hz).with_context(bad_rate)?)
        };

        let outline: Rc<RefCell<dyn VisualFeedback>> = Rc::new(RefCell::new(LogOutline::default()));
        let mut session = SessionController::new(
            config,
            MemoryScene::new(),
            LogDisplay,
            outline,
            StdRng::seed_from_u64(options.seed),
        )?;
        session
            .bus_mut()
            .subscribe_labels(|label| info!(target: "telemetry", "{label}"));

        let participant = ScriptedParticipant::new(
            options.skill.clone(),
            StdRng::seed_from_u64(options.seed.wrapping_add(1)),
        );

        Ok(Self {
            session,
            participant,
            clock,
            options,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let config = self.session.config().clone();
        info!(
            participant = config.participant_num,
            handedness = ?config.handedness,
            trials = config.max_trial_num,
            realtime = self.options.realtime,
            "=== CUBE ALIGNMENT SESSION ==="
        );

        self.session.bootstrap();

        while !self.session.is_complete() {
            if self.session.elapsed() >= self.options.max_session {
                warn!(
                    elapsed_s = self.session.elapsed().as_secs_f64(),
                    trial = self.session.trial_num(),
                    "session abandoned before completion"
                );
                break;
            }
            let dt = self.clock.tick();
            let input = self.participant.act(&mut self.session, dt);
            self.session.step(dt, input);
        }

        self.report(self.clock.frame_stats());

        if let Some(path) = &self.options.results {
            self.write_results(path)?;
        }

        self.session.teardown();
        Ok(())
    }

    fn summary(&self) -> Summary {
        let results = self.session.results();
        let timed_out = results.iter().filter(|r| r.timed_out()).count();
        let mean = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.trial_duration_s).sum::<f64>() / results.len() as f64
        };
        Summary {
            trials: results.len(),
            on_target: results.len() - timed_out,
            timed_out,
            mean_trial_duration_s: mean,
            elapsed_s: self.session.elapsed().as_secs_f64(),
        }
    }

    fn report(&self, stats: FrameStats) {
        let summary = self.summary();
        info!(
            trials = summary.trials,
            on_target = summary.on_target,
            timed_out = summary.timed_out,
            mean_trial_s = summary.mean_trial_duration_s,
            "session results"
        );
        info!(
            ticks = self.clock.ticks(),
            frame_ms = stats.average_frame_time_ns / 1_000_000.0,
            hz = stats.effective_hz,
            jitter_ms = stats.jitter_ns / 1_000_000.0,
            "tick timing"
        );
    }

    fn write_results(&self, path: &Path) -> Result<()> {
        let config = self.session.config();
        let file = ResultsFile {
            participant_num: config.participant_num,
            handedness: config.handedness,
            config,
            summary: self.summary(),
            trials: self.session.results(),
        };
        let out = std::fs::File::create(path)
            .with_context(|| format!("cannot create results file {}", path.display()))?;
        serde_json::to_writer_pretty(out, &file).context("failed to write results")?;
        info!("Results saved to {}", path.display());
        Ok(())
    }
}
