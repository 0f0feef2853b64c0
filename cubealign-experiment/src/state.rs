use super::config::SessionConfig;
use cubealign_core::{
    ErrorMetrics, Evaluation, LifecycleEvent, Pose, Thresholds, TrialOutcome, TrialPhase,
    TrialResult, evaluate,
};
use std::time::Duration;
use tracing::{debug, info};

/// Trial lifecycle and its timers.
///
/// Driven once per tick by [`TrialStateMachine::tick`] and by grab-triggered
/// [`TrialStateMachine::start_trial`]. Every transition is reported as a
/// [`LifecycleEvent`] for the caller to act on and publish, in order.
#[derive(Debug, Clone)]
pub struct TrialStateMachine {
    phase: TrialPhase,
    thresholds: Thresholds,
    dwell_threshold: Duration,
    timeout_threshold: Duration,
    max_trial_num: u32,
    trial_num: u32,
    trial_duration: Duration,
    dwell_duration: Duration,
    is_on_target: bool,
    is_timeout: bool,
    reset_count: u32,
    last_evaluation: Evaluation,
    results: Vec<TrialResult>,
}

impl TrialStateMachine {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            phase: TrialPhase::Idle,
            thresholds: config.thresholds(),
            dwell_threshold: config.dwell(),
            timeout_threshold: config.timeout(),
            max_trial_num: config.max_trial_num,
            trial_num: 1,
            trial_duration: Duration::ZERO,
            dwell_duration: Duration::ZERO,
            is_on_target: false,
            is_timeout: false,
            reset_count: 0,
            last_evaluation: Evaluation::not_ready(),
            results: Vec::new(),
        }
    }

    /// Begins a trial if one is not running and the session is not over.
    pub fn start_trial(&mut self) -> Option<LifecycleEvent> {
        if !self.phase.accepts_grab() {
            return None;
        }
        self.phase = TrialPhase::InTrial;
        self.is_timeout = false;
        self.trial_duration = Duration::ZERO;
        self.dwell_duration = Duration::ZERO;
        self.reset_count = 0;
        self.last_evaluation = Evaluation::not_ready();
        info!(trial = self.trial_num, max = self.max_trial_num, "trial started");
        Some(LifecycleEvent::TrialStart)
    }

    /// Clears timers and the on-target flag without ending the trial.
    pub fn reset(&mut self) -> LifecycleEvent {
        self.trial_duration = Duration::ZERO;
        self.dwell_duration = Duration::ZERO;
        self.is_on_target = false;
        if self.phase.is_in_trial() {
            self.reset_count += 1;
        }
        info!(trial = self.trial_num, phase = ?self.phase, "trial reset");
        LifecycleEvent::TrialReset
    }

    pub fn tick(
        &mut self,
        dt: Duration,
        target: Option<&Pose>,
        die: Option<&Pose>,
        reset_requested: bool,
    ) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();

        if reset_requested {
            events.push(self.reset());
            return events;
        }

        if !self.phase.is_in_trial() {
            return events;
        }

        self.trial_duration += dt;
        if self.trial_duration > self.timeout_threshold {
            self.is_timeout = true;
            info!(
                trial = self.trial_num,
                duration_s = self.trial_duration.as_secs_f64(),
                "trial timed out"
            );
            events.push(LifecycleEvent::Timeout);
            events.push(LifecycleEvent::TrialEnd);
            self.end_trial(TrialOutcome::Timeout);
            return events;
        }

        let evaluation = evaluate(target, die, &self.thresholds);
        self.last_evaluation = evaluation;

        if evaluation.on_target && !self.is_on_target {
            self.dwell_duration = Duration::ZERO;
            self.is_on_target = true;
            debug!(trial = self.trial_num, "on target");
            events.push(LifecycleEvent::OnTarget);
        } else if !evaluation.on_target && self.is_on_target {
            self.is_on_target = false;
            debug!(
                trial = self.trial_num,
                dwell_s = self.dwell_duration.as_secs_f64(),
                "off target"
            );
            events.push(LifecycleEvent::OffTarget);
        }

        if self.is_on_target {
            self.dwell_duration += dt;
            if self.dwell_duration > self.dwell_threshold {
                info!(
                    trial = self.trial_num,
                    duration_s = self.trial_duration.as_secs_f64(),
                    position_error = evaluation.metrics.position_error,
                    rotation_error_deg = evaluation.metrics.rotation_error_deg,
                    "trial completed on target"
                );
                events.push(LifecycleEvent::TrialEnd);
                self.end_trial(TrialOutcome::OnTarget);
            }
        }

        events
    }

    fn end_trial(&mut self, outcome: TrialOutcome) {
        let metrics = self
            .last_evaluation
            .ready
            .then_some(self.last_evaluation.metrics);
        self.results.push(TrialResult {
            trial_num: self.trial_num,
            outcome,
            trial_duration_s: self.trial_duration.as_secs_f64(),
            dwell_duration_s: self.dwell_duration.as_secs_f64(),
            reset_count: self.reset_count,
            position_error: metrics.map(|m| m.position_error),
            rotation_error_deg: metrics.map(|m| m.rotation_error_deg),
        });

        self.is_on_target = false;
        self.dwell_duration = Duration::ZERO;
        self.trial_num += 1;
        self.phase = if self.trial_num > self.max_trial_num {
            TrialPhase::SessionComplete
        } else {
            TrialPhase::Ended(outcome)
        };
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn is_in_trial(&self) -> bool {
        self.phase.is_in_trial()
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_complete()
    }

    /// 1-indexed number of the current (or next) trial.
    pub fn trial_num(&self) -> u32 {
        self.trial_num
    }

    pub fn max_trial_num(&self) -> u32 {
        self.max_trial_num
    }

    pub fn trial_duration(&self) -> Duration {
        self.trial_duration
    }

    pub fn dwell_duration(&self) -> Duration {
        self.dwell_duration
    }

    pub fn is_on_target(&self) -> bool {
        self.is_on_target
    }

    pub fn is_timeout(&self) -> bool {
        self.is_timeout
    }

    /// Offset of the die from the target as of the last evaluated tick.
    pub fn last_metrics(&self) -> &ErrorMetrics {
        &self.last_evaluation.metrics
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }
}
