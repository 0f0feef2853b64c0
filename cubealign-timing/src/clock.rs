use crate::timer::{FrameStats, Timer};
use std::time::Duration;

/// Source of the per-tick `dt` handed to the session.
pub trait TickClock {
    /// Blocks until the next tick is due and returns the time since the previous one.
    fn tick(&mut self) -> Duration;
    fn ticks(&self) -> u64;
    fn frame_stats(&self) -> FrameStats;
}

fn period_from_hz(hz: f64) -> Option<Duration> {
    if !(hz.is_finite() && hz > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / hz)
        .ok()
        .filter(|period| !period.is_zero())
}

/// Deterministic clock returning the same step every tick without waiting.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    ticks: u64,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        Self { step, ticks: 0 }
    }

    /// `None` when `hz` has no representable non-zero period.
    pub fn from_hz(hz: f64) -> Option<Self> {
        period_from_hz(hz).map(Self::new)
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl TickClock for FixedStep {
    fn tick(&mut self) -> Duration {
        self.ticks += 1;
        self.step
    }

    fn ticks(&self) -> u64 {
        self.ticks
    }

    fn frame_stats(&self) -> FrameStats {
        if self.ticks == 0 {
            return FrameStats::default();
        }
        FrameStats::from_samples([self.step])
    }
}

/// Wall-clock pacing at a target rate, measuring the real `dt` of every tick.
#[derive(Debug, Clone)]
pub struct PacedClock<T: Timer<Timestamp = u64>> {
    timer: T,
    period: Duration,
    last: u64,
    ticks: u64,
}

impl<T: Timer<Timestamp = u64>> PacedClock<T> {
    /// `None` when `hz` has no representable non-zero period.
    pub fn new(timer: T, hz: f64) -> Option<Self> {
        let period = period_from_hz(hz)?;
        let last = timer.now();
        Some(Self {
            timer,
            period,
            last,
            ticks: 0,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}

impl<T: Timer<Timestamp = u64>> TickClock for PacedClock<T> {
    fn tick(&mut self) -> Duration {
        let spent = self.timer.elapsed(self.last);
        if let Some(remaining) = self.period.checked_sub(spent) {
            self.timer.sleep(remaining);
        }

        let now = self.timer.now();
        let dt = Duration::from_nanos(now.saturating_sub(self.last));
        self.last = now;
        self.ticks += 1;
        self.timer.record_frame(dt);
        dt
    }

    fn ticks(&self) -> u64 {
        self.ticks
    }

    fn frame_stats(&self) -> FrameStats {
        self.timer.frame_stats()
    }
}
