use crate::bus::{EventBus, SubscriptionId};
use crate::collab::{
    DieHandle, Display, InputSample, OutlineColor, Scene, TargetHandle, VisualFeedback,
};
use crate::config::{ConfigError, SessionConfig};
use crate::state::TrialStateMachine;
use crate::target::TargetGenerator;
use cubealign_core::{ErrorMetrics, LifecycleEvent, Pose, TrialPhase, TrialResult, evaluate};
use rand::Rng;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{Level, debug, error, info, trace, warn};

/// Sequences trials over a scene: spawns the die and targets, forwards
/// input to the [`TrialStateMachine`], and publishes its transitions.
pub struct SessionController<S, R>
where
    S: Scene,
    R: Rng,
{
    config: SessionConfig,
    scene: S,
    rng: R,
    display: Box<dyn Display>,
    feedback: Rc<RefCell<dyn VisualFeedback>>,
    bus: EventBus,
    machine: TrialStateMachine,
    targets: TargetGenerator,
    die: Option<DieHandle>,
    target: Option<TargetHandle>,
    die_retired: bool,
    grab_active: bool,
    elapsed: Duration,
    subscriptions: Vec<SubscriptionId>,
    torn_down: bool,
}

impl<S, R> SessionController<S, R>
where
    S: Scene,
    R: Rng,
{
    pub fn new(
        config: SessionConfig,
        scene: S,
        display: impl Display + 'static,
        feedback: Rc<RefCell<dyn VisualFeedback>>,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut bus = EventBus::new();
        let outline = feedback.clone();
        let outline_sub = bus.subscribe_many(
            &[
                LifecycleEvent::OnTarget,
                LifecycleEvent::OffTarget,
                LifecycleEvent::TrialEnd,
                LifecycleEvent::TrialReset,
            ],
            move |event| {
                let color = match event {
                    LifecycleEvent::OnTarget => OutlineColor::Green,
                    _ => OutlineColor::Blue,
                };
                outline.borrow_mut().set_color(color);
            },
        );

        Ok(Self {
            machine: TrialStateMachine::new(&config),
            targets: TargetGenerator::from_config(&config),
            config,
            scene,
            rng,
            display: Box::new(display),
            feedback,
            bus,
            die: None,
            target: None,
            die_retired: false,
            grab_active: false,
            elapsed: Duration::ZERO,
            subscriptions: vec![outline_sub],
            torn_down: false,
        })
    }

    /// Spawns the die, shows the first trial number and loads the first target.
    ///
    /// Subscribe telemetry on [`Self::bus_mut`] before calling this to observe
    /// the initial `SceneLoad`.
    pub fn bootstrap(&mut self) {
        self.generate_die();
        self.update_text();
        self.dispatch(LifecycleEvent::SceneLoad);
    }

    /// Grab notification from hand tracking.
    pub fn on_grab(&mut self) {
        self.grab_active = true;
        self.feedback.borrow_mut().set_highlight(true);
        if self.die.is_none() {
            warn!("grab without a die; no trial started");
        } else if let Some(event) = self.machine.start_trial() {
            self.dispatch(event);
        }
        self.dispatch(LifecycleEvent::Grab);
    }

    pub fn on_release(&mut self) {
        self.grab_active = false;
        self.feedback.borrow_mut().set_highlight(false);
        self.dispatch(LifecycleEvent::Release);
    }

    /// Applies grab edges from a polled input sample, then ticks.
    pub fn step(&mut self, dt: Duration, input: InputSample) {
        if input.grab_active && !self.grab_active {
            self.on_grab();
        } else if !input.grab_active && self.grab_active {
            self.on_release();
        }
        self.tick(dt, input.reset_requested);
    }

    pub fn tick(&mut self, dt: Duration, reset_requested: bool) {
        self.elapsed += dt;
        let die = self.die_pose();
        let target = self.target_pose();

        if tracing::enabled!(Level::TRACE) {
            if let (Some(t), Some(d)) = (target.as_ref(), die.as_ref()) {
                let diff = evaluate(Some(t), Some(d), &self.config.thresholds()).metrics;
                trace!(
                    d_pos = ?diff.delta_position,
                    p_err = diff.position_error,
                    r_err = diff.rotation_error_deg,
                    axis = ?diff.rotation_axis,
                    "diff"
                );
            }
        }

        let events = self
            .machine
            .tick(dt, target.as_ref(), die.as_ref(), reset_requested);
        for event in events {
            self.dispatch(event);
        }
    }

    /// Applies the side effects of `event`, then publishes it.
    fn dispatch(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::SceneLoad => self.load_scene(),
            LifecycleEvent::TrialEnd => self.finish_trial(),
            LifecycleEvent::TrialReset => self.reset_die(),
            _ => {}
        }

        self.bus.publish(event);

        if event == LifecycleEvent::TrialEnd {
            if self.machine.is_complete() {
                info!(
                    trials = self.machine.results().len(),
                    elapsed_s = self.elapsed.as_secs_f64(),
                    "session complete"
                );
            } else {
                self.dispatch(LifecycleEvent::SceneLoad);
            }
        }
    }

    fn load_scene(&mut self) {
        self.generate_target();
        self.update_text();
    }

    fn finish_trial(&mut self) {
        self.reset_die();
        self.destroy_target();
        if self.machine.is_complete() {
            self.retire_die();
        }
    }

    fn generate_die(&mut self) {
        if self.die.is_some() {
            return;
        }
        match self.scene.create_die() {
            Some(die) => {
                self.die = Some(die);
                self.reset_die();
                let mut feedback = self.feedback.borrow_mut();
                feedback.set_highlight(false);
                feedback.set_color(OutlineColor::Blue);
            }
            None => error!("die could not be created; session cannot proceed"),
        }
    }

    fn reset_die(&mut self) {
        if let Some(die) = self.die {
            self.scene
                .place_die(die, self.config.die_rest_pose(), self.config.layout.cube_scale);
        }
    }

    fn retire_die(&mut self) {
        if self.die_retired {
            return;
        }
        if let Some(die) = self.die {
            self.scene.set_die_active(die, false);
            self.die_retired = true;
            debug!("die retired");
        }
    }

    fn generate_target(&mut self) {
        self.destroy_target();
        let pose = self.targets.generate(&mut self.rng);
        match self.scene.create_target(pose, self.targets.scale) {
            Some(target) => {
                debug!(trial = self.machine.trial_num(), ?pose, "target spawned");
                self.target = Some(target);
            }
            None => error!("target could not be created; trial cannot be completed"),
        }
    }

    fn destroy_target(&mut self) {
        if let Some(target) = self.target.take() {
            self.scene.destroy_target(target);
        }
    }

    fn update_text(&mut self) {
        let text = format!(
            "Trial {}/{}",
            self.machine.trial_num(),
            self.config.max_trial_num
        );
        self.display.show_text(&text);
    }

    /// Drops the controller's subscriptions and destroys the scene objects.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
        self.destroy_target();
        if let Some(die) = self.die.take() {
            self.scene.destroy_die(die);
        }
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> TrialPhase {
        self.machine.phase()
    }

    pub fn is_in_trial(&self) -> bool {
        self.machine.is_in_trial()
    }

    pub fn is_complete(&self) -> bool {
        self.machine.is_complete()
    }

    pub fn is_timeout(&self) -> bool {
        self.machine.is_timeout()
    }

    pub fn trial_num(&self) -> u32 {
        self.machine.trial_num()
    }

    pub fn trial_duration(&self) -> Duration {
        self.machine.trial_duration()
    }

    pub fn dwell_duration(&self) -> Duration {
        self.machine.dwell_duration()
    }

    /// Offset of the die from the target as of the last evaluated tick.
    pub fn target_offset(&self) -> &ErrorMetrics {
        self.machine.last_metrics()
    }

    pub fn results(&self) -> &[TrialResult] {
        self.machine.results()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn die(&self) -> Option<DieHandle> {
        self.die
    }

    pub fn target(&self) -> Option<TargetHandle> {
        self.target
    }

    pub fn die_pose(&self) -> Option<Pose> {
        self.die.and_then(|die| self.scene.die_pose(die))
    }

    pub fn target_pose(&self) -> Option<Pose> {
        self.target.and_then(|target| self.scene.target_pose(target))
    }

    pub fn head_pose(&self) -> Option<Pose> {
        self.scene.head_pose()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
}

impl<S, R> Drop for SessionController<S, R>
where
    S: Scene,
    R: Rng,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
