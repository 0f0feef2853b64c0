use cubealign_core::{LifecycleEvent, TrialOutcome, TrialPhase};
use cubealign_experiment::{
    ConfigError, Display, InputSample, MemoryScene, OutlineColor, SessionConfig,
    SessionController, VisualFeedback,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

const DT: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct Outline {
    highlight: bool,
    colors: Vec<OutlineColor>,
}

impl VisualFeedback for Outline {
    fn set_highlight(&mut self, enabled: bool) {
        self.highlight = enabled;
    }

    fn set_color(&mut self, color: OutlineColor) {
        self.colors.push(color);
    }
}

struct Screen(Rc<RefCell<Vec<String>>>);

impl Display for Screen {
    fn show_text(&mut self, text: &str) {
        self.0.borrow_mut().push(text.to_string());
    }
}

struct Harness {
    session: SessionController<MemoryScene, StdRng>,
    outline: Rc<RefCell<Outline>>,
    screen: Rc<RefCell<Vec<String>>>,
    labels: Rc<RefCell<Vec<String>>>,
    events: Rc<RefCell<Vec<(u32, LifecycleEvent)>>>,
    tick: Rc<Cell<u32>>,
}

impl Harness {
    fn new(config: SessionConfig, scene: MemoryScene) -> Self {
        let outline = Rc::new(RefCell::new(Outline::default()));
        let screen = Rc::new(RefCell::new(Vec::new()));
        let labels = Rc::new(RefCell::new(Vec::new()));
        let events = Rc::new(RefCell::new(Vec::new()));
        let tick = Rc::new(Cell::new(0));

        let mut session = SessionController::new(
            config,
            scene,
            Screen(screen.clone()),
            outline.clone(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();

        let sink = labels.clone();
        session
            .bus_mut()
            .subscribe_labels(move |label| sink.borrow_mut().push(label.to_string()));
        let sink = events.clone();
        let clock = tick.clone();
        session
            .bus_mut()
            .subscribe_many(&LifecycleEvent::ALL, move |event| {
                sink.borrow_mut().push((clock.get(), event))
            });

        session.bootstrap();

        Self {
            session,
            outline,
            screen,
            labels,
            events,
            tick,
        }
    }

    fn step(&mut self, dt: Duration, input: InputSample) {
        self.tick.set(self.tick.get() + 1);
        self.session.step(dt, input);
    }

    /// Moves the die onto the current target, as a participant holding it there would.
    fn align_die(&mut self) {
        if let (Some(die), Some(target)) = (self.session.die(), self.session.target_pose()) {
            self.session.scene_mut().move_die(die, target);
        }
    }

    fn step_aligned(&mut self, dt: Duration) {
        self.align_die();
        self.step(dt, InputSample::holding());
    }

    fn count(&self, kind: LifecycleEvent) -> usize {
        self.events.borrow().iter().filter(|(_, e)| *e == kind).count()
    }

    fn ticks_of(&self, kind: LifecycleEvent) -> Vec<u32> {
        self.events
            .borrow()
            .iter()
            .filter(|(_, e)| *e == kind)
            .map(|(t, _)| *t)
            .collect()
    }

    fn complete_trial(&mut self) {
        let trial = self.session.trial_num();
        self.step(DT, InputSample::default());
        while self.session.trial_num() == trial {
            self.step_aligned(DT);
        }
    }
}

fn scenario_config() -> SessionConfig {
    SessionConfig {
        position_threshold: 0.01,
        rotation_threshold_deg: 5.0,
        dwell_threshold: 1.0,
        timeout_threshold: 30.0,
        max_trial_num: 20,
        ..SessionConfig::default()
    }
}

#[test]
fn bootstrap_spawns_die_and_first_target() {
    let h = Harness::new(scenario_config(), MemoryScene::new());
    let session = &h.session;

    assert_eq!(session.phase(), TrialPhase::Idle);
    assert_eq!(session.die_pose(), Some(session.config().die_rest_pose()));
    assert!(session.target_pose().is_some());
    assert_eq!(session.scene().stats().targets_created, 1);

    let die = session.scene().die(session.die().unwrap()).unwrap();
    assert_eq!(die.scale, 0.04);
    assert!(die.active);

    assert_eq!(*h.screen.borrow(), ["Trial 1/20", "Trial 1/20"]);
    assert_eq!(*h.labels.borrow(), ["Scene Loaded"]);
    assert!(!h.outline.borrow().highlight);
    assert_eq!(h.outline.borrow().colors, [OutlineColor::Blue]);
}

#[test]
fn grab_starts_trial_and_highlights() {
    let mut h = Harness::new(scenario_config(), MemoryScene::new());
    h.step(DT, InputSample::holding());

    assert!(h.session.is_in_trial());
    assert!(h.outline.borrow().highlight);
    assert_eq!(h.session.trial_duration(), DT);
    assert_eq!(*h.labels.borrow(), ["Scene Loaded", "Trial Start", "Grab"]);

    h.step(DT, InputSample::default());
    assert!(!h.outline.borrow().highlight);
    assert!(h.session.is_in_trial());
    assert_eq!(h.labels.borrow().last().map(String::as_str), Some("Release"));

    // Re-grabbing mid-trial highlights again without restarting the trial.
    h.step(DT, InputSample::holding());
    assert!(h.outline.borrow().highlight);
    assert_eq!(h.count(LifecycleEvent::TrialStart), 1);
    assert_eq!(h.session.trial_duration(), Duration::from_millis(300));
}

#[test]
fn holding_die_on_target_completes_trial() {
    let mut h = Harness::new(scenario_config(), MemoryScene::new());
    let first_target = h.session.target();

    for _ in 0..11 {
        h.step_aligned(DT);
    }

    assert_eq!(h.ticks_of(LifecycleEvent::OnTarget), [1]);
    assert_eq!(h.ticks_of(LifecycleEvent::TrialEnd), [11]);
    assert_eq!(h.ticks_of(LifecycleEvent::SceneLoad), [0, 11]);
    assert_eq!(h.session.trial_num(), 2);
    assert_eq!(h.session.phase(), TrialPhase::Ended(TrialOutcome::OnTarget));

    assert_ne!(h.session.target(), first_target);
    assert_eq!(h.session.scene().stats().targets_created, 2);
    assert_eq!(h.session.scene().stats().targets_destroyed, 1);
    assert_eq!(h.session.scene().live_targets(), 1);
    assert_eq!(h.session.die_pose(), Some(h.session.config().die_rest_pose()));
    assert_eq!(h.screen.borrow().last().map(String::as_str), Some("Trial 2/20"));
    assert_eq!(
        h.outline.borrow().colors,
        [OutlineColor::Blue, OutlineColor::Green, OutlineColor::Blue]
    );

    let result = &h.session.results()[0];
    assert_eq!(result.outcome, TrialOutcome::OnTarget);
    assert!(result.position_error.is_some_and(|e| e < 0.01));
}

#[test]
fn leaving_target_turns_outline_blue() {
    let mut h = Harness::new(scenario_config(), MemoryScene::new());
    h.step_aligned(DT);
    h.step_aligned(DT);

    let die = h.session.die().unwrap();
    let rest = h.session.config().die_rest_pose();
    h.session.scene_mut().move_die(die, rest);
    h.step(DT, InputSample::holding());

    assert_eq!(h.count(LifecycleEvent::OffTarget), 1);
    assert_eq!(
        h.outline.borrow().colors,
        [OutlineColor::Blue, OutlineColor::Green, OutlineColor::Blue]
    );
    assert!(h.session.is_in_trial());
    assert_eq!(h.session.dwell_duration(), Duration::from_millis(200));
    assert!(h.session.target_offset().position_error > 0.1);
}

#[test]
fn never_reaching_target_times_out_once() {
    let mut h = Harness::new(scenario_config(), MemoryScene::new());
    let step = Duration::from_millis(500);

    for _ in 0..60 {
        h.step(step, InputSample::holding());
    }
    assert!(h.session.is_in_trial());
    assert_eq!(h.count(LifecycleEvent::Timeout), 0);

    h.step(step, InputSample::holding());
    assert_eq!(h.ticks_of(LifecycleEvent::Timeout), [61]);
    assert_eq!(h.ticks_of(LifecycleEvent::TrialEnd), [61]);
    assert!(h.session.is_timeout());
    assert_eq!(h.session.trial_num(), 2);

    let labels = h.labels.borrow().clone();
    assert_eq!(
        labels[labels.len() - 3..],
        ["Timed Out", "Trial End", "Scene Loaded"]
    );

    // Still holding: no new grab edge, so no new trial and no second timeout.
    for _ in 0..100 {
        h.step(step, InputSample::holding());
    }
    assert_eq!(h.count(LifecycleEvent::Timeout), 1);
    assert!(!h.session.is_in_trial());

    h.step(step, InputSample::default());
    h.step(step, InputSample::holding());
    assert!(h.session.is_in_trial());
    assert!(!h.session.is_timeout());
}

#[test]
fn reset_mid_trial_keeps_trial_number() {
    let mut h = Harness::new(scenario_config(), MemoryScene::new());

    for _ in 0..45 {
        h.step(DT, InputSample::holding());
    }
    for _ in 0..5 {
        h.step_aligned(DT);
    }
    assert_eq!(h.session.trial_duration(), Duration::from_secs(5));
    assert_eq!(h.session.dwell_duration(), Duration::from_millis(500));

    h.align_die();
    h.step(DT, InputSample::holding().with_reset());

    assert_eq!(h.session.trial_duration(), Duration::ZERO);
    assert_eq!(h.session.dwell_duration(), Duration::ZERO);
    assert_eq!(h.session.trial_num(), 1);
    assert_eq!(h.session.phase(), TrialPhase::InTrial);
    assert_eq!(h.session.die_pose(), Some(h.session.config().die_rest_pose()));
    assert_eq!(h.labels.borrow().last().map(String::as_str), Some("Trial Reset"));
    assert_eq!(h.outline.borrow().colors.last(), Some(&OutlineColor::Blue));
    assert_eq!(h.count(LifecycleEvent::TrialEnd), 0);
}

#[test]
fn session_stops_after_max_trials() {
    let config = SessionConfig {
        max_trial_num: 3,
        ..scenario_config()
    };
    let mut h = Harness::new(config, MemoryScene::new());

    for _ in 0..3 {
        h.complete_trial();
    }

    assert!(h.session.is_complete());
    assert_eq!(h.session.phase(), TrialPhase::SessionComplete);
    assert_eq!(h.session.trial_num(), 4);
    assert_eq!(h.session.results().len(), 3);
    assert_eq!(h.session.target(), None);

    let stats = h.session.scene().stats();
    assert_eq!(stats.targets_created, 3);
    assert_eq!(stats.die_deactivations, 1);
    let die = h.session.die().unwrap();
    assert!(!h.session.scene().die(die).unwrap().active);

    // Further grabs and resets neither start trials nor spawn targets.
    for _ in 0..5 {
        h.step(DT, InputSample::default());
        h.step(DT, InputSample::holding().with_reset());
    }
    let stats = h.session.scene().stats();
    assert_eq!(stats.targets_created, 3);
    assert_eq!(stats.die_deactivations, 1);
    assert_eq!(h.count(LifecycleEvent::TrialStart), 3);
    assert_eq!(h.screen.borrow().last().map(String::as_str), Some("Trial 3/3"));
}

#[test]
fn missing_die_leaves_session_inert() {
    let mut h = Harness::new(scenario_config(), MemoryScene::without_die_prefab());
    assert!(h.session.die().is_none());
    assert!(h.session.die_pose().is_none());

    let step = Duration::from_millis(500);
    for _ in 0..65 {
        h.step(step, InputSample::default());
        h.step(step, InputSample::holding());
    }

    assert_eq!(h.session.trial_num(), 1);
    assert!(!h.session.is_in_trial());
    assert!(h.session.results().is_empty());
    assert_eq!(h.session.scene().stats().targets_created, 1);
    assert_eq!(h.count(LifecycleEvent::TrialStart), 0);
    assert_eq!(h.count(LifecycleEvent::Timeout), 0);
    assert_eq!(h.count(LifecycleEvent::Grab), 65);
    assert_eq!(h.session.target_offset().position_error, 0.0);
}

#[test]
fn missing_target_ends_trials_by_timeout() {
    let mut h = Harness::new(scenario_config(), MemoryScene::without_target_prefab());
    assert!(h.session.target().is_none());

    let step = Duration::from_secs(1);
    for _ in 0..31 {
        h.step(step, InputSample::holding());
    }
    assert_eq!(h.count(LifecycleEvent::Timeout), 1);
    assert!(h.session.target().is_none());

    let result = &h.session.results()[0];
    assert_eq!(result.outcome, TrialOutcome::Timeout);
    assert_eq!(result.position_error, None);
    assert_eq!(result.rotation_error_deg, None);
}

#[test]
fn invalid_config_is_rejected() {
    let config = SessionConfig {
        dwell_threshold: -1.0,
        ..scenario_config()
    };
    let result = SessionController::new(
        config,
        MemoryScene::new(),
        Screen(Rc::new(RefCell::new(Vec::new()))),
        Rc::new(RefCell::new(Outline::default())),
        StdRng::seed_from_u64(3),
    );
    assert!(matches!(
        result,
        Err(ConfigError::Invalid {
            field: "dwell_threshold",
            ..
        })
    ));
}

#[test]
fn teardown_releases_scene_objects_once() {
    let mut h = Harness::new(scenario_config(), MemoryScene::new());
    h.session.teardown();
    h.session.teardown();

    let stats = h.session.scene().stats();
    assert_eq!(stats.dies_destroyed, 1);
    assert_eq!(stats.targets_destroyed, 1);
    assert_eq!(h.session.scene().live_targets(), 0);
    assert_eq!(h.session.bus_mut().subscriber_count(LifecycleEvent::OnTarget), 1);
}

#[test]
fn head_pose_is_passed_through() {
    let mut scene = MemoryScene::new();
    let head = cubealign_core::Pose::at(0.0, 1.6, 0.0);
    scene.set_head_pose(Some(head));
    let h = Harness::new(scenario_config(), scene);
    assert_eq!(h.session.head_pose(), Some(head));

    let h = Harness::new(scenario_config(), MemoryScene::new());
    assert_eq!(h.session.head_pose(), None);
}
