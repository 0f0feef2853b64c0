use cubealign_core::Pose;
use cubealign_core::nalgebra::UnitQuaternion;
use cubealign_experiment::{InputSample, MemoryScene, SessionController, random_unit_axis};
use rand::Rng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Movement and error profile of the simulated participant.
#[derive(Debug, Clone)]
pub struct Skill {
    /// Meters per second.
    pub linear_speed: f64,
    pub angular_speed_deg: f64,
    /// Time between a trial ending and the next grab.
    pub pause: Duration,
    /// Chance per trial of aiming at a wrong orientation and timing out.
    pub fumble_chance: f64,
    /// Chance per trial of pressing reset partway through.
    pub reset_chance: f64,
}

impl Default for Skill {
    fn default() -> Self {
        Self {
            linear_speed: 0.15,
            angular_speed_deg: 90.0,
            pause: Duration::from_millis(800),
            fumble_chance: 0.1,
            reset_chance: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Hand {
    Resting { remaining: Duration },
    Holding { held: Duration },
}

/// Stands in for hand tracking: grabs the die, carries it toward the target
/// and lets go between trials.
pub struct ScriptedParticipant {
    skill: Skill,
    rng: StdRng,
    hand: Hand,
    trial_seen: u32,
    aim: Option<Pose>,
    reset_at: Option<Duration>,
}

impl ScriptedParticipant {
    pub fn new(skill: Skill, rng: StdRng) -> Self {
        Self {
            hand: Hand::Resting {
                remaining: skill.pause,
            },
            skill,
            rng,
            trial_seen: 0,
            aim: None,
            reset_at: None,
        }
    }

    /// Moves the die for this tick and reports the resulting input.
    pub fn act(
        &mut self,
        session: &mut SessionController<MemoryScene, StdRng>,
        dt: Duration,
    ) -> InputSample {
        if session.is_complete() {
            return InputSample::default();
        }

        if session.trial_num() != self.trial_seen {
            self.trial_seen = session.trial_num();
            self.hand = Hand::Resting {
                remaining: self.skill.pause,
            };
            self.aim = None;
            self.reset_at = None;
        }

        match self.hand {
            Hand::Resting { remaining } => {
                self.hand = match remaining.checked_sub(dt) {
                    Some(left) if !left.is_zero() => Hand::Resting { remaining: left },
                    _ => Hand::Holding {
                        held: Duration::ZERO,
                    },
                };
                InputSample::default()
            }
            Hand::Holding { held } => {
                let held = held + dt;
                self.hand = Hand::Holding { held };
                self.plan_trial(session);
                self.carry(session, dt);

                let mut input = InputSample::holding();
                if self.reset_at.is_some_and(|at| held >= at) {
                    self.reset_at = None;
                    input = input.with_reset();
                }
                input
            }
        }
    }

    fn plan_trial(&mut self, session: &SessionController<MemoryScene, StdRng>) {
        if self.aim.is_some() {
            return;
        }
        let Some(target) = session.target_pose() else {
            return;
        };

        let mut aim = target;
        if self.rng.random_bool(self.skill.fumble_chance.clamp(0.0, 1.0)) {
            let axis = random_unit_axis(&mut self.rng);
            aim.orientation = UnitQuaternion::from_axis_angle(&axis, 90f64.to_radians()) * aim.orientation;
            tracing::debug!(trial = session.trial_num(), "participant fumbles this trial");
        }
        self.aim = Some(aim);

        if self.rng.random_bool(self.skill.reset_chance.clamp(0.0, 1.0)) {
            self.reset_at = Some(Duration::from_secs_f64(self.rng.random_range(0.5..3.0)));
        }
    }

    fn carry(&self, session: &mut SessionController<MemoryScene, StdRng>, dt: Duration) {
        let (Some(aim), Some(die), Some(current)) = (self.aim, session.die(), session.die_pose())
        else {
            return;
        };
        let next = step_towards(&current, &aim, &self.skill, dt.as_secs_f64());
        session.scene_mut().move_die(die, next);
    }
}

/// Advances `from` toward `to` at most one tick's worth of linear and angular motion.
fn step_towards(from: &Pose, to: &Pose, skill: &Skill, dt: f64) -> Pose {
    let offset = to.position - from.position;
    let distance = offset.norm();
    let reach = skill.linear_speed * dt;
    let position = if distance <= reach {
        to.position
    } else {
        from.position + offset * (reach / distance)
    };

    let delta = to.orientation * from.orientation.inverse();
    let angle = delta.angle();
    let turn = skill.angular_speed_deg.to_radians() * dt;
    let orientation = if angle <= turn {
        to.orientation
    } else {
        delta.powf(turn / angle) * from.orientation
    };

    Pose::new(position, orientation)
}
