//! Interfaces to the engine-side collaborators the session drives.

use cubealign_core::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DieHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u32);

/// Creates and manipulates the die and target objects.
///
/// Creation returns `None` when the object cannot be produced (for example a
/// missing prefab); the session then treats that object as absent.
pub trait ObjectFactory {
    fn create_die(&mut self) -> Option<DieHandle>;
    fn destroy_die(&mut self, die: DieHandle);
    fn create_target(&mut self, pose: Pose, scale: f64) -> Option<TargetHandle>;
    fn destroy_target(&mut self, target: TargetHandle);
    /// Moves the die to `pose` and stops any residual motion.
    fn place_die(&mut self, die: DieHandle, pose: Pose, scale: f64);
    fn set_die_active(&mut self, die: DieHandle, active: bool);
}

/// Read access to tracked object poses. `None` means not (yet) present.
pub trait PoseSource {
    fn die_pose(&self, die: DieHandle) -> Option<Pose>;
    fn target_pose(&self, target: TargetHandle) -> Option<Pose>;
    fn head_pose(&self) -> Option<Pose>;
}

pub trait Scene: ObjectFactory + PoseSource {}

impl<T: ObjectFactory + PoseSource> Scene for T {}

pub trait Display {
    fn show_text(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineColor {
    /// Die is on target.
    Green,
    Blue,
}

/// Outline highlight on the die.
pub trait VisualFeedback {
    fn set_highlight(&mut self, enabled: bool);
    fn set_color(&mut self, color: OutlineColor);
}

/// Input state sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSample {
    /// The die is currently held by the tracked hand.
    pub grab_active: bool,
    pub reset_requested: bool,
}

impl InputSample {
    pub fn holding() -> Self {
        Self {
            grab_active: true,
            reset_requested: false,
        }
    }

    pub fn with_reset(mut self) -> Self {
        self.reset_requested = true;
        self
    }
}
