pub mod compare;
pub mod event;
pub mod phase;
pub mod pose;
pub mod trial;

pub use compare::{ErrorMetrics, Evaluation, Thresholds, angle_axis_deg, evaluate};
pub use event::LifecycleEvent;
pub use phase::{TrialOutcome, TrialPhase};
pub use pose::{Handedness, Pose};
pub use trial::TrialResult;

pub use nalgebra;
