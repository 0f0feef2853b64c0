pub mod bus;
pub mod collab;
pub mod config;
pub mod scene;
pub mod session;
pub mod state;
pub mod target;

pub use bus::{EventBus, SubscriptionId};
pub use collab::{
    DieHandle, Display, InputSample, ObjectFactory, OutlineColor, PoseSource, Scene, TargetHandle,
    VisualFeedback,
};
pub use config::{ConfigError, SceneLayout, SessionConfig};
pub use scene::{MemoryScene, SceneObject, SceneStats};
pub use session::SessionController;
pub use state::TrialStateMachine;
pub use target::{TargetGenerator, random_unit_axis};
