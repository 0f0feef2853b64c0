/// Lifecycle notifications published on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    SceneLoad,
    TrialStart,
    TrialEnd,
    TrialReset,
    OnTarget,
    OffTarget,
    Timeout,
    Grab,
    Release,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 9] = [
        Self::SceneLoad,
        Self::TrialStart,
        Self::TrialEnd,
        Self::TrialReset,
        Self::OnTarget,
        Self::OffTarget,
        Self::Timeout,
        Self::Grab,
        Self::Release,
    ];

    /// Human-readable label sent to the telemetry channel, if this event is logged.
    pub fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::SceneLoad => "Scene Loaded",
            Self::TrialStart => "Trial Start",
            Self::TrialEnd => "Trial End",
            Self::TrialReset => "Trial Reset",
            Self::Timeout => "Timed Out",
            Self::Grab => "Grab",
            Self::Release => "Release",
            Self::OnTarget | Self::OffTarget => return None,
        })
    }
}
