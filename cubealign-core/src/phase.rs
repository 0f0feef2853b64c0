use serde::{Deserialize, Serialize};

/// How a trial came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    /// The die dwelled on target long enough.
    OnTarget,
    Timeout,
}

/// Lifecycle phase of the current trial.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TrialPhase {
    /// Waiting for the first grab of the session.
    #[default]
    Idle,
    InTrial,
    /// The previous trial finished; waiting for the next grab.
    Ended(TrialOutcome),
    SessionComplete,
}

impl TrialPhase {
    pub fn is_in_trial(&self) -> bool {
        matches!(self, Self::InTrial)
    }

    /// A grab in this phase starts a new trial.
    pub fn accepts_grab(&self) -> bool {
        matches!(self, Self::Idle | Self::Ended(_))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::SessionComplete)
    }

    pub fn outcome(&self) -> Option<TrialOutcome> {
        match self {
            Self::Ended(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_starts_trial_only_between_trials() {
        assert!(TrialPhase::Idle.accepts_grab());
        assert!(TrialPhase::Ended(TrialOutcome::Timeout).accepts_grab());
        assert!(!TrialPhase::InTrial.accepts_grab());
        assert!(!TrialPhase::SessionComplete.accepts_grab());
    }

    #[test]
    fn outcome_only_when_ended() {
        assert_eq!(
            TrialPhase::Ended(TrialOutcome::OnTarget).outcome(),
            Some(TrialOutcome::OnTarget)
        );
        assert_eq!(TrialPhase::InTrial.outcome(), None);
    }
}
