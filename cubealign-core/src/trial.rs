use crate::phase::TrialOutcome;
use serde::{Deserialize, Serialize};

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_num: u32,
    pub outcome: TrialOutcome,
    pub trial_duration_s: f64,
    pub dwell_duration_s: f64,
    pub reset_count: u32,
    /// Errors at the last evaluated tick; absent when the trial never saw both objects.
    pub position_error: Option<f64>,
    pub rotation_error_deg: Option<f64>,
}

impl TrialResult {
    pub fn timed_out(&self) -> bool {
        self.outcome == TrialOutcome::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_outcome_in_snake_case() {
        let result = TrialResult {
            trial_num: 3,
            outcome: TrialOutcome::OnTarget,
            trial_duration_s: 4.5,
            dwell_duration_s: 1.1,
            reset_count: 0,
            position_error: Some(0.02),
            rotation_error_deg: Some(3.0),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "on_target");
        assert_eq!(json["trial_num"], 3);
        assert_eq!(json["position_error"], 0.02);
        assert!(!result.timed_out());
    }

    #[test]
    fn unmeasured_errors_serialize_as_null() {
        let result = TrialResult {
            trial_num: 1,
            outcome: TrialOutcome::Timeout,
            trial_duration_s: 30.5,
            dwell_duration_s: 0.0,
            reset_count: 0,
            position_error: None,
            rotation_error_deg: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["position_error"].is_null());
        assert!(json["rotation_error_deg"].is_null());
        assert!(result.timed_out());
    }
}
