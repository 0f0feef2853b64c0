use cubealign_core::nalgebra::Vector3;
use cubealign_core::{Handedness, Pose, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fixed placement of the die and target in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLayout {
    /// Uniform scale of both cubes.
    pub cube_scale: f64,
    /// Rotation of every spawned target away from canonical orientation.
    pub target_rotation_deg: f64,
    /// Target position for a right-handed participant. The die rests mirrored across x.
    pub anchor: [f64; 3],
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            cube_scale: 0.04,
            target_rotation_deg: 135.0,
            anchor: [0.1, 1.1, 0.3],
        }
    }
}

impl SceneLayout {
    pub fn target_position(&self, handedness: Handedness) -> Vector3<f64> {
        let [x, y, z] = self.anchor;
        Vector3::new(x * handedness.lateral_sign(), y, z)
    }

    pub fn die_rest_pose(&self, handedness: Handedness) -> Pose {
        let [x, y, z] = self.anchor;
        Pose::at(-x * handedness.lateral_sign(), y, z)
    }
}

/// Session parameters, fixed once the session is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub participant_num: u32,
    pub handedness: Handedness,
    pub max_trial_num: u32,
    /// Meters.
    pub position_threshold: f64,
    pub rotation_threshold_deg: f64,
    /// Seconds on target needed to complete a trial.
    pub dwell_threshold: f64,
    /// Seconds before an unfinished trial times out.
    pub timeout_threshold: f64,
    pub layout: SceneLayout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            participant_num: 0,
            handedness: Handedness::Right,
            max_trial_num: 20,
            position_threshold: 0.1,
            rotation_threshold_deg: 20.0,
            dwell_threshold: 1.0,
            timeout_threshold: 30.0,
            layout: SceneLayout::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_trial_num == 0 {
            return Err(invalid("max_trial_num", "must be at least 1"));
        }
        positive("position_threshold", self.position_threshold)?;
        positive("dwell_threshold", self.dwell_threshold)?;
        positive("timeout_threshold", self.timeout_threshold)?;
        positive("layout.cube_scale", self.layout.cube_scale)?;
        if !(self.rotation_threshold_deg > 0.0 && self.rotation_threshold_deg <= 180.0) {
            return Err(invalid(
                "rotation_threshold_deg",
                format!("{} is outside (0, 180]", self.rotation_threshold_deg),
            ));
        }
        if self.layout.anchor.iter().any(|v| !v.is_finite()) {
            return Err(invalid("layout.anchor", "must be finite"));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.position_threshold, self.rotation_threshold_deg)
    }

    /// Zero unless the config passed [`Self::validate`].
    pub fn dwell(&self) -> Duration {
        Duration::try_from_secs_f64(self.dwell_threshold).unwrap_or_default()
    }

    /// Zero unless the config passed [`Self::validate`].
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_threshold).unwrap_or_default()
    }

    pub fn die_rest_pose(&self) -> Pose {
        self.layout.die_rest_pose(self.handedness)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be positive")))
    }
}
