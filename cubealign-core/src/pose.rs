use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// World-space position and orientation of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    /// Pose at `position` with canonical orientation.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Pose at `position` rotated `angle_deg` about `axis` from canonical orientation.
    pub fn rotated(position: Vector3<f64>, axis: Unit<Vector3<f64>>, angle_deg: f64) -> Self {
        Self::new(
            position,
            UnitQuaternion::from_axis_angle(&axis, angle_deg.to_radians()),
        )
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Which hand the participant grabs the die with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

impl Handedness {
    /// Sign applied to the lateral (x) axis of the scene layout.
    pub fn lateral_sign(&self) -> f64 {
        match self {
            Handedness::Right => 1.0,
            Handedness::Left => -1.0,
        }
    }
}
