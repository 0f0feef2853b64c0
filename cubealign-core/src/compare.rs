//! Pose comparison between the handheld die and its target.
//!
//! The rotational error is the angle of `target * die⁻¹` about its own axis,
//! extracted as `2·acos(w)`. Quaternions carry no sign normalization, so a
//! near-identity rotation in the opposite winding reports an angle close to
//! 360°. Both ends of the range are treated as aligned.

use crate::pose::Pose;
use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Alignment tolerances for a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum positional error in meters (exclusive).
    pub position: f64,
    /// Maximum rotational error in degrees (inclusive, mirrored at 360°).
    pub rotation_deg: f64,
}

impl Thresholds {
    pub fn new(position: f64, rotation_deg: f64) -> Self {
        Self {
            position,
            rotation_deg,
        }
    }

    pub fn is_position_aligned(&self, position_error: f64) -> bool {
        position_error < self.position
    }

    pub fn is_rotation_aligned(&self, rotation_error_deg: f64) -> bool {
        rotation_error_deg <= self.rotation_deg || rotation_error_deg >= 360.0 - self.rotation_deg
    }
}

/// Positional and rotational offset of the die relative to the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorMetrics {
    pub delta_position: Vector3<f64>,
    pub delta_rotation: UnitQuaternion<f64>,
    /// Euclidean norm of `delta_position`.
    pub position_error: f64,
    /// Angle of `delta_rotation`, in degrees within [0, 360).
    pub rotation_error_deg: f64,
    /// Axis of `delta_rotation`, absent for the identity rotation.
    pub rotation_axis: Option<Unit<Vector3<f64>>>,
}

impl ErrorMetrics {
    pub fn zero() -> Self {
        Self {
            delta_position: Vector3::zeros(),
            delta_rotation: UnitQuaternion::identity(),
            position_error: 0.0,
            rotation_error_deg: 0.0,
            rotation_axis: None,
        }
    }
}

impl Default for ErrorMetrics {
    fn default() -> Self {
        Self::zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub metrics: ErrorMetrics,
    pub on_target: bool,
    /// Both poses were present. When false, `metrics` are zeroed placeholders.
    pub ready: bool,
}

impl Evaluation {
    /// Result used while either object has not been spawned yet.
    pub fn not_ready() -> Self {
        Self {
            metrics: ErrorMetrics::zero(),
            on_target: false,
            ready: false,
        }
    }
}

/// Compares the die against the target.
///
/// A missing pose on either side is the normal "not ready" state and yields
/// [`Evaluation::not_ready`].
pub fn evaluate(target: Option<&Pose>, die: Option<&Pose>, thresholds: &Thresholds) -> Evaluation {
    let (Some(target), Some(die)) = (target, die) else {
        return Evaluation::not_ready();
    };

    let delta_position = target.position - die.position;
    let delta_rotation = target.orientation * die.orientation.inverse();
    let position_error = delta_position.norm();
    let (rotation_error_deg, rotation_axis) = angle_axis_deg(&delta_rotation);

    let on_target = thresholds.is_position_aligned(position_error)
        && thresholds.is_rotation_aligned(rotation_error_deg);

    Evaluation {
        metrics: ErrorMetrics {
            delta_position,
            delta_rotation,
            position_error,
            rotation_error_deg,
            rotation_axis,
        },
        on_target,
        ready: true,
    }
}

/// Angle (degrees, [0, 360)) and axis of a rotation, keeping the quaternion's winding.
pub fn angle_axis_deg(rotation: &UnitQuaternion<f64>) -> (f64, Option<Unit<Vector3<f64>>>) {
    let q = rotation.quaternion();
    let mut angle = 2.0 * q.w.clamp(-1.0, 1.0).acos().to_degrees();
    if angle >= 360.0 {
        angle -= 360.0;
    }
    let axis = Unit::try_new(q.imag(), 1.0e-12);
    (angle, axis)
}
