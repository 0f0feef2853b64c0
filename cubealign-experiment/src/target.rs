use crate::config::SessionConfig;
use cubealign_core::Pose;
use cubealign_core::nalgebra::{Unit, Vector3};
use rand::Rng;
use std::f64::consts::TAU;

/// Produces target poses: fixed position, fixed angle, random axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGenerator {
    pub position: Vector3<f64>,
    pub rotation_deg: f64,
    pub scale: f64,
}

impl TargetGenerator {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            position: config.layout.target_position(config.handedness),
            rotation_deg: config.layout.target_rotation_deg,
            scale: config.layout.cube_scale,
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Pose {
        Pose::rotated(self.position, random_unit_axis(rng), self.rotation_deg)
    }
}

/// Uniformly distributed direction on the unit sphere.
pub fn random_unit_axis<R: Rng + ?Sized>(rng: &mut R) -> Unit<Vector3<f64>> {
    let z: f64 = rng.random_range(-1.0..=1.0);
    let phi: f64 = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Unit::new_normalize(Vector3::new(r * phi.cos(), r * phi.sin(), z))
}
