use super::{check_non_negative, ModelError, NoiseModel};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Isotropic noise floor: every measurement has variance `variance` along
/// each axis, independent of range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantNoise {
    pub variance: f32,
}

impl Default for ConstantNoise {
    fn default() -> Self {
        Self { variance: 1e-4 }
    }
}

impl NoiseModel for ConstantNoise {
    fn validate(&self) -> Result<(), ModelError> {
        check_non_negative("variance", self.variance)
    }

    #[inline]
    fn sensor_covariance(&self, _point: &Vector3<f32>) -> Matrix3<f32> {
        Matrix3::from_diagonal_element(self.variance)
    }
}
