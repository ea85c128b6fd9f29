use super::{check_non_negative, ModelError, NoiseModel};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Laser range finder noise.
///
/// With `d` the measured range, the beam footprint grows linearly with range
/// and gives the lateral deviation `beam_constant + beam_angle * d`; the
/// deviation along the beam is the constant `min_radius`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserNoise {
    /// Standard deviation along the beam [m]. Points closer than this are
    /// dropped during cleaning.
    pub min_radius: f32,
    /// Beam divergence [rad].
    pub beam_angle: f32,
    /// Beam width at the emitter [m].
    pub beam_constant: f32,
    /// Points further than this are dropped during cleaning [m].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_range: Option<f32>,
}

impl Default for LaserNoise {
    fn default() -> Self {
        Self {
            min_radius: 0.018,
            beam_angle: 0.0006,
            beam_constant: 0.0015,
            max_range: None,
        }
    }
}

impl NoiseModel for LaserNoise {
    fn validate(&self) -> Result<(), ModelError> {
        check_non_negative("min_radius", self.min_radius)?;
        check_non_negative("beam_angle", self.beam_angle)?;
        check_non_negative("beam_constant", self.beam_constant)?;
        if let Some(max_range) = self.max_range {
            if !(max_range.is_finite() && max_range > self.min_radius) {
                return Err(ModelError::InvalidParameter {
                    name: "max_range",
                    expected: "finite and > min_radius",
                    value: max_range,
                });
            }
        }
        Ok(())
    }

    fn in_range(&self, point: &Vector3<f32>) -> bool {
        let d = point.norm();
        d >= self.min_radius && self.max_range.is_none_or(|max| d <= max)
    }

    fn sensor_covariance(&self, point: &Vector3<f32>) -> Matrix3<f32> {
        let d = point.norm();
        let lateral = (self.beam_constant + self.beam_angle * d).powi(2);
        let normal = self.min_radius.powi(2);
        Matrix3::from_diagonal(&Vector3::new(lateral, lateral, normal))
    }
}
