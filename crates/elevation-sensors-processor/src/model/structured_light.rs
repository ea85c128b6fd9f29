use super::{check_finite, check_non_negative, ModelError, NoiseModel};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Structured-light depth camera noise (Kinect-style).
///
/// With `z` the depth along the optical axis:
/// - axial deviation `a + b (z - c)^2 + d z^e`,
/// - lateral deviation `lateral_factor * z`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredLightNoise {
    pub normal_factor_a: f32,
    pub normal_factor_b: f32,
    pub normal_factor_c: f32,
    pub normal_factor_d: f32,
    pub normal_factor_e: f32,
    pub lateral_factor: f32,
    /// Depths below this are dropped during cleaning [m].
    pub cutoff_min_depth: f32,
    /// Depths above this are dropped during cleaning [m].
    pub cutoff_max_depth: f32,
}

impl Default for StructuredLightNoise {
    fn default() -> Self {
        Self {
            normal_factor_a: 0.000611,
            normal_factor_b: 0.003587,
            normal_factor_c: 0.3515,
            normal_factor_d: 0.0,
            normal_factor_e: 1.0,
            lateral_factor: 0.01576,
            cutoff_min_depth: 0.2,
            cutoff_max_depth: 3.25,
        }
    }
}

impl StructuredLightNoise {
    /// Axial standard deviation at depth `z`.
    pub fn normal_deviation(&self, z: f32) -> f32 {
        let dz = z - self.normal_factor_c;
        self.normal_factor_a
            + self.normal_factor_b * dz * dz
            + self.normal_factor_d * z.powf(self.normal_factor_e)
    }

    /// Lateral standard deviation at depth `z`.
    pub fn lateral_deviation(&self, z: f32) -> f32 {
        self.lateral_factor * z
    }
}

impl NoiseModel for StructuredLightNoise {
    fn validate(&self) -> Result<(), ModelError> {
        check_finite("normal_factor_a", self.normal_factor_a)?;
        check_finite("normal_factor_b", self.normal_factor_b)?;
        check_finite("normal_factor_c", self.normal_factor_c)?;
        check_finite("normal_factor_d", self.normal_factor_d)?;
        check_finite("normal_factor_e", self.normal_factor_e)?;
        check_non_negative("lateral_factor", self.lateral_factor)?;
        check_non_negative("cutoff_min_depth", self.cutoff_min_depth)?;
        if !(self.cutoff_max_depth.is_finite() && self.cutoff_max_depth > self.cutoff_min_depth) {
            return Err(ModelError::InvalidParameter {
                name: "cutoff_max_depth",
                expected: "finite and > cutoff_min_depth",
                value: self.cutoff_max_depth,
            });
        }
        Ok(())
    }

    fn in_range(&self, point: &Vector3<f32>) -> bool {
        (self.cutoff_min_depth..=self.cutoff_max_depth).contains(&point.z)
    }

    fn sensor_covariance(&self, point: &Vector3<f32>) -> Matrix3<f32> {
        let normal = self.normal_deviation(point.z).powi(2);
        let lateral = self.lateral_deviation(point.z).powi(2);
        Matrix3::from_diagonal(&Vector3::new(lateral, lateral, normal))
    }
}
