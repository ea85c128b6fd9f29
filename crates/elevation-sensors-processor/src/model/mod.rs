//! Per-modality sensor noise models.
//!
//! Each model answers two questions about a point given in the sensor frame:
//! does it survive cleaning, and what is its measurement covariance.

mod constant;
mod laser;
mod perfect;
mod structured_light;

pub use constant::ConstantNoise;
pub use laser::LaserNoise;
pub use perfect::PerfectNoise;
pub use structured_light::StructuredLightNoise;

use crate::variance::{propagate_height_variances, VarianceError, VarianceEstimator};
use elevation_sensors_core::{PointCloud, PoseCovariance};
use elevation_sensors_tf::ResolvedTransforms;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Invalid noise model parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("sensor model parameter `{name}` must be {expected}, got {value}")]
    InvalidParameter {
        name: &'static str,
        expected: &'static str,
        value: f32,
    },
}

pub(crate) fn check_non_negative(name: &'static str, value: f32) -> Result<(), ModelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter {
            name,
            expected: "finite and >= 0",
            value,
        })
    }
}

pub(crate) fn check_finite(name: &'static str, value: f32) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter {
            name,
            expected: "finite",
            value,
        })
    }
}

/// Measurement noise of one sensor modality.
pub trait NoiseModel {
    /// Reject parameter sets that would produce meaningless variances.
    fn validate(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Whether a finite point (sensor frame) lies inside the usable range.
    fn in_range(&self, _point: &Vector3<f32>) -> bool {
        true
    }

    /// 3×3 measurement covariance of `point`, expressed in the sensor frame.
    fn sensor_covariance(&self, point: &Vector3<f32>) -> Matrix3<f32>;
}

/// Noise model selected at construction of a processor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorModel {
    /// Noise-free measurements; only pose uncertainty contributes.
    #[default]
    Perfect,
    /// Isotropic noise floor.
    Constant(ConstantNoise),
    /// Rotating or scanning laser range finder.
    Laser(LaserNoise),
    /// Structured-light depth camera.
    StructuredLight(StructuredLightNoise),
}

impl SensorModel {
    pub fn name(&self) -> &'static str {
        match self {
            SensorModel::Perfect => "perfect",
            SensorModel::Constant(_) => "constant",
            SensorModel::Laser(_) => "laser",
            SensorModel::StructuredLight(_) => "structured_light",
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            SensorModel::Perfect => PerfectNoise.validate(),
            SensorModel::Constant(m) => m.validate(),
            SensorModel::Laser(m) => m.validate(),
            SensorModel::StructuredLight(m) => m.validate(),
        }
    }

    /// Drop points with non-finite coordinates or outside the model's range.
    ///
    /// Survivors keep their order, frame and stamp.
    pub fn clean(&self, cloud: &PointCloud) -> PointCloud {
        match self {
            SensorModel::Perfect => clean_with(&PerfectNoise, cloud),
            SensorModel::Constant(m) => clean_with(m, cloud),
            SensorModel::Laser(m) => clean_with(m, cloud),
            SensorModel::StructuredLight(m) => clean_with(m, cloud),
        }
    }
}

fn clean_with<N: NoiseModel>(model: &N, cloud: &PointCloud) -> PointCloud {
    cloud.retained(|p| p.is_finite() && model.in_range(&p.position.coords))
}

impl VarianceEstimator for SensorModel {
    fn compute_variances(
        &self,
        cloud: &PointCloud,
        pose_covariance: &PoseCovariance,
        transforms: &ResolvedTransforms,
    ) -> Result<Vec<f32>, VarianceError> {
        match self {
            SensorModel::Perfect => {
                propagate_height_variances(&PerfectNoise, cloud, pose_covariance, transforms)
            }
            SensorModel::Constant(m) => {
                propagate_height_variances(m, cloud, pose_covariance, transforms)
            }
            SensorModel::Laser(m) => propagate_height_variances(m, cloud, pose_covariance, transforms),
            SensorModel::StructuredLight(m) => {
                propagate_height_variances(m, cloud, pose_covariance, transforms)
            }
        }
    }
}
