//! Height-variance propagation into the map frame.
//!
//! For a point `S_r_SP` measured in the sensor frame, its map position is
//! `M_r_MP = M_r_MB + R_MB (B_r_BS + R_BS S_r_SP)`. To first order, the
//! variance of its height `P M_r_MP` (`P = [0 0 1]`) is
//!
//! ```text
//! J_q   = P R_MB [B_r_BP]x            with B_r_BP = B_r_BS + R_BS S_r_SP
//! var   = J_q Σ_q J_qᵀ + (P R_MB R_BS) Σ_S (P R_MB R_BS)ᵀ
//! ```
//!
//! where `Σ_q` is the rotational block of the robot pose covariance and `Σ_S`
//! the sensor covariance from the noise model. Translational pose uncertainty
//! is left to the map's motion update.

use crate::model::NoiseModel;
use elevation_sensors_core::{CloudPoint, CovarianceError, PointCloud, PoseCovariance};
use elevation_sensors_tf::ResolvedTransforms;
use nalgebra::{Matrix3, RowVector3};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Failure to compute variances for a frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VarianceError {
    #[error("pose covariance is unusable")]
    InvalidCovariance(#[from] CovarianceError),
    #[error("variance of point {index} is not finite")]
    NonFinite { index: usize },
    #[error("estimator returned {got} variances for {expected} points")]
    LengthMismatch { expected: usize, got: usize },
}

/// Per-point variance computation for one sensor modality.
///
/// Implementations must return exactly one value per point of `cloud`, in
/// order. `cloud` is the cleaned cloud in the sensor frame.
/// [`SensorProcessor`](crate::SensorProcessor) rejects any other count with
/// [`VarianceError::LengthMismatch`].
pub trait VarianceEstimator {
    fn compute_variances(
        &self,
        cloud: &PointCloud,
        pose_covariance: &PoseCovariance,
        transforms: &ResolvedTransforms,
    ) -> Result<Vec<f32>, VarianceError>;
}

/// Map-frame height variance of every point of `cloud` under `model`.
pub fn propagate_height_variances<N>(
    model: &N,
    cloud: &PointCloud,
    pose_covariance: &PoseCovariance,
    transforms: &ResolvedTransforms,
) -> Result<Vec<f32>, VarianceError>
where
    N: NoiseModel + Sync + ?Sized,
{
    pose_covariance.validate()?;

    // Accumulate in f64 and round once, so an isotropic noise floor survives
    // any mounting rotation unchanged.
    let projection = RowVector3::<f64>::new(0.0, 0.0, 1.0);
    let r_mb = transforms.map_to_base_rotation();
    let r_bs = transforms.base_to_sensor_rotation();
    let b_r_bs = transforms.base_to_sensor_translation();
    let rotation_cov = pose_covariance.rotation_block();

    let p_r_mb = projection * r_mb;
    let p_r_ms = p_r_mb * r_bs;

    let height_variance = |p: &CloudPoint| -> f32 {
        let s_r_sp = p.position.coords;
        let b_r_bp = b_r_bs + r_bs * s_r_sp.cast::<f64>();
        let j_q = p_r_mb * b_r_bp.cross_matrix();
        let pose = (j_q * rotation_cov * j_q.transpose())[0];
        let sigma_s: Matrix3<f64> = model.sensor_covariance(&s_r_sp).cast();
        let sensor = (p_r_ms * sigma_s * p_r_ms.transpose())[0];
        (pose + sensor) as f32
    };

    #[cfg(feature = "rayon")]
    let variances: Vec<f32> = cloud.points().par_iter().map(height_variance).collect();
    #[cfg(not(feature = "rayon"))]
    let variances: Vec<f32> = cloud.points().iter().map(height_variance).collect();

    if let Some(index) = variances.iter().position(|v| !v.is_finite()) {
        return Err(VarianceError::NonFinite { index });
    }
    Ok(variances)
}
