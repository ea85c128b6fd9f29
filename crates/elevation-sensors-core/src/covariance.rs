use nalgebra::{Matrix3, Matrix6};
use serde::{Deserialize, Serialize};

/// Tolerance used when checking symmetry, relative to the largest entry.
const SYMMETRY_REL_TOL: f64 = 1e-9;

/// Errors reported by [`PoseCovariance::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CovarianceError {
    #[error("pose covariance entry ({row}, {col}) is not finite")]
    NonFinite { row: usize, col: usize },
    #[error("pose covariance has negative variance {value} on axis {axis}")]
    NegativeVariance { axis: usize, value: f64 },
    #[error("pose covariance is not symmetric at ({row}, {col})")]
    Asymmetric { row: usize, col: usize },
}

/// Robot pose uncertainty as a 6×6 covariance over
/// `(x, y, z, roll, pitch, yaw)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseCovariance(pub Matrix6<f64>);

impl Default for PoseCovariance {
    fn default() -> Self {
        Self::zeros()
    }
}

impl PoseCovariance {
    pub fn zeros() -> Self {
        Self(Matrix6::zeros())
    }

    /// Diagonal covariance from per-axis variances.
    pub fn from_diagonal(translation: [f64; 3], rotation: [f64; 3]) -> Self {
        let mut m = Matrix6::zeros();
        for i in 0..3 {
            m[(i, i)] = translation[i];
            m[(i + 3, i + 3)] = rotation[i];
        }
        Self(m)
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix6<f64> {
        &self.0
    }

    /// Translational 3×3 block.
    pub fn translation_block(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Rotational 3×3 block.
    pub fn rotation_block(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(3, 3).into_owned()
    }

    /// Check that the matrix can be propagated: finite, symmetric and with
    /// non-negative variances on the diagonal.
    pub fn validate(&self) -> Result<(), CovarianceError> {
        for row in 0..6 {
            for col in 0..6 {
                if !self.0[(row, col)].is_finite() {
                    return Err(CovarianceError::NonFinite { row, col });
                }
            }
        }

        for axis in 0..6 {
            let value = self.0[(axis, axis)];
            if value < 0.0 {
                return Err(CovarianceError::NegativeVariance { axis, value });
            }
        }

        let scale = self.0.amax().max(1.0);
        for row in 0..6 {
            for col in (row + 1)..6 {
                if (self.0[(row, col)] - self.0[(col, row)]).abs() > SYMMETRY_REL_TOL * scale {
                    return Err(CovarianceError::Asymmetric { row, col });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_extracted_from_diagonal() {
        let cov = PoseCovariance::from_diagonal([1.0, 2.0, 3.0], [0.1, 0.2, 0.3]);
        assert_eq!(
            cov.translation_block(),
            Matrix3::from_diagonal(&nalgebra::Vector3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(cov.rotation_block()[(2, 2)], 0.3);
        assert_eq!(cov.rotation_block()[(0, 1)], 0.0);
        assert!(cov.validate().is_ok());
    }

    #[test]
    fn non_finite_entries_are_rejected() {
        let mut cov = PoseCovariance::zeros();
        cov.0[(4, 1)] = f64::NAN;
        assert_eq!(
            cov.validate(),
            Err(CovarianceError::NonFinite { row: 4, col: 1 })
        );
    }

    #[test]
    fn negative_variance_is_rejected() {
        let cov = PoseCovariance::from_diagonal([0.0; 3], [0.0, -1e-3, 0.0]);
        assert!(matches!(
            cov.validate(),
            Err(CovarianceError::NegativeVariance { axis: 4, .. })
        ));
    }

    #[test]
    fn asymmetric_matrix_is_rejected() {
        let mut cov = PoseCovariance::from_diagonal([1.0; 3], [1.0; 3]);
        cov.0[(0, 5)] = 0.5;
        assert_eq!(
            cov.validate(),
            Err(CovarianceError::Asymmetric { row: 0, col: 5 })
        );
    }
}
