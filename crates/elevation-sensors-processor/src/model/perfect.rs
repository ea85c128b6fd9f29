use super::NoiseModel;
use nalgebra::{Matrix3, Vector3};

/// Noise-free sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerfectNoise;

impl NoiseModel for PerfectNoise {
    #[inline]
    fn sensor_covariance(&self, _point: &Vector3<f32>) -> Matrix3<f32> {
        Matrix3::zeros()
    }
}
