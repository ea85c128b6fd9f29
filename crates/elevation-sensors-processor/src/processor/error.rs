use crate::{ModelError, VarianceError};
use elevation_sensors_tf::TransformError;

/// Errors returned by [`SensorProcessor::process`](super::SensorProcessor::process).
///
/// Both kinds concern a single frame; callers typically drop the frame and
/// wait for the next one.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("transform unavailable")]
    TransformUnavailable(#[from] TransformError),
    #[error("variance computation failed")]
    VarianceComputationFailed(#[from] VarianceError),
}

/// Invalid processor configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("{0} frame id must not be empty")]
    EmptyFrameId(&'static str),
    #[error("transform timeout must be finite and >= 0 seconds, got {0}")]
    InvalidTimeout(f64),
    #[error(transparent)]
    Model(#[from] ModelError),
}
