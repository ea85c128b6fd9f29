use super::ParamsError;
use crate::SensorModel;
use elevation_sensors_tf::DEFAULT_TRANSFORM_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_transform_timeout_s() -> f64 {
    DEFAULT_TRANSFORM_TIMEOUT.as_secs_f64()
}

/// Configuration for a [`SensorProcessor`](super::SensorProcessor).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorProcessorParams {
    /// Frame the output cloud is expressed in.
    pub map_frame: String,
    /// Robot base frame the pose covariance refers to.
    pub base_frame: String,
    /// Upper bound on the time spent waiting for pose data per frame.
    #[serde(default = "default_transform_timeout_s")]
    pub transform_timeout_s: f64,
    /// Sensor noise model, also deciding the cleaning cutoffs.
    #[serde(default)]
    pub model: SensorModel,
}

impl Default for SensorProcessorParams {
    fn default() -> Self {
        Self::for_frames("map", "base")
    }
}

impl SensorProcessorParams {
    /// Default parameters (perfect sensor, 1 s timeout) for the given frames.
    pub fn for_frames(map_frame: impl Into<String>, base_frame: impl Into<String>) -> Self {
        Self {
            map_frame: map_frame.into(),
            base_frame: base_frame.into(),
            transform_timeout_s: default_transform_timeout_s(),
            model: SensorModel::default(),
        }
    }

    pub fn with_model(mut self, model: SensorModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_transform_timeout(mut self, timeout: Duration) -> Self {
        self.transform_timeout_s = timeout.as_secs_f64();
        self
    }

    /// Timeout as a [`Duration`]; invalid values fall back to the default.
    pub fn transform_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.transform_timeout_s).unwrap_or(DEFAULT_TRANSFORM_TIMEOUT)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.map_frame.is_empty() {
            return Err(ParamsError::EmptyFrameId("map"));
        }
        if self.base_frame.is_empty() {
            return Err(ParamsError::EmptyFrameId("base"));
        }
        if !self.transform_timeout_s.is_finite() || self.transform_timeout_s < 0.0 {
            return Err(ParamsError::InvalidTimeout(self.transform_timeout_s));
        }
        self.model.validate()?;
        Ok(())
    }
}
