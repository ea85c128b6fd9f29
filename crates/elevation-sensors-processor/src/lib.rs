//! Sensor processors for elevation mapping.
//!
//! A [`SensorProcessor`] takes a raw point cloud in the sensor frame and
//! - drops invalid points with the sensor model's cleaning rules,
//! - resolves sensor/base/map transforms at the capture time,
//! - re-expresses the points in the map frame,
//! - estimates one height variance per point from sensor noise and robot pose
//!   uncertainty.
//!
//! Noise models are picked per sensor modality through [`SensorModel`]; custom
//! models plug in through [`NoiseModel`] or [`VarianceEstimator`].

mod io;
mod model;
mod processor;
mod variance;

pub use io::{ConfigIoError, FrameRecord, ProcessReport, SensorProcessorConfig, TimingsMs};
pub use model::{
    ConstantNoise, LaserNoise, ModelError, NoiseModel, PerfectNoise, SensorModel,
    StructuredLightNoise,
};
pub use processor::{
    ParamsError, ProcessError, ProcessedCloud, SensorProcessor, SensorProcessorParams,
};
pub use variance::{propagate_height_variances, VarianceError, VarianceEstimator};
