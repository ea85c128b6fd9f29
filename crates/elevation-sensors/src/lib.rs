//! High-level facade crate for the `elevation-sensors-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core, transform and processor crates
//! - [`run`]: offline processing of one recorded frame from JSON files,
//!   backing the `elevation-sensors` binary (feature `cli`).
//!
//! ## Quickstart
//!
//! ```no_run
//! use elevation_sensors::core::{CloudPoint, PointCloud, PoseCovariance, Stamp};
//! use elevation_sensors::processor::{LaserNoise, SensorModel, SensorProcessor, SensorProcessorParams};
//! use elevation_sensors::tf::TransformBuffer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let buffer = TransformBuffer::default();
//! // ... feed `buffer` from odometry and the robot description ...
//!
//! let params = SensorProcessorParams::for_frames("map", "base")
//!     .with_model(SensorModel::Laser(LaserNoise::default()));
//! let processor = SensorProcessor::new(&buffer, params)?;
//!
//! let cloud = PointCloud::new("lidar", Stamp::from_secs_f64(12.5), vec![CloudPoint::new(2.0, 0.0, 0.1)]);
//! let out = processor.process(&cloud, &PoseCovariance::zeros())?;
//! println!("{} points, first variance {:?}", out.len(), out.variances.first());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `elevation_sensors::core`: stamps, point clouds, rigid transforms, pose covariance, logging.
//! - `elevation_sensors::tf`: pose source trait, transform buffer and resolver.
//! - `elevation_sensors::processor`: noise models, variance propagation and the processor itself.

pub use elevation_sensors_core as core;
pub use elevation_sensors_processor as processor;
pub use elevation_sensors_tf as tf;

pub use elevation_sensors_core::{CloudPoint, PointCloud, PoseCovariance, RigidTransform, Stamp};
pub use elevation_sensors_processor::{
    ProcessError, ProcessedCloud, SensorModel, SensorProcessor, SensorProcessorParams,
};
pub use elevation_sensors_tf::{PoseSource, TransformBuffer};

pub mod run;
