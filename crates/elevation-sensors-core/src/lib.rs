//! Core types for elevation-map sensor preprocessing.
//!
//! This crate is intentionally small and purely geometric. It knows about
//! timestamps, frame-tagged point clouds, rigid transforms and pose
//! covariance, but nothing about where transforms come from or how sensor
//! noise is modelled.

mod cloud;
mod covariance;
mod logger;
mod stamp;
mod transform;

pub use cloud::{CloudPoint, PointCloud, Rgb};
pub use covariance::{CovarianceError, PoseCovariance};
pub use stamp::Stamp;
pub use transform::{transform_point_cloud, RigidTransform};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_filters, init_with_level};
