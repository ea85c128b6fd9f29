//! Sensor processing pipeline.
//!
//! This module wires together cleaning, transform resolution, point
//! registration into the map frame and variance estimation.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::{ParamsError, ProcessError};
pub use params::SensorProcessorParams;
pub use pipeline::SensorProcessor;
pub use result::ProcessedCloud;
