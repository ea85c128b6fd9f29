//! Transform resolution for sensor preprocessing.
//!
//! - [`PoseSource`] is the seam to whatever keeps the time-indexed frame
//!   tree (a middleware listener, a log replayer, ...).
//! - [`TransformBuffer`] is an in-memory, thread-safe implementation of it.
//! - [`TransformResolver`] bundles the three transforms a sensor frame needs
//!   (sensor→map, base→sensor, map→base) at one capture time.

mod buffer;
mod resolver;
mod source;

pub use buffer::{BufferError, TransformBuffer, DEFAULT_CACHE_TIME};
pub use resolver::{
    FramePair, ResolvedTransforms, TransformError, TransformResolver, DEFAULT_TRANSFORM_TIMEOUT,
};
pub use source::{LookupError, PoseSource};
