use elevation_sensors_core::{RigidTransform, Stamp};
use std::sync::Arc;
use std::time::Duration;

/// Reasons a single transform lookup can fail.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("frame \"{0}\" does not exist")]
    UnknownFrame(String),
    #[error("frames \"{target}\" and \"{source_frame}\" are not connected")]
    NotConnected {
        target: String,
        source_frame: String,
    },
    #[error(
        "lookup of \"{child}\" in \"{parent}\" at {requested} would extrapolate (data covers {earliest} to {latest})"
    )]
    Extrapolation {
        parent: String,
        child: String,
        requested: Stamp,
        earliest: Stamp,
        latest: Stamp,
    },
    #[error("pose source is unavailable: {0}")]
    Unavailable(String),
}

/// Time-indexed source of rigid transforms between named frames.
///
/// `lookup_transform(target, source, stamp)` returns the transform that maps
/// coordinates in `source` into `target` at `stamp`; its parent is `target`
/// and its child is `source`.
pub trait PoseSource {
    /// Block until `lookup_transform(target, source, stamp)` can succeed or
    /// `timeout` elapses. Returns whether the transform became available.
    fn wait_for_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
        timeout: Duration,
    ) -> bool;

    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
    ) -> Result<RigidTransform, LookupError>;
}

impl<T: PoseSource + ?Sized> PoseSource for &T {
    fn wait_for_transform(&self, target: &str, source: &str, stamp: Stamp, timeout: Duration) -> bool {
        (**self).wait_for_transform(target, source, stamp, timeout)
    }

    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
    ) -> Result<RigidTransform, LookupError> {
        (**self).lookup_transform(target, source, stamp)
    }
}

impl<T: PoseSource + ?Sized> PoseSource for Box<T> {
    fn wait_for_transform(&self, target: &str, source: &str, stamp: Stamp, timeout: Duration) -> bool {
        (**self).wait_for_transform(target, source, stamp, timeout)
    }

    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
    ) -> Result<RigidTransform, LookupError> {
        (**self).lookup_transform(target, source, stamp)
    }
}

impl<T: PoseSource + ?Sized> PoseSource for Arc<T> {
    fn wait_for_transform(&self, target: &str, source: &str, stamp: Stamp, timeout: Duration) -> bool {
        (**self).wait_for_transform(target, source, stamp, timeout)
    }

    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
    ) -> Result<RigidTransform, LookupError> {
        (**self).lookup_transform(target, source, stamp)
    }
}
