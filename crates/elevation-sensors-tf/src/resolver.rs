use crate::{LookupError, PoseSource};
use elevation_sensors_core::{RigidTransform, Stamp};
use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How long [`TransformResolver::resolve`] waits for pose data by default.
pub const DEFAULT_TRANSFORM_TIMEOUT: Duration = Duration::from_secs(1);

/// A `(target, source)` lookup request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FramePair {
    pub target: String,
    pub source: String,
}

impl FramePair {
    pub fn new(target: &str, source: &str) -> Self {
        Self {
            target: target.to_owned(),
            source: source.to_owned(),
        }
    }
}

impl fmt::Display for FramePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" -> \"{}\"", self.source, self.target)
    }
}

/// Failure to resolve one of the transforms a frame needs.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("no transform {pair} at {stamp} within {timeout:?}")]
    Timeout {
        pair: FramePair,
        stamp: Stamp,
        timeout: Duration,
        #[source]
        cause: LookupError,
    },
    #[error("lookup of transform {pair} at {stamp} failed")]
    Lookup {
        pair: FramePair,
        stamp: Stamp,
        #[source]
        cause: LookupError,
    },
}

impl TransformError {
    /// The frame pair that could not be resolved.
    pub fn pair(&self) -> &FramePair {
        match self {
            TransformError::Timeout { pair, .. } | TransformError::Lookup { pair, .. } => pair,
        }
    }

    pub fn cause(&self) -> &LookupError {
        match self {
            TransformError::Timeout { cause, .. } | TransformError::Lookup { cause, .. } => cause,
        }
    }
}

/// The three transforms needed to register one sensor frame, all taken at the
/// same capture time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTransforms {
    stamp: Stamp,
    sensor_to_map: RigidTransform,
    base_to_sensor: RigidTransform,
    map_to_base: RigidTransform,
}

impl ResolvedTransforms {
    #[inline]
    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Maps sensor coordinates into the map frame.
    #[inline]
    pub fn sensor_to_map(&self) -> &RigidTransform {
        &self.sensor_to_map
    }

    /// Pose of the sensor in the base frame; maps sensor coordinates into base.
    #[inline]
    pub fn base_to_sensor(&self) -> &RigidTransform {
        &self.base_to_sensor
    }

    /// Pose of the base in the map frame; maps base coordinates into map.
    #[inline]
    pub fn map_to_base(&self) -> &RigidTransform {
        &self.map_to_base
    }

    /// `R_BS`: orientation of the sensor relative to the base.
    pub fn base_to_sensor_rotation(&self) -> Matrix3<f64> {
        self.base_to_sensor.rotation()
    }

    /// `B_r_BS`: sensor origin in base coordinates.
    pub fn base_to_sensor_translation(&self) -> Vector3<f64> {
        self.base_to_sensor.translation()
    }

    /// `R_MB`: orientation of the base relative to the map.
    pub fn map_to_base_rotation(&self) -> Matrix3<f64> {
        self.map_to_base.rotation()
    }

    /// `M_r_MB`: base origin in map coordinates.
    pub fn map_to_base_translation(&self) -> Vector3<f64> {
        self.map_to_base.translation()
    }
}

/// Resolves sensor→map, base→sensor and map→base transforms from a
/// [`PoseSource`].
#[derive(Clone, Debug)]
pub struct TransformResolver<S> {
    source: S,
    map_frame: String,
    base_frame: String,
    timeout: Duration,
}

impl<S: PoseSource> TransformResolver<S> {
    pub fn new(source: S, map_frame: impl Into<String>, base_frame: impl Into<String>) -> Self {
        Self {
            source,
            map_frame: map_frame.into(),
            base_frame: base_frame.into(),
            timeout: DEFAULT_TRANSFORM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[inline]
    pub fn map_frame(&self) -> &str {
        &self.map_frame
    }

    #[inline]
    pub fn base_frame(&self) -> &str {
        &self.base_frame
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the three transforms for `sensor_frame` at `stamp`.
    ///
    /// The timeout is one deadline for the whole call, not per lookup. Either
    /// all three transforms are returned or the first failure is.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(map = %self.map_frame, base = %self.base_frame))
    )]
    pub fn resolve(
        &self,
        sensor_frame: &str,
        stamp: Stamp,
    ) -> Result<ResolvedTransforms, TransformError> {
        let deadline = Instant::now().checked_add(self.timeout);

        let sensor_to_map = self.fetch(&self.map_frame, sensor_frame, stamp, deadline)?;
        let base_to_sensor = self.fetch(&self.base_frame, sensor_frame, stamp, deadline)?;
        let map_to_base = self.fetch(&self.map_frame, &self.base_frame, stamp, deadline)?;

        debug!(
            "resolved transforms for \"{}\" at {} (map \"{}\", base \"{}\")",
            sensor_frame, stamp, self.map_frame, self.base_frame
        );
        Ok(ResolvedTransforms {
            stamp,
            sensor_to_map,
            base_to_sensor,
            map_to_base,
        })
    }

    fn fetch(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
        deadline: Option<Instant>,
    ) -> Result<RigidTransform, TransformError> {
        let remaining = deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or(self.timeout);
        let available = self
            .source
            .wait_for_transform(target, source, stamp, remaining);

        let transform = self
            .source
            .lookup_transform(target, source, stamp)
            .map_err(|cause| {
                let pair = FramePair::new(target, source);
                if available {
                    TransformError::Lookup { pair, stamp, cause }
                } else {
                    TransformError::Timeout {
                        pair,
                        stamp,
                        timeout: self.timeout,
                        cause,
                    }
                }
            })?;

        // Sources are trusted to answer at the requested time; re-tag anyway so
        // the bundle can never mix stamps.
        Ok(RigidTransform::new(
            target,
            source,
            stamp,
            *transform.isometry(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransformBuffer;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};

    fn buffer_with_robot(stamps: &[f64]) -> TransformBuffer {
        let buffer = TransformBuffer::default();
        for &secs in stamps {
            buffer
                .set_transform(&RigidTransform::new(
                    "map",
                    "base",
                    Stamp::from_secs_f64(secs),
                    Isometry3::from_parts(
                        Translation3::new(secs, 0.0, 0.5),
                        UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3),
                    ),
                ))
                .expect("insert");
        }
        buffer
            .set_static_transform(&RigidTransform::new(
                "base",
                "sensor",
                Stamp::ZERO,
                Isometry3::from_parts(
                    Translation3::new(0.4, 0.0, 0.2),
                    UnitQuaternion::from_euler_angles(0.0, 0.5, 0.0),
                ),
            ))
            .expect("insert");
        buffer
    }

    #[test]
    fn resolves_all_three_at_one_stamp() {
        let buffer = buffer_with_robot(&[1.0, 2.0]);
        let resolver = TransformResolver::new(&buffer, "map", "base");
        let stamp = Stamp::from_secs_f64(1.5);
        let resolved = resolver.resolve("sensor", stamp).expect("resolve");

        assert_eq!(resolved.stamp(), stamp);
        for t in [
            resolved.sensor_to_map(),
            resolved.base_to_sensor(),
            resolved.map_to_base(),
        ] {
            assert_eq!(t.stamp(), stamp);
        }
        assert_eq!(resolved.sensor_to_map().parent(), "map");
        assert_eq!(resolved.sensor_to_map().child(), "sensor");
        assert_eq!(resolved.base_to_sensor().parent(), "base");
        assert_eq!(resolved.map_to_base().child(), "base");

        assert_relative_eq!(
            resolved.base_to_sensor_translation(),
            Vector3::new(0.4, 0.0, 0.2),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            resolved.map_to_base_translation(),
            Vector3::new(1.5, 0.0, 0.5),
            epsilon = 1e-12
        );

        // The full chain agrees with the decomposed pieces.
        let composed = resolved.map_to_base().isometry() * resolved.base_to_sensor().isometry();
        assert_relative_eq!(composed, *resolved.sensor_to_map().isometry(), epsilon = 1e-12);
        assert_relative_eq!(
            resolved.map_to_base_rotation() * resolved.base_to_sensor_rotation(),
            resolved.sensor_to_map().rotation(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn missing_pose_data_times_out() {
        let buffer = buffer_with_robot(&[1.0, 2.0]);
        let resolver =
            TransformResolver::new(&buffer, "map", "base").with_timeout(Duration::from_millis(20));
        let err = resolver
            .resolve("sensor", Stamp::from_secs_f64(7.0))
            .expect_err("no data at t = 7");
        assert_eq!(err.pair(), &FramePair::new("map", "sensor"));
        assert!(matches!(err, TransformError::Timeout { .. }));
        assert!(matches!(err.cause(), LookupError::Extrapolation { .. }));
    }

    #[test]
    fn unknown_sensor_frame_fails() {
        let buffer = buffer_with_robot(&[1.0, 2.0]);
        let resolver =
            TransformResolver::new(&buffer, "map", "base").with_timeout(Duration::ZERO);
        let err = resolver
            .resolve("camera", Stamp::from_secs_f64(1.0))
            .expect_err("unknown frame");
        assert_eq!(
            err.cause(),
            &LookupError::UnknownFrame("camera".to_owned())
        );
    }

    /// A source that reports availability but then fails the lookup.
    struct Flaky;

    impl PoseSource for Flaky {
        fn wait_for_transform(&self, _: &str, _: &str, _: Stamp, _: Duration) -> bool {
            true
        }

        fn lookup_transform(
            &self,
            _: &str,
            _: &str,
            _: Stamp,
        ) -> Result<RigidTransform, LookupError> {
            Err(LookupError::Unavailable("listener shut down".to_owned()))
        }
    }

    #[test]
    fn lookup_failure_after_successful_wait_is_reported() {
        let resolver = TransformResolver::new(Flaky, "map", "base");
        let err = resolver
            .resolve("sensor", Stamp::from_secs_f64(1.0))
            .expect_err("flaky source");
        assert!(matches!(err, TransformError::Lookup { .. }));
    }
}
