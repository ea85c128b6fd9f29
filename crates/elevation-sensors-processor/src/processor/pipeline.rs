use super::{ParamsError, ProcessError, ProcessedCloud, SensorProcessorParams};
use crate::{SensorModel, VarianceError, VarianceEstimator};
use elevation_sensors_core::{transform_point_cloud, PointCloud, PoseCovariance};
use elevation_sensors_tf::{PoseSource, TransformResolver};
use log::{debug, error};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Registers raw sensor clouds in the map frame and annotates them with
/// height variances.
///
/// A processor holds no per-frame state: every call resolves its own
/// transforms, so `process` may be called from several threads as long as
/// the pose source allows it.
pub struct SensorProcessor<S> {
    resolver: TransformResolver<S>,
    params: SensorProcessorParams,
}

impl<S: PoseSource> SensorProcessor<S> {
    /// Create a processor reading poses from `source`.
    pub fn new(source: S, params: SensorProcessorParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let resolver = TransformResolver::new(
            source,
            params.map_frame.clone(),
            params.base_frame.clone(),
        )
        .with_timeout(params.transform_timeout());
        Ok(Self { resolver, params })
    }

    #[inline]
    pub fn params(&self) -> &SensorProcessorParams {
        &self.params
    }

    #[inline]
    pub fn model(&self) -> &SensorModel {
        &self.params.model
    }

    #[inline]
    pub fn resolver(&self) -> &TransformResolver<S> {
        &self.resolver
    }

    #[inline]
    pub fn map_frame(&self) -> &str {
        &self.params.map_frame
    }

    #[inline]
    pub fn base_frame(&self) -> &str {
        &self.params.base_frame
    }

    /// Drop points the sensor model considers invalid.
    pub fn clean(&self, input: &PointCloud) -> PointCloud {
        self.params.model.clean(input)
    }

    /// Clean `input`, register it in the map frame and compute one height
    /// variance per surviving point.
    ///
    /// The output cloud and variances are produced together or not at all.
    /// Empty clouds are valid input; they still need their transforms.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, input, pose_covariance),
            fields(frame = %input.frame_id(), stamp = %input.stamp(), points = input.len())
        )
    )]
    pub fn process(
        &self,
        input: &PointCloud,
        pose_covariance: &PoseCovariance,
    ) -> Result<ProcessedCloud, ProcessError> {
        self.process_with(input, pose_covariance, &self.params.model)
    }

    /// Same as [`process`](Self::process) with a caller-supplied variance
    /// model. Cleaning still follows the configured sensor model.
    pub fn process_with<E>(
        &self,
        input: &PointCloud,
        pose_covariance: &PoseCovariance,
        estimator: &E,
    ) -> Result<ProcessedCloud, ProcessError>
    where
        E: VarianceEstimator + ?Sized,
    {
        let clean = self.clean(input);
        if clean.len() < input.len() {
            debug!(
                "removed {} of {} points from \"{}\" during cleaning",
                input.len() - clean.len(),
                input.len(),
                input.frame_id()
            );
        }

        let transforms = self
            .resolver
            .resolve(clean.frame_id(), clean.stamp())
            .inspect_err(|err| error!("{err}: {}", err.cause()))?;

        let cloud = transform_point_cloud(&clean, transforms.sensor_to_map(), self.map_frame());

        let variances = estimator
            .compute_variances(&clean, pose_covariance, &transforms)
            .and_then(|variances| {
                if variances.len() == cloud.len() {
                    Ok(variances)
                } else {
                    Err(VarianceError::LengthMismatch {
                        expected: cloud.len(),
                        got: variances.len(),
                    })
                }
            })
            .inspect_err(|err| match err {
                VarianceError::InvalidCovariance(cause) => {
                    error!("{err} for \"{}\": {cause}", clean.frame_id())
                }
                VarianceError::NonFinite { .. } | VarianceError::LengthMismatch { .. } => error!(
                    "variance computation for \"{}\" at {} failed: {err}",
                    clean.frame_id(),
                    clean.stamp()
                ),
            })?;

        Ok(ProcessedCloud {
            cloud,
            variances,
            transforms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstantNoise, StructuredLightNoise};
    use elevation_sensors_core::{CloudPoint, RigidTransform, Stamp};
    use elevation_sensors_tf::TransformBuffer;
    use nalgebra::Isometry3;
    use std::time::Duration;

    fn buffer() -> TransformBuffer {
        let buffer = TransformBuffer::default();
        buffer
            .set_transform(&RigidTransform::new(
                "map",
                "base",
                Stamp::from_secs_f64(1.0),
                Isometry3::translation(1.0, 0.0, 0.0),
            ))
            .expect("insert");
        buffer
            .set_transform(&RigidTransform::new(
                "map",
                "base",
                Stamp::from_secs_f64(2.0),
                Isometry3::translation(2.0, 0.0, 0.0),
            ))
            .expect("insert");
        buffer
            .set_static_transform(&RigidTransform::new(
                "base",
                "camera",
                Stamp::ZERO,
                Isometry3::translation(0.0, 0.0, 1.0),
            ))
            .expect("insert");
        buffer
    }

    fn params() -> SensorProcessorParams {
        SensorProcessorParams::for_frames("map", "base")
            .with_transform_timeout(Duration::from_millis(10))
    }

    #[test]
    fn registers_points_in_map_frame() {
        let buffer = buffer();
        let processor = SensorProcessor::new(&buffer, params()).expect("processor");
        let input = PointCloud::new(
            "camera",
            Stamp::from_secs_f64(1.5),
            vec![CloudPoint::new(0.0, 0.0, 1.0), CloudPoint::new(1.0, 1.0, 2.0)],
        );
        let out = processor
            .process(&input, &PoseCovariance::zeros())
            .expect("process");
        assert_eq!(out.cloud.frame_id(), "map");
        assert_eq!(out.cloud.stamp(), input.stamp());
        assert_eq!(out.variances.len(), 2);
        let p = out.cloud.points()[1].position;
        assert!((p.x - 2.5).abs() < 1e-6 && (p.y - 1.0).abs() < 1e-6 && (p.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn cleaning_follows_the_model() {
        let buffer = buffer();
        let processor = SensorProcessor::new(
            &buffer,
            params().with_model(SensorModel::StructuredLight(StructuredLightNoise::default())),
        )
        .expect("processor");
        let input = PointCloud::new(
            "camera",
            Stamp::from_secs_f64(1.0),
            vec![
                CloudPoint::new(0.0, 0.0, 0.05),
                CloudPoint::new(0.0, 0.0, 1.0),
                CloudPoint::new(0.0, 0.0, 9.0),
            ],
        );
        let out = processor
            .process(&input, &PoseCovariance::zeros())
            .expect("process");
        assert_eq!(out.len(), 1);
        assert_eq!(out.variances.len(), 1);
    }

    #[test]
    fn custom_estimator_is_used() {
        struct Fixed;
        impl VarianceEstimator for Fixed {
            fn compute_variances(
                &self,
                cloud: &PointCloud,
                _: &PoseCovariance,
                _: &elevation_sensors_tf::ResolvedTransforms,
            ) -> Result<Vec<f32>, VarianceError> {
                Ok(vec![7.0; cloud.len()])
            }
        }

        let buffer = buffer();
        let processor = SensorProcessor::new(&buffer, params()).expect("processor");
        let input = PointCloud::new(
            "camera",
            Stamp::from_secs_f64(1.0),
            vec![CloudPoint::new(0.0, 0.0, 1.0)],
        );
        let out = processor
            .process_with(&input, &PoseCovariance::zeros(), &Fixed)
            .expect("process");
        assert_eq!(out.variances, vec![7.0]);
    }

    #[test]
    fn estimator_with_wrong_count_is_an_error() {
        struct Short;
        impl VarianceEstimator for Short {
            fn compute_variances(
                &self,
                _: &PointCloud,
                _: &PoseCovariance,
                _: &elevation_sensors_tf::ResolvedTransforms,
            ) -> Result<Vec<f32>, VarianceError> {
                Ok(Vec::new())
            }
        }

        let buffer = buffer();
        let processor = SensorProcessor::new(&buffer, params()).expect("processor");
        let input = PointCloud::new(
            "camera",
            Stamp::from_secs_f64(1.0),
            vec![CloudPoint::new(0.0, 0.0, 1.0)],
        );
        let err = processor
            .process_with(&input, &PoseCovariance::zeros(), &Short)
            .expect_err("length mismatch");
        assert_eq!(
            err,
            ProcessError::VarianceComputationFailed(VarianceError::LengthMismatch {
                expected: 1,
                got: 0,
            })
        );
    }

    #[test]
    fn invalid_params_are_rejected() {
        let buffer = buffer();
        let bad = params().with_model(SensorModel::Constant(ConstantNoise { variance: -1.0 }));
        assert!(matches!(
            SensorProcessor::new(&buffer, bad),
            Err(ParamsError::Model(_))
        ));
    }
}
