//! JSON configuration, recorded frames and processing reports.

use crate::{ParamsError, ProcessedCloud, SensorProcessor, SensorProcessorParams};
use elevation_sensors_core::{PointCloud, PoseCovariance, RigidTransform, Stamp};
use elevation_sensors_tf::{BufferError, PoseSource, ResolvedTransforms, TransformBuffer};
use serde::{Deserialize, Serialize};
use std::{
    error::Error as StdError,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_cache_time_s() -> f64 {
    elevation_sensors_tf::DEFAULT_CACHE_TIME.as_secs_f64()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T, ConfigIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Configuration for offline processing of recorded frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorProcessorConfig {
    pub processor: SensorProcessorParams,
    /// History kept by the transform buffer [s].
    #[serde(default = "default_cache_time_s")]
    pub buffer_cache_time_s: f64,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl Default for SensorProcessorConfig {
    fn default() -> Self {
        Self {
            processor: SensorProcessorParams::default(),
            buffer_cache_time_s: default_cache_time_s(),
            output_path: None,
        }
    }
}

impl SensorProcessorConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        read_json(path)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        write_json(self, path)
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("sensor_process_report.json"))
    }

    /// Buffer history length; invalid values fall back to the default.
    pub fn cache_time(&self) -> Duration {
        Duration::try_from_secs_f64(self.buffer_cache_time_s)
            .unwrap_or(elevation_sensors_tf::DEFAULT_CACHE_TIME)
    }

    /// Build a processor reading poses from `source`.
    pub fn build_processor<S: PoseSource>(
        &self,
        source: S,
    ) -> Result<SensorProcessor<S>, ParamsError> {
        SensorProcessor::new(source, self.processor.clone())
    }
}

/// One recorded frame: the pose data around it and the raw cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub static_transforms: Vec<RigidTransform>,
    #[serde(default)]
    pub transforms: Vec<RigidTransform>,
    pub cloud: PointCloud,
    #[serde(default)]
    pub pose_covariance: PoseCovariance,
}

impl FrameRecord {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        write_json(self, path)
    }

    /// Fill a fresh transform buffer with the recorded transforms.
    pub fn build_buffer(&self, cache_time: Duration) -> Result<TransformBuffer, BufferError> {
        let buffer = TransformBuffer::new(cache_time);
        for transform in &self.static_transforms {
            buffer.set_static_transform(transform)?;
        }
        for transform in &self.transforms {
            buffer.set_transform(transform)?;
        }
        Ok(buffer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingsMs {
    pub load: u64,
    pub process: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub config_path: String,
    pub frame_path: String,
    pub sensor_frame: String,
    pub map_frame: String,
    pub stamp: Stamp,
    pub num_input_points: usize,
    pub num_output_points: usize,
    #[serde(default)]
    pub cloud: Option<PointCloud>,
    #[serde(default)]
    pub variances: Option<Vec<f32>>,
    #[serde(default)]
    pub transforms: Option<ResolvedTransforms>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timings_ms: TimingsMs,
}

impl ProcessReport {
    /// Build a base report for `frame` before processing.
    pub fn new(
        cfg: &SensorProcessorConfig,
        config_path: &Path,
        frame_path: &Path,
        frame: &FrameRecord,
    ) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            frame_path: frame_path.to_string_lossy().into_owned(),
            sensor_frame: frame.cloud.frame_id().to_owned(),
            map_frame: cfg.processor.map_frame.clone(),
            stamp: frame.cloud.stamp(),
            num_input_points: frame.cloud.len(),
            num_output_points: 0,
            cloud: None,
            variances: None,
            transforms: None,
            error: None,
            timings_ms: TimingsMs::default(),
        }
    }

    /// Populate report fields from a successful run.
    pub fn set_result(&mut self, res: ProcessedCloud) {
        self.num_output_points = res.len();
        self.cloud = Some(res.cloud);
        self.variances = Some(res.variances);
        self.transforms = Some(res.transforms);
        self.error = None;
    }

    /// Record a failure, including its chain of causes.
    pub fn set_error(&mut self, err: &(dyn StdError + 'static)) {
        let mut msg = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        self.error = Some(msg);
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        write_json(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LaserNoise, SensorModel};
    use elevation_sensors_core::CloudPoint;
    use nalgebra::Isometry3;

    fn frame() -> FrameRecord {
        FrameRecord {
            static_transforms: vec![RigidTransform::new(
                "base",
                "lidar",
                Stamp::ZERO,
                Isometry3::translation(0.0, 0.0, 0.5),
            )],
            transforms: vec![RigidTransform::new(
                "map",
                "base",
                Stamp::from_secs_f64(3.0),
                Isometry3::identity(),
            )],
            cloud: PointCloud::new(
                "lidar",
                Stamp::from_secs_f64(3.0),
                vec![CloudPoint::new(2.0, 0.0, 0.0)],
            ),
            pose_covariance: PoseCovariance::zeros(),
        }
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: SensorProcessorConfig = serde_json::from_str(
            r#"{ "processor": { "map_frame": "odom", "base_frame": "base_link",
                 "model": { "type": "laser", "max_range": 30.0 } } }"#,
        )
        .expect("deserialize");
        assert_eq!(cfg.cache_time(), Duration::from_secs(10));
        assert_eq!(cfg.output_path(), PathBuf::from("sensor_process_report.json"));
        match cfg.processor.model {
            SensorModel::Laser(LaserNoise { max_range, .. }) => assert_eq!(max_range, Some(30.0)),
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let cfg = SensorProcessorConfig {
            output_path: Some("out.json".into()),
            ..SensorProcessorConfig::default()
        };
        cfg.write_json(&path).expect("write");
        assert_eq!(SensorProcessorConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FrameRecord::load_json(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigIoError::Io(_)));
    }

    #[test]
    fn recorded_frame_builds_buffer() {
        let record = frame();
        let buffer = record.build_buffer(Duration::from_secs(10)).expect("buffer");
        assert!(buffer.can_transform("map", "lidar", Stamp::from_secs_f64(3.0)));
    }

    #[test]
    fn report_records_result_and_error() {
        let mut cfg = SensorProcessorConfig::default();
        cfg.processor.transform_timeout_s = 0.01;
        let record = frame();
        let buffer = record.build_buffer(cfg.cache_time()).expect("buffer");
        let processor = cfg.build_processor(&buffer).expect("processor");

        let mut report = ProcessReport::new(
            &cfg,
            Path::new("config.json"),
            Path::new("frame.json"),
            &record,
        );
        assert_eq!(report.num_input_points, 1);
        assert_eq!(report.map_frame, "map");

        let res = processor
            .process(&record.cloud, &record.pose_covariance)
            .expect("process");
        report.set_result(res);
        assert_eq!(report.num_output_points, 1);
        assert!(report.error.is_none());

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        report.write_json(&path).expect("write");
        let loaded = ProcessReport::load_json(&path).expect("load");
        assert_eq!(loaded.variances, report.variances);
        assert_eq!(loaded.stamp, report.stamp);

        let missing = PointCloud::empty("camera", Stamp::from_secs_f64(3.0));
        let err = processor
            .process(&missing, &PoseCovariance::zeros())
            .unwrap_err();
        report.set_error(&err);
        let msg = report.error.as_deref().unwrap_or_default();
        assert!(msg.starts_with("transform unavailable"), "{msg}");
    }
}
