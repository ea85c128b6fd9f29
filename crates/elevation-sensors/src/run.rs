//! Offline processing of a recorded frame.

use elevation_sensors_processor::{
    ConfigIoError, FrameRecord, ParamsError, ProcessReport, SensorProcessorConfig, TimingsMs,
};
use elevation_sensors_tf::BufferError;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Failures that prevent a report from being produced at all.
///
/// A frame that loads fine but cannot be processed is not a `RunError`; its
/// failure is recorded in the report instead.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        cause: ConfigIoError,
    },
    #[error("recorded transforms are invalid")]
    Buffer(#[from] BufferError),
    #[error("invalid processor configuration")]
    Params(#[from] ParamsError),
}

fn ms_since(start: Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

/// Load `config_path` and `frame_path`, replay the recorded transforms and
/// process the recorded cloud.
pub fn process_frame_files(
    config_path: &Path,
    frame_path: &Path,
) -> Result<(SensorProcessorConfig, ProcessReport), RunError> {
    let start = Instant::now();

    let cfg = SensorProcessorConfig::load_json(config_path).map_err(|cause| RunError::Read {
        path: config_path.to_path_buf(),
        cause,
    })?;
    let frame = FrameRecord::load_json(frame_path).map_err(|cause| RunError::Read {
        path: frame_path.to_path_buf(),
        cause,
    })?;
    let buffer = frame.build_buffer(cfg.cache_time())?;
    let processor = cfg.build_processor(&buffer)?;
    let load = ms_since(start);

    let mut report = ProcessReport::new(&cfg, config_path, frame_path, &frame);
    let process_start = Instant::now();
    match processor.process(&frame.cloud, &frame.pose_covariance) {
        Ok(res) => {
            info!(
                "processed {} -> {} points from \"{}\" at {}",
                frame.cloud.len(),
                res.len(),
                frame.cloud.frame_id(),
                frame.cloud.stamp()
            );
            report.set_result(res);
        }
        Err(err) => {
            warn!("frame dropped: {err}");
            report.set_error(&err);
        }
    }
    report.timings_ms = TimingsMs {
        load,
        process: ms_since(process_start),
        total: ms_since(start),
    };

    Ok((cfg, report))
}
