use clap::Parser;
use elevation_sensors::run::process_frame_files;
use log::LevelFilter;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Register a recorded point cloud in the map frame and estimate per-point
/// height variances.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Processor configuration (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Recorded frame with transforms, cloud and pose covariance (JSON).
    #[arg(long)]
    frame: PathBuf,

    /// Report path. Overrides `output_path` from the config.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log level for every target.
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Per-target log directives, e.g. `warn,elevation_sensors_tf=debug`.
    /// Takes precedence over `--log-level`. Builds with the `tracing`
    /// feature read `RUST_LOG` instead of either flag.
    #[arg(long)]
    log_filter: Option<String>,
}

fn print_chain(err: &dyn Error) {
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    #[cfg(feature = "tracing")]
    {
        elevation_sensors::core::init_tracing(false);
        log::debug!(
            "RUST_LOG drives tracing output; ignoring --log-level {} and --log-filter {:?}",
            args.log_level,
            args.log_filter
        );
    }
    #[cfg(not(feature = "tracing"))]
    {
        let installed = match args.log_filter.as_deref() {
            Some(filters) => elevation_sensors::core::init_with_filters(filters),
            None => elevation_sensors::core::init_with_level(args.log_level),
        };
        if let Err(err) = installed {
            eprintln!("warning: logger not installed: {err}");
        }
    }

    let (cfg, report) = match process_frame_files(&args.config, &args.frame) {
        Ok(out) => out,
        Err(err) => {
            print_chain(&err);
            return ExitCode::from(2);
        }
    };

    let output_path = args.output.unwrap_or_else(|| cfg.output_path());
    if let Err(err) = report.write_json(&output_path) {
        print_chain(&err);
        return ExitCode::from(2);
    }
    println!("wrote report to {}", output_path.display());

    match report.error {
        None => ExitCode::SUCCESS,
        Some(err) => {
            eprintln!("frame not processed: {err}");
            ExitCode::FAILURE
        }
    }
}
