use elevation_sensors_core::{init_with_filters, init_with_level};
use log::LevelFilter;

#[test]
fn stderr_logger_reports_a_foreign_logger_every_time() {
    init_with_filters("warn,elevation_sensors_core=debug").expect("env_logger");
    assert_eq!(log::max_level(), LevelFilter::Debug);

    assert!(init_with_level(LevelFilter::Info).is_err());
    assert!(init_with_level(LevelFilter::Info).is_err());
    assert_eq!(log::max_level(), LevelFilter::Debug);
}
