use elevation_sensors_core::{RigidTransform, Stamp};
use elevation_sensors_tf::{PoseSource, TransformBuffer, TransformResolver};
use nalgebra::Isometry3;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn robot_pose(secs: f64) -> RigidTransform {
    RigidTransform::new(
        "map",
        "base",
        Stamp::from_secs_f64(secs),
        Isometry3::translation(secs, 0.0, 0.0),
    )
}

#[test]
fn waiting_reader_wakes_when_feeder_publishes() {
    let buffer = Arc::new(TransformBuffer::default());
    buffer.set_transform(&robot_pose(1.0)).expect("insert");

    let feeder = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            buffer.set_transform(&robot_pose(2.0)).expect("insert");
        })
    };

    let start = Instant::now();
    let available = buffer.wait_for_transform(
        "map",
        "base",
        Stamp::from_secs_f64(1.5),
        Duration::from_secs(5),
    );
    feeder.join().expect("feeder thread");

    assert!(available, "transform should appear once the feeder publishes");
    assert!(
        start.elapsed() < Duration::from_secs(4),
        "reader should be woken by the insert, not the timeout"
    );
}

#[test]
fn resolver_shares_buffer_with_feeder_thread() {
    let buffer = Arc::new(TransformBuffer::default());
    buffer
        .set_static_transform(&RigidTransform::new(
            "base",
            "lidar",
            Stamp::ZERO,
            Isometry3::translation(0.0, 0.0, 0.7),
        ))
        .expect("insert");
    buffer.set_transform(&robot_pose(0.0)).expect("insert");

    let resolver = TransformResolver::new(Arc::clone(&buffer), "map", "base")
        .with_timeout(Duration::from_secs(5));

    let feeder = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            for step in 1..=10 {
                thread::sleep(Duration::from_millis(5));
                buffer
                    .set_transform(&robot_pose(step as f64 * 0.1))
                    .expect("insert");
            }
        })
    };

    let resolved = resolver
        .resolve("lidar", Stamp::from_secs_f64(0.95))
        .expect("resolve once data arrives");
    feeder.join().expect("feeder thread");

    let p = resolved.sensor_to_map().translation();
    assert!((p.x - 0.95).abs() < 1e-9);
    assert!((p.z - 0.7).abs() < 1e-12);
}
