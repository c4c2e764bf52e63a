//! Synthetic sample feed for `--simulate`
//!
//! Drives the simulated host with plausible motion data so `watch` has
//! something to show without hardware: gravity plus a wobble on the
//! accelerometer, a slow spin on the gyro, a rotating compass heading, and a
//! walker's step stream.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use motion_bridge::host::sim::SimulatedHost;
use motion_bridge::host::{HostAccuracy, HostSensorType, RawSample};

const TICK: Duration = Duration::from_millis(20);

pub fn spawn_synthetic_feed(host: Arc<SimulatedHost>) {
    thread::spawn(move || {
        let mut tick: u64 = 0;
        let mut steps: f64 = 0.0;
        loop {
            let t = tick as f64 * TICK.as_secs_f64();
            let now = nanos();

            host.inject(sample(
                HostSensorType::Accelerometer,
                vec![0.3 * t.sin(), 0.3 * (t * 1.3).cos(), 9.81 + 0.05 * (t * 7.0).sin()],
                now,
            ));
            host.inject(sample(
                HostSensorType::Gyroscope,
                vec![0.01 * t.cos(), 0.02 * t.sin(), 0.1],
                now,
            ));
            host.inject(sample(
                HostSensorType::MagneticField,
                vec![22.0 + t.sin(), -4.0, 41.0 + t.cos()],
                now,
            ));
            host.inject(sample(
                HostSensorType::Orientation,
                vec![(t * 10.0) % 360.0],
                now,
            ));

            // Roughly two steps per second.
            if tick % 25 == 0 {
                steps += 1.0;
                host.inject(sample(HostSensorType::StepDetector, vec![1.0], now));
                host.inject(sample(HostSensorType::StepCounter, vec![steps], now));
            }

            tick += 1;
            thread::sleep(TICK);
        }
    });
}

fn sample(source: HostSensorType, values: Vec<f64>, timestamp_nanos: i64) -> RawSample {
    RawSample {
        source,
        values,
        timestamp_nanos,
        accuracy: HostAccuracy::High,
    }
}

fn nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
