//! Linux industrial I/O binding
//!
//! Resolves handles by scanning `/sys/bus/iio/devices` for motion channels at
//! construction and delivers samples from a per-registration polling thread.
//! The poll interval is derived from the sampling tier; the kernel driver's
//! own rate still applies underneath.
//!
//! Step detection is event-based in IIO and has no pollable sysfs channel, so
//! `StepDetector` resolves as absent on this backend.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::kind::{SamplingTier, SensorKind};

use super::{HostAccuracy, HostSensorType, RawSample, SampleSink, SensorHandle, SensorHost};

const SYSFS_ROOT: &str = "/sys/bus/iio/devices";

/// Channel layout of one resolved IIO sensor.
#[derive(Debug, Clone)]
enum Channels {
    /// x/y/z triple sharing a name prefix, e.g. `in_accel_{x,y,z}_raw`.
    Triple(&'static str),
    /// Single channel file name, without the `_raw` suffix.
    Single(&'static str),
}

#[derive(Debug, Clone)]
struct IioSensor {
    handle: SensorHandle,
    kind: SensorKind,
    device: PathBuf,
    channels: Channels,
}

pub struct IioHost {
    sensors: Vec<IioSensor>,
    /// Stop flag per registered handle; flipping it winds down the poller.
    pollers: Mutex<HashMap<SensorHandle, Arc<AtomicBool>>>,
}

impl IioHost {
    /// Scans the standard sysfs location. Missing or unreadable devices are
    /// skipped; an empty scan just means every kind resolves as absent.
    pub fn new() -> Self {
        Self::with_root(SYSFS_ROOT)
    }

    /// Scans an alternate sysfs root (test fixtures, containers).
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let sensors = scan(root.as_ref());
        for sensor in &sensors {
            tracing::info!("{} -> {}", sensor.kind, sensor.device.display());
        }
        IioHost {
            sensors,
            pollers: Mutex::new(HashMap::new()),
        }
    }

    fn sensor(&self, handle: SensorHandle) -> Option<&IioSensor> {
        self.sensors.iter().find(|s| s.handle == handle)
    }

    fn stop_poller(&self, handle: SensorHandle) {
        let mut pollers = match self.pollers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(stop) = pollers.remove(&handle) {
            stop.store(true, Ordering::SeqCst);
        }
    }
}

impl Default for IioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IioHost {
    /// Winds down every live poller; handles die with the host that issued
    /// them.
    fn drop(&mut self) {
        let pollers = match self.pollers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for stop in pollers.values() {
            stop.store(true, Ordering::SeqCst);
        }
    }
}

impl SensorHost for IioHost {
    fn resolve(&self, kind: SensorKind) -> Option<SensorHandle> {
        self.sensors.iter().find(|s| s.kind == kind).map(|s| s.handle)
    }

    fn register(&self, handle: SensorHandle, tier: SamplingTier, sink: Arc<dyn SampleSink>) {
        let Some(sensor) = self.sensor(handle).cloned() else {
            tracing::warn!("register for unknown iio handle {:?}", handle);
            return;
        };

        // Re-registration replaces the previous poller.
        self.stop_poller(handle);

        let stop = Arc::new(AtomicBool::new(false));
        {
            let mut pollers = match self.pollers.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            pollers.insert(handle, Arc::clone(&stop));
        }

        let interval = poll_interval(tier);
        let spawned = thread::Builder::new()
            .name(format!("iio-{}", sensor.kind))
            .spawn(move || poll_loop(sensor, interval, sink, stop));
        if let Err(e) = spawned {
            tracing::error!("failed to spawn iio poller: {}", e);
        }
    }

    fn unregister(&self, handle: SensorHandle) {
        self.stop_poller(handle);
    }
}

/// Poll intervals matching the usual OS delay tiers.
fn poll_interval(tier: SamplingTier) -> Duration {
    match tier {
        SamplingTier::Default => Duration::from_millis(200),
        SamplingTier::Ui => Duration::from_millis(60),
        SamplingTier::Game => Duration::from_millis(20),
        SamplingTier::Fastest => Duration::from_millis(5),
    }
}

fn poll_loop(sensor: IioSensor, interval: Duration, sink: Arc<dyn SampleSink>, stop: Arc<AtomicBool>) {
    let source = HostSensorType::for_kind(sensor.kind);
    while !stop.load(Ordering::SeqCst) {
        match read_values(&sensor.device, &sensor.channels) {
            Ok(values) => {
                let raw = RawSample {
                    source,
                    values,
                    timestamp_nanos: wall_clock_nanos(),
                    accuracy: HostAccuracy::High,
                };
                sink.sample(&raw);
            }
            Err(e) => tracing::debug!("{} read failed: {}", sensor.kind, e),
        }
        thread::sleep(interval);
    }
}

fn wall_clock_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

fn read_values(device: &Path, channels: &Channels) -> std::io::Result<Vec<f64>> {
    match channels {
        Channels::Triple(prefix) => {
            let scale = read_scale(device, prefix);
            let mut values = Vec::with_capacity(3);
            for axis in ["x", "y", "z"] {
                let raw = read_f64(&device.join(format!("{}_{}_raw", prefix, axis)))?;
                values.push(raw * scale);
            }
            Ok(values)
        }
        Channels::Single(name) => {
            let raw = read_f64(&device.join(format!("{}_raw", name)))?;
            let scale = read_scale(device, name);
            Ok(vec![raw * scale])
        }
    }
}

fn read_f64(path: &Path) -> std::io::Result<f64> {
    let contents = fs::read_to_string(path)?;
    contents.trim().parse::<f64>().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: {}", path.display(), e),
        )
    })
}

/// Drivers without a scale file report raw values already in canonical units.
fn read_scale(device: &Path, prefix: &str) -> f64 {
    read_f64(&device.join(format!("{}_scale", prefix))).unwrap_or(1.0)
}

/// Channel probes per kind, first match wins within a device.
const PROBES: [(SensorKind, Channels); 5] = [
    (SensorKind::Accelerometer, Channels::Triple("in_accel")),
    (SensorKind::Gyroscope, Channels::Triple("in_anglvel")),
    (SensorKind::Magnetometer, Channels::Triple("in_magn")),
    (
        SensorKind::Compass,
        Channels::Single("in_rot_from_north_magnetic_tilt_comp"),
    ),
    (SensorKind::StepCounter, Channels::Single("in_steps")),
];

fn scan(root: &Path) -> Vec<IioSensor> {
    let mut sensors: Vec<IioSensor> = Vec::new();
    let mut next_handle = 0u64;

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("no iio sysfs at {}: {}", root.display(), e);
            return sensors;
        }
    };

    let mut devices: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("iio:device"))
        })
        .collect();
    devices.sort();

    for device in devices {
        for (kind, channels) in &PROBES {
            // One default sensor per kind, resolved once.
            if sensors.iter().any(|s| s.kind == *kind) {
                continue;
            }
            if has_channels(&device, channels) {
                sensors.push(IioSensor {
                    handle: SensorHandle(next_handle),
                    kind: *kind,
                    device: device.clone(),
                    channels: channels.clone(),
                });
                next_handle += 1;
            }
        }
    }

    sensors
}

fn has_channels(device: &Path, channels: &Channels) -> bool {
    match channels {
        Channels::Triple(prefix) => device.join(format!("{}_x_raw", prefix)).exists(),
        Channels::Single(name) => device.join(format!("{}_raw", name)).exists(),
    }
}
