//! Host platform seam
//!
//! The actual sensing is done by the host operating system. Each platform
//! binding implements [`SensorHost`]: resolve a handle per logical kind once,
//! register/unregister a [`SampleSink`] for a handle at a requested tier, and
//! invoke the sink from whatever thread the platform delivers samples on.
//!
//! Only compiled-in bindings exist; there is no runtime plugin loading.

use std::sync::Arc;

use crate::kind::{SamplingTier, SensorKind};

pub mod sim;

#[cfg(all(feature = "linux", target_os = "linux"))]
pub mod iio;

/// Source type as reported by the host sensor subsystem. A richer set than
/// [`SensorKind`]; unmapped variants are ignored by the bridge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum HostSensorType {
    Accelerometer,
    Gyroscope,
    MagneticField,
    Orientation,
    StepDetector,
    StepCounter,
    Light,
    Pressure,
    Proximity,
}

impl HostSensorType {
    /// The host source type a logical kind subscribes to.
    pub fn for_kind(kind: SensorKind) -> HostSensorType {
        match kind {
            SensorKind::Accelerometer => HostSensorType::Accelerometer,
            SensorKind::Gyroscope => HostSensorType::Gyroscope,
            SensorKind::Magnetometer => HostSensorType::MagneticField,
            SensorKind::Compass => HostSensorType::Orientation,
            SensorKind::StepDetector => HostSensorType::StepDetector,
            SensorKind::StepCounter => HostSensorType::StepCounter,
        }
    }
}

/// Host-reported reading accuracy. Carried through on samples, otherwise
/// unused by the bridge.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

/// One raw host sensor callback, before translation.
#[derive(Debug, Clone)]
pub struct RawSample {
    pub source: HostSensorType,
    /// Positional values; layout is source-type specific.
    pub values: Vec<f64>,
    /// Host timestamp, unit and epoch host-defined.
    pub timestamp_nanos: i64,
    pub accuracy: HostAccuracy,
}

/// Opaque reference to one host sensor, valid for the lifetime of the host
/// that issued it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SensorHandle(pub(crate) u64);

/// Receiver side of host callbacks. Implemented by the bridge.
pub trait SampleSink: Send + Sync {
    /// Called once per host sensor reading, on the host's delivery thread.
    fn sample(&self, raw: &RawSample);

    /// Accuracy change notification. Accepted and ignored by default.
    fn accuracy_changed(&self, _source: HostSensorType, _accuracy: HostAccuracy) {}
}

/// A platform binding to the host sensor subsystem.
pub trait SensorHost: Send + Sync {
    /// Resolves the default handle for a kind, or `None` when this device has
    /// no such sensor. Called once per kind at bridge construction.
    fn resolve(&self, kind: SensorKind) -> Option<SensorHandle>;

    /// Registers `sink` for deliveries from `handle` at the requested tier.
    /// Registering an already-registered handle re-registers it.
    fn register(&self, handle: SensorHandle, tier: SamplingTier, sink: Arc<dyn SampleSink>);

    /// Stops deliveries from `handle`. A callback already in flight may still
    /// complete.
    fn unregister(&self, handle: SensorHandle);
}
