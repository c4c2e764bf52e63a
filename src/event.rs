//! Normalized motion events and the host-sample translation rules

use serde::{Deserialize, Serialize};

use crate::host::{HostSensorType, RawSample};
use crate::kind::SensorKind;

/// A single normalized sensor reading.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Reading {
    /// 3-axis sample (accelerometer, gyroscope, magnetometer).
    Vector { x: f64, y: f64, z: f64 },
    /// Single-value sample (compass heading, step pulse, cumulative steps).
    Scalar { value: f64 },
}

impl Reading {
    pub fn is_vector(&self) -> bool {
        matches!(self, Reading::Vector { .. })
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Reading::Scalar { .. })
    }
}

/// One translated host sensor callback. Constructed fresh per callback and
/// never persisted.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub kind: SensorKind,
    #[serde(flatten)]
    pub reading: Reading,
    /// Host timestamp, passed through verbatim (unit and epoch are
    /// host-defined).
    pub timestamp_nanos: i64,
}

impl MotionEvent {
    /// Translates a raw host sample into a normalized event.
    ///
    /// Host source types outside the mapped set yield `None`, as do vector
    /// samples with fewer than three values and scalar samples with none.
    pub fn from_raw(raw: &RawSample) -> Option<MotionEvent> {
        let (kind, reading) = match raw.source {
            HostSensorType::Accelerometer => {
                (SensorKind::Accelerometer, vector(&raw.values)?)
            }
            HostSensorType::Gyroscope => (SensorKind::Gyroscope, vector(&raw.values)?),
            HostSensorType::MagneticField => {
                (SensorKind::Magnetometer, vector(&raw.values)?)
            }
            HostSensorType::Orientation => (SensorKind::Compass, scalar(&raw.values)?),
            HostSensorType::StepDetector => {
                (SensorKind::StepDetector, scalar(&raw.values)?)
            }
            HostSensorType::StepCounter => {
                (SensorKind::StepCounter, scalar(&raw.values)?)
            }
            _ => return None,
        };

        Some(MotionEvent {
            kind,
            reading,
            timestamp_nanos: raw.timestamp_nanos,
        })
    }
}

fn vector(values: &[f64]) -> Option<Reading> {
    match values {
        [x, y, z, ..] => Some(Reading::Vector {
            x: *x,
            y: *y,
            z: *z,
        }),
        _ => None,
    }
}

fn scalar(values: &[f64]) -> Option<Reading> {
    values.first().map(|v| Reading::Scalar { value: *v })
}
