//! Logical sensor kinds and sampling tiers
//!
//! The six kinds are a fixed, closed set. Host sensor subsystems report a
//! richer set of source types; the mapping back to these kinds lives in
//! [`crate::event`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Logical motion sensor category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Compass,
    StepDetector,
    StepCounter,
}

impl SensorKind {
    /// All kinds, in wire-id order.
    pub const ALL: [SensorKind; 6] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::Magnetometer,
        SensorKind::Compass,
        SensorKind::StepDetector,
        SensorKind::StepCounter,
    ];

    /// Stable name used in config files and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::Compass => "compass",
            SensorKind::StepDetector => "step-detector",
            SensorKind::StepCounter => "step-counter",
        }
    }

    /// Dense index for per-kind tables.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accelerometer" => Ok(SensorKind::Accelerometer),
            "gyroscope" => Ok(SensorKind::Gyroscope),
            "magnetometer" => Ok(SensorKind::Magnetometer),
            "compass" => Ok(SensorKind::Compass),
            "step-detector" => Ok(SensorKind::StepDetector),
            "step-counter" => Ok(SensorKind::StepCounter),
            other => Err(MotionError::UnknownKind(other.to_string())),
        }
    }
}

impl TryFrom<u32> for SensorKind {
    type Error = MotionError;

    /// Converts the untyped wire id (enum ordinal) back into a kind.
    fn try_from(id: u32) -> Result<Self, Self::Error> {
        SensorKind::ALL
            .get(id as usize)
            .copied()
            .ok_or(MotionError::InvalidKindId(id))
    }
}

/// Abstract delivery-frequency request. The exact rate is chosen by the host
/// sensor subsystem; these tiers carry no guarantees.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingTier {
    #[default]
    Default,
    Ui,
    Game,
    Fastest,
}

impl SamplingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingTier::Default => "default",
            SamplingTier::Ui => "ui",
            SamplingTier::Game => "game",
            SamplingTier::Fastest => "fastest",
        }
    }
}

impl fmt::Display for SamplingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingTier {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(SamplingTier::Default),
            "ui" => Ok(SamplingTier::Ui),
            "game" => Ok(SamplingTier::Game),
            "fastest" => Ok(SamplingTier::Fastest),
            other => Err(MotionError::UnknownTier(other.to_string())),
        }
    }
}
