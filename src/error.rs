//! Library error type
//!
//! Only invalid-argument conditions are errors. A sensor that is missing on
//! this device is a soft condition: start/stop log a notice and carry on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    /// A sensor kind name outside the closed set.
    #[error("unknown sensor kind: {0:?}")]
    UnknownKind(String),

    /// A sensor kind wire id outside the closed set.
    #[error("sensor kind id out of range: {0}")]
    InvalidKindId(u32),

    /// A sampling tier name outside the closed set.
    #[error("unknown sampling tier: {0:?}")]
    UnknownTier(String),
}
