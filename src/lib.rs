//! motion-bridge: device motion sensors behind one event interface
//!
//! A thin pass-through adapter over the host operating system's sensor
//! subsystem. The bridge resolves one handle per logical sensor kind at
//! construction, forwards start/stop requests to the host, and translates
//! each host callback into a normalized [`MotionEvent`] fanned out to
//! subscribers.
//!
//! No fusion, no filtering, no buffering: what the host delivers is what
//! subscribers see, on the thread the host delivers it on.
//!
//! ```no_run
//! use std::sync::Arc;
//! use motion_bridge::{host::sim::SimulatedHost, MotionBridge, SamplingTier, SensorKind};
//!
//! let host = Arc::new(SimulatedHost::new());
//! let bridge = MotionBridge::new(host);
//! bridge.subscribe(|event| println!("{:?}", event));
//! bridge.start(SensorKind::Accelerometer, SamplingTier::Ui);
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod kind;

pub use bridge::{MotionBridge, Subscription};
pub use error::MotionError;
pub use event::{MotionEvent, Reading};
pub use kind::{SamplingTier, SensorKind};
