//! Simulated host
//!
//! In-process stand-in for the OS sensor subsystem: per-kind availability is
//! configurable and [`SimulatedHost::inject`] plays the role of the OS sensor
//! callback. Used by the test suite and by `watch --simulate`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::kind::{SamplingTier, SensorKind};

use super::{HostAccuracy, HostSensorType, RawSample, SampleSink, SensorHandle, SensorHost};

struct Registration {
    tier: SamplingTier,
    sink: Arc<dyn SampleSink>,
}

struct SimInner {
    handles: HashMap<SensorKind, SensorHandle>,
    registrations: HashMap<SensorHandle, Registration>,
}

pub struct SimulatedHost {
    inner: Mutex<SimInner>,
}

impl SimulatedHost {
    /// A host on which every kind is present.
    pub fn new() -> Self {
        Self::with_sensors(&SensorKind::ALL)
    }

    /// A host on which only the given kinds are present.
    pub fn with_sensors(kinds: &[SensorKind]) -> Self {
        let handles = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| (*kind, SensorHandle(i as u64)))
            .collect();
        SimulatedHost {
            inner: Mutex::new(SimInner {
                handles,
                registrations: HashMap::new(),
            }),
        }
    }

    /// Delivers a raw sample, synchronously on the calling thread.
    ///
    /// Like a real sensor service, a sink registered for several handles is
    /// invoked once per sample, whatever its source type; sorting out
    /// relevance is the sink's job.
    pub fn inject(&self, raw: RawSample) {
        for sink in self.distinct_sinks() {
            sink.sample(&raw);
        }
    }

    /// Delivers an accuracy-changed notification to every registered sink.
    pub fn inject_accuracy(&self, source: HostSensorType, accuracy: HostAccuracy) {
        for sink in self.distinct_sinks() {
            sink.accuracy_changed(source, accuracy);
        }
    }

    fn distinct_sinks(&self) -> Vec<Arc<dyn SampleSink>> {
        let inner = lock(&self.inner);
        let mut sinks: Vec<Arc<dyn SampleSink>> = Vec::new();
        for reg in inner.registrations.values() {
            if !sinks.iter().any(|s| Arc::ptr_eq(s, &reg.sink)) {
                sinks.push(Arc::clone(&reg.sink));
            }
        }
        sinks
    }

    /// Whether a listener is currently registered for this kind's handle.
    pub fn is_registered(&self, kind: SensorKind) -> bool {
        let inner = lock(&self.inner);
        match inner.handles.get(&kind) {
            Some(handle) => inner.registrations.contains_key(handle),
            None => false,
        }
    }

    /// The tier the kind was last registered at, if registered.
    pub fn registered_tier(&self, kind: SensorKind) -> Option<SamplingTier> {
        let inner = lock(&self.inner);
        let handle = inner.handles.get(&kind)?;
        inner.registrations.get(handle).map(|reg| reg.tier)
    }

    /// Number of live registrations.
    pub fn registration_count(&self) -> usize {
        lock(&self.inner).registrations.len()
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorHost for SimulatedHost {
    fn resolve(&self, kind: SensorKind) -> Option<SensorHandle> {
        lock(&self.inner).handles.get(&kind).copied()
    }

    fn register(&self, handle: SensorHandle, tier: SamplingTier, sink: Arc<dyn SampleSink>) {
        let mut inner = lock(&self.inner);
        if !inner.handles.values().any(|h| *h == handle) {
            tracing::warn!("register for unknown simulated handle {:?}", handle);
            return;
        }
        // Re-registering replaces the previous registration.
        inner.registrations.insert(handle, Registration { tier, sink });
    }

    fn unregister(&self, handle: SensorHandle) {
        lock(&self.inner).registrations.remove(&handle);
    }
}

/// Recovers from poisoning: a panicking subscriber must not wedge the host.
fn lock(inner: &Mutex<SimInner>) -> std::sync::MutexGuard<'_, SimInner> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_sensors_limits_availability() {
        let host = SimulatedHost::with_sensors(&[SensorKind::Accelerometer]);
        assert!(host.resolve(SensorKind::Accelerometer).is_some());
        assert!(host.resolve(SensorKind::Gyroscope).is_none());
    }

    #[test]
    fn test_register_unregister_roundtrip() {
        struct NullSink;
        impl SampleSink for NullSink {
            fn sample(&self, _raw: &RawSample) {}
        }

        let host = SimulatedHost::new();
        let handle = host.resolve(SensorKind::Gyroscope).unwrap();
        host.register(handle, SamplingTier::Game, Arc::new(NullSink));
        assert!(host.is_registered(SensorKind::Gyroscope));
        assert_eq!(
            host.registered_tier(SensorKind::Gyroscope),
            Some(SamplingTier::Game)
        );

        host.unregister(handle);
        assert!(!host.is_registered(SensorKind::Gyroscope));
        assert_eq!(host.registration_count(), 0);
    }
}
