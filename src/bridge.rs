//! The bridge: activation registry plus event fan-out
//!
//! One `MotionBridge` per host. Start/stop are expected on a control thread;
//! samples arrive on whatever thread the host delivers on. Activation flags
//! are atomics and the subscriber list is behind an `RwLock`, so both sides
//! stay consistent without the bridge introducing any scheduling of its own.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::error::MotionError;
use crate::event::MotionEvent;
use crate::host::{RawSample, SampleSink, SensorHandle, SensorHost};
use crate::kind::{SamplingTier, SensorKind};

type Callback = Arc<dyn Fn(&MotionEvent) + Send + Sync>;

/// Identifies one registered subscriber, for [`MotionBridge::unsubscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Subscription(u64);

/// Shared with the host as its sample sink.
struct BridgeInner {
    subscribers: RwLock<Vec<(u64, Callback)>>,
    next_subscription: AtomicU64,
    dispatched: AtomicU64,
}

impl BridgeInner {
    fn subscribers(&self) -> RwLockReadGuard<'_, Vec<(u64, Callback)>> {
        // A panicking subscriber must not wedge dispatch for the others.
        match self.subscribers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of the current subscribers. Dispatch runs against the
    /// snapshot with the lock released, so a callback may subscribe or
    /// unsubscribe (itself included) without deadlocking the delivery
    /// thread; it still sees the event it was subscribed for.
    fn snapshot(&self) -> Vec<Callback> {
        self.subscribers()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }
}

impl SampleSink for BridgeInner {
    fn sample(&self, raw: &RawSample) {
        let subscribers = self.snapshot();
        // No subscribers: skip translation entirely, not just delivery.
        if subscribers.is_empty() {
            return;
        }
        let Some(event) = MotionEvent::from_raw(raw) else {
            return;
        };
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        for callback in subscribers {
            callback(&event);
        }
    }
}

/// Pass-through adapter between the host sensor subsystem and application
/// subscribers.
pub struct MotionBridge {
    host: Arc<dyn SensorHost>,
    /// Resolved once at construction, never re-resolved.
    handles: [Option<SensorHandle>; 6],
    active: [AtomicBool; 6],
    inner: Arc<BridgeInner>,
}

impl MotionBridge {
    pub fn new(host: Arc<dyn SensorHost>) -> Self {
        let mut handles = [None; 6];
        for kind in SensorKind::ALL {
            handles[kind.index()] = host.resolve(kind);
            if handles[kind.index()].is_none() {
                tracing::debug!("{} has no sensor on this device", kind);
            }
        }
        MotionBridge {
            host,
            handles,
            active: Default::default(),
            inner: Arc::new(BridgeInner {
                subscribers: RwLock::new(Vec::new()),
                next_subscription: AtomicU64::new(0),
                dispatched: AtomicU64::new(0),
            }),
        }
    }

    /// Starts delivery for `kind` at the requested tier.
    ///
    /// When the device has no such sensor this logs a notice and performs no
    /// host registration, but the kind still reports active afterwards:
    /// activation tracks the request, not the registration (see DESIGN.md).
    /// Idempotent; starting an already-started kind re-registers it.
    pub fn start(&self, kind: SensorKind, tier: SamplingTier) {
        match self.handles[kind.index()] {
            Some(handle) => {
                self.host
                    .register(handle, tier, Arc::clone(&self.inner) as Arc<dyn SampleSink>);
                tracing::debug!("started {} at tier {}", kind, tier);
            }
            None => tracing::warn!("{} not available", kind),
        }
        self.active[kind.index()].store(true, Ordering::SeqCst);
    }

    /// Stops delivery for `kind`. Idempotent. A sample already in flight when
    /// this returns may still reach subscribers.
    pub fn stop(&self, kind: SensorKind) {
        match self.handles[kind.index()] {
            Some(handle) => {
                self.host.unregister(handle);
                tracing::debug!("stopped {}", kind);
            }
            None => tracing::warn!("{} not available", kind),
        }
        self.active[kind.index()].store(false, Ordering::SeqCst);
    }

    /// [`start`](Self::start) via the untyped wire id; fails on out-of-range
    /// ids without touching any activation state.
    pub fn start_raw(&self, kind_id: u32, tier: SamplingTier) -> Result<(), MotionError> {
        let kind = SensorKind::try_from(kind_id)?;
        self.start(kind, tier);
        Ok(())
    }

    /// [`stop`](Self::stop) via the untyped wire id.
    pub fn stop_raw(&self, kind_id: u32) -> Result<(), MotionError> {
        let kind = SensorKind::try_from(kind_id)?;
        self.stop(kind);
        Ok(())
    }

    /// Whether `kind` has been started. True after a start even when the
    /// sensor is missing; use [`available`](Self::available) to tell the two
    /// apart.
    pub fn is_active(&self, kind: SensorKind) -> bool {
        self.active[kind.index()].load(Ordering::SeqCst)
    }

    /// Whether this device resolved a sensor for `kind` at construction.
    pub fn available(&self, kind: SensorKind) -> bool {
        self.handles[kind.index()].is_some()
    }

    /// Adds a subscriber. The callback runs synchronously on the host's
    /// delivery thread; slow callbacks delay subsequent deliveries.
    pub fn subscribe(
        &self,
        callback: impl Fn(&MotionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_subscription.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = match self.inner.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.push((id, Arc::new(callback)));
        Subscription(id)
    }

    /// Removes a subscriber. Returns false when the subscription was already
    /// removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut subscribers = match self.inner.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = subscribers.len();
        subscribers.retain(|(id, _)| *id != subscription.0);
        subscribers.len() != before
    }

    /// Number of events fanned out to subscribers since construction. Stays at
    /// zero while nobody is subscribed.
    pub fn dispatched(&self) -> u64 {
        self.inner.dispatched.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Reading;
    use crate::host::sim::SimulatedHost;
    use crate::host::{HostAccuracy, HostSensorType};
    use std::sync::Mutex;

    fn sample(source: HostSensorType, values: &[f64], ts: i64) -> RawSample {
        RawSample {
            source,
            values: values.to_vec(),
            timestamp_nanos: ts,
            accuracy: HostAccuracy::High,
        }
    }

    fn bridge_on(host: &Arc<SimulatedHost>) -> MotionBridge {
        MotionBridge::new(Arc::clone(host) as Arc<dyn SensorHost>)
    }

    #[test]
    fn test_start_stop_toggles_active() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        for kind in SensorKind::ALL {
            assert!(!bridge.is_active(kind));
            bridge.start(kind, SamplingTier::Default);
            assert!(bridge.is_active(kind));
            assert!(host.is_registered(kind));
            bridge.stop(kind);
            assert!(!bridge.is_active(kind));
            assert!(!host.is_registered(kind));
        }
    }

    #[test]
    fn test_start_is_idempotent() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        bridge.start(SensorKind::Gyroscope, SamplingTier::Ui);
        bridge.start(SensorKind::Gyroscope, SamplingTier::Game);
        assert!(bridge.is_active(SensorKind::Gyroscope));
        // Last start wins: the handle was re-registered at the new tier.
        assert_eq!(
            host.registered_tier(SensorKind::Gyroscope),
            Some(SamplingTier::Game)
        );
        bridge.stop(SensorKind::Gyroscope);
        bridge.stop(SensorKind::Gyroscope);
        assert!(!bridge.is_active(SensorKind::Gyroscope));
    }

    // Pins the historical quirk: activation tracks the request even when no
    // host registration could occur.
    #[test]
    fn test_start_without_sensor_still_reports_active() {
        let host = Arc::new(SimulatedHost::with_sensors(&[SensorKind::Accelerometer]));
        let bridge = bridge_on(&host);
        assert!(!bridge.available(SensorKind::StepCounter));
        bridge.start(SensorKind::StepCounter, SamplingTier::Default);
        assert!(bridge.is_active(SensorKind::StepCounter));
        assert_eq!(host.registration_count(), 0);
        bridge.stop(SensorKind::StepCounter);
        assert!(!bridge.is_active(SensorKind::StepCounter));
    }

    #[test]
    fn test_invalid_kind_id_leaves_state_unchanged() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        assert!(bridge.start_raw(42, SamplingTier::Default).is_err());
        assert!(bridge.stop_raw(42).is_err());
        for kind in SensorKind::ALL {
            assert!(!bridge.is_active(kind));
        }
        assert_eq!(host.registration_count(), 0);

        assert!(bridge.start_raw(0, SamplingTier::Default).is_ok());
        assert!(bridge.is_active(SensorKind::Accelerometer));
    }

    #[test]
    fn test_accelerometer_sample_delivers_one_event() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bridge.subscribe(move |event| sink.lock().unwrap().push(*event));

        bridge.start(SensorKind::Accelerometer, SamplingTier::Default);
        host.inject(sample(HostSensorType::Accelerometer, &[1.0, 2.0, 3.0], 1000));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, SensorKind::Accelerometer);
        assert_eq!(
            seen[0].reading,
            Reading::Vector {
                x: 1.0,
                y: 2.0,
                z: 3.0
            }
        );
        assert_eq!(seen[0].timestamp_nanos, 1000);
    }

    #[test]
    fn test_orientation_sample_delivers_compass_scalar() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bridge.subscribe(move |event| sink.lock().unwrap().push(*event));

        bridge.start(SensorKind::Compass, SamplingTier::Default);
        host.inject(sample(HostSensorType::Orientation, &[45.0], 5));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, SensorKind::Compass);
        assert_eq!(seen[0].reading, Reading::Scalar { value: 45.0 });
    }

    #[test]
    fn test_no_subscribers_means_no_dispatch() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        bridge.start(SensorKind::Accelerometer, SamplingTier::Fastest);
        host.inject(sample(HostSensorType::Accelerometer, &[1.0, 2.0, 3.0], 0));
        assert_eq!(bridge.dispatched(), 0);

        bridge.subscribe(|_| {});
        host.inject(sample(HostSensorType::Accelerometer, &[1.0, 2.0, 3.0], 1));
        assert_eq!(bridge.dispatched(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = bridge.subscribe(move |event| sink.lock().unwrap().push(*event));

        bridge.start(SensorKind::Gyroscope, SamplingTier::Default);
        host.inject(sample(HostSensorType::Gyroscope, &[0.1, 0.2, 0.3], 1));
        assert!(bridge.unsubscribe(subscription));
        assert!(!bridge.unsubscribe(subscription));
        host.inject(sample(HostSensorType::Gyroscope, &[0.4, 0.5, 0.6], 2));

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unmapped_host_source_produces_no_event() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        bridge.subscribe(|_| panic!("light samples must not be dispatched"));
        bridge.start(SensorKind::Accelerometer, SamplingTier::Default);
        host.inject(sample(HostSensorType::Light, &[300.0], 0));
        assert_eq!(bridge.dispatched(), 0);
    }

    #[test]
    fn test_accuracy_change_is_ignored() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        bridge.subscribe(|_| panic!("accuracy changes must not be dispatched"));
        bridge.start(SensorKind::Magnetometer, SamplingTier::Default);
        host.inject_accuracy(HostSensorType::MagneticField, HostAccuracy::Low);
        assert_eq!(bridge.dispatched(), 0);
    }

    // Dispatch runs against a snapshot with the lock released, so a callback
    // removing itself must neither deadlock the delivery thread nor miss the
    // event it was subscribed for.
    #[test]
    fn test_unsubscribe_from_own_callback_does_not_deadlock() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = Arc::new(bridge_on(&host));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let count = Arc::new(Mutex::new(0u32));

        let inner_bridge = Arc::clone(&bridge);
        let inner_slot = Arc::clone(&slot);
        let inner_count = Arc::clone(&count);
        let subscription = bridge.subscribe(move |_| {
            *inner_count.lock().unwrap() += 1;
            if let Some(subscription) = inner_slot.lock().unwrap().take() {
                assert!(inner_bridge.unsubscribe(subscription));
            }
        });
        *slot.lock().unwrap() = Some(subscription);

        bridge.start(SensorKind::Accelerometer, SamplingTier::Default);
        host.inject(sample(HostSensorType::Accelerometer, &[1.0, 2.0, 3.0], 1));
        host.inject(sample(HostSensorType::Accelerometer, &[4.0, 5.0, 6.0], 2));

        // First sample delivered, self-removal took effect for the second.
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_subscribe_from_own_callback_does_not_deadlock() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = Arc::new(bridge_on(&host));
        let count = Arc::new(Mutex::new(0u32));

        let inner_bridge = Arc::clone(&bridge);
        let inner_count = Arc::clone(&count);
        bridge.subscribe(move |_| {
            let late_count = Arc::clone(&inner_count);
            inner_bridge.subscribe(move |_| *late_count.lock().unwrap() += 1);
        });

        bridge.start(SensorKind::Gyroscope, SamplingTier::Default);
        host.inject(sample(HostSensorType::Gyroscope, &[0.1, 0.2, 0.3], 1));
        // The subscriber added mid-dispatch sees only later events.
        assert_eq!(*count.lock().unwrap(), 0);
        host.inject(sample(HostSensorType::Gyroscope, &[0.4, 0.5, 0.6], 2));
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_multiple_subscribers_each_receive_events() {
        let host = Arc::new(SimulatedHost::new());
        let bridge = bridge_on(&host);
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));
        let a = Arc::clone(&first);
        let b = Arc::clone(&second);
        bridge.subscribe(move |_| *a.lock().unwrap() += 1);
        bridge.subscribe(move |_| *b.lock().unwrap() += 1);

        bridge.start(SensorKind::StepCounter, SamplingTier::Default);
        host.inject(sample(HostSensorType::StepCounter, &[812.0], 9));

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
        assert_eq!(bridge.dispatched(), 1);
    }
}
