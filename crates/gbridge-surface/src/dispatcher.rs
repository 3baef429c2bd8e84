//! Pending-action records and tap dispatch
//!
//! The registry keeps at most one pending-action record per
//! `(SurfaceId, ActionCode)` pair. Arming is an idempotent upsert: the
//! record's identity is stable across re-arms and only its payload is
//! refreshed, which is what makes a concurrent refresh + tap safe without
//! explicit locking on the caller's side.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use gbridge_core::prelude::*;
use gbridge_core::{ActionCode, ActionRequest, ActivationFlags, ActivationSource, SurfaceId};

/// Receives the launch flags produced by a delivered surface action.
///
/// Implemented by the primary application's host layer. The dispatcher does
/// not know whether the process behind the target is already running; the
/// target owns the cold-start vs. resumed decision and guarantees the flags
/// reach the entry router either way.
pub trait ActivationTarget: Send + Sync {
    /// Foreground or start the primary application with `flags`
    fn activate(&self, flags: ActivationFlags) -> Result<()>;
}

/// Handle to one armed pending-action record.
///
/// Two handles are equal exactly when they refer to the same underlying
/// record, so equality is the record-identity check the refresh idempotence
/// contract talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle {
    pub surface_id: SurfaceId,
    pub code: ActionCode,
    record_id: u64,
}

impl ActionHandle {
    /// Identity of the underlying pending-action record
    pub fn record_id(&self) -> u64 {
        self.record_id
    }
}

/// One outstanding pending-action record
#[derive(Debug, Clone)]
struct PendingRecord {
    record_id: u64,
    /// Bumped on every re-arm; the record identity stays fixed
    generation: u64,
    request: ActionRequest,
}

/// The per-instance pending-action table
#[derive(Debug, Default)]
struct Registry {
    records: HashMap<(SurfaceId, ActionCode), PendingRecord>,
}

/// Builds, replaces, and delivers pending-action records.
///
/// State machine per `(surface, code)` pair: Idle -> ActionPending -> Idle.
/// `arm` moves to ActionPending (or refreshes the record in place),
/// `deliver` consumes the record back to Idle and routes the request to the
/// in-process receiver.
pub struct ActionDispatcher {
    registry: RwLock<Registry>,
    next_record_id: AtomicU64,
    target: Arc<dyn ActivationTarget>,
}

impl ActionDispatcher {
    pub fn new(target: Arc<dyn ActivationTarget>) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            next_record_id: AtomicU64::new(1),
            target,
        }
    }

    /// Build or refresh the single pending-action record for
    /// `(surface_id, code)`.
    ///
    /// Safe to call repeatedly: a second arm updates the record payload in
    /// place and returns a handle with the same record identity.
    pub fn arm(&self, surface_id: SurfaceId, code: ActionCode) -> ActionHandle {
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let record = registry
            .records
            .entry((surface_id, code))
            .and_modify(|record| {
                record.generation += 1;
                record.request = ActionRequest::from_shell(surface_id, code);
            })
            .or_insert_with(|| PendingRecord {
                record_id: self.next_record_id.fetch_add(1, Ordering::SeqCst),
                generation: 0,
                request: ActionRequest::from_shell(surface_id, code),
            });

        trace!(
            "armed {code} on {surface_id} (record {}, generation {})",
            record.record_id,
            record.generation
        );

        ActionHandle {
            surface_id,
            code,
            record_id: record.record_id,
        }
    }

    /// User tap: consume the armed record and route it to the in-process
    /// receiver.
    ///
    /// Delivering a handle whose record was dropped (instance removed) or
    /// replaced is a recoverable [`Error::StaleAction`].
    pub fn deliver(&self, handle: ActionHandle) -> Result<()> {
        let request = {
            let mut registry = self
                .registry
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            let key = (handle.surface_id, handle.code);
            let armed = registry
                .records
                .get(&key)
                .is_some_and(|record| record.record_id == handle.record_id);
            if armed {
                // Consumed on tap; the next refresh re-arms it
                registry.records.remove(&key).map(|record| record.request)
            } else {
                None
            }
        };

        let request = request.ok_or_else(|| {
            Error::stale_action(format!("{} on {}", handle.code, handle.surface_id))
        })?;

        self.receive(request)
    }

    /// The in-process receiver's entry point.
    ///
    /// On the SOS code, asks the activation target to foreground or start
    /// the primary application with the SOS flag set. The handoff is
    /// fire-and-forget: once the target accepts the flags, the dispatcher is
    /// done.
    pub fn receive(&self, request: ActionRequest) -> Result<()> {
        let source = if request.issued_from_shell {
            ActivationSource::Shell
        } else {
            ActivationSource::InApp
        };

        let flags = match request.code {
            ActionCode::TriggerSos => {
                info!("SOS action delivered from {}", request.surface_id);
                ActivationFlags::sos(source)
            }
            ActionCode::OpenApp => {
                debug!("open-app action delivered from {}", request.surface_id);
                ActivationFlags::open(source)
            }
        };

        self.target.activate(flags)
    }

    /// Drop every pending record for one surface instance
    pub fn drop_surface(&self, surface_id: SurfaceId) {
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        registry.records.retain(|(id, _), _| *id != surface_id);
    }

    /// Number of outstanding pending-action records
    pub fn pending_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    /// Generation of the record behind `handle`, if it is still armed
    pub fn generation(&self, handle: ActionHandle) -> Option<u64> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry
            .records
            .get(&(handle.surface_id, handle.code))
            .filter(|record| record.record_id == handle.record_id)
            .map(|record| record.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Test target that records every activation it receives
    #[derive(Default)]
    struct RecordingTarget {
        activations: Mutex<Vec<ActivationFlags>>,
    }

    impl RecordingTarget {
        fn flags(&self) -> Vec<ActivationFlags> {
            self.activations.lock().unwrap().clone()
        }
    }

    impl ActivationTarget for RecordingTarget {
        fn activate(&self, flags: ActivationFlags) -> Result<()> {
            self.activations.lock().unwrap().push(flags);
            Ok(())
        }
    }

    fn dispatcher() -> (Arc<RecordingTarget>, ActionDispatcher) {
        let target = Arc::new(RecordingTarget::default());
        let dispatcher = ActionDispatcher::new(Arc::clone(&target) as Arc<dyn ActivationTarget>);
        (target, dispatcher)
    }

    #[test]
    fn test_arm_twice_keeps_one_record() {
        let (_target, dispatcher) = dispatcher();

        let first = dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
        let second = dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);

        assert_eq!(first, second);
        assert_eq!(dispatcher.pending_count(), 1);
        // Re-arm refreshed the payload
        assert_eq!(dispatcher.generation(second), Some(1));
    }

    #[test]
    fn test_records_scoped_per_surface_and_code() {
        let (_target, dispatcher) = dispatcher();

        let sos_a = dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
        let sos_b = dispatcher.arm(SurfaceId(2), ActionCode::TriggerSos);
        let open_a = dispatcher.arm(SurfaceId(1), ActionCode::OpenApp);

        assert_ne!(sos_a, sos_b);
        assert_ne!(sos_a, open_a);
        assert_eq!(dispatcher.pending_count(), 3);
    }

    #[test]
    fn test_deliver_sos_routes_flags_to_target() {
        let (target, dispatcher) = dispatcher();

        let handle = dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
        dispatcher.deliver(handle).unwrap();

        let flags = target.flags();
        assert_eq!(flags.len(), 1);
        assert!(flags[0].trigger_sos);
        assert_eq!(flags[0].source, ActivationSource::Shell);
    }

    #[test]
    fn test_deliver_open_app_does_not_set_sos_flag() {
        let (target, dispatcher) = dispatcher();

        let handle = dispatcher.arm(SurfaceId(1), ActionCode::OpenApp);
        dispatcher.deliver(handle).unwrap();

        let flags = target.flags();
        assert_eq!(flags.len(), 1);
        assert!(!flags[0].trigger_sos);
    }

    #[test]
    fn test_deliver_consumes_the_record() {
        let (target, dispatcher) = dispatcher();

        let handle = dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
        dispatcher.deliver(handle).unwrap();
        assert_eq!(dispatcher.pending_count(), 0);

        // A second tap on the consumed record is stale, not a duplicate SOS
        let err = dispatcher.deliver(handle).unwrap_err();
        assert!(matches!(err, Error::StaleAction { .. }));
        assert_eq!(target.flags().len(), 1);
    }

    #[test]
    fn test_deliver_after_drop_surface_is_stale() {
        let (_target, dispatcher) = dispatcher();

        let handle = dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
        dispatcher.drop_surface(SurfaceId(1));

        let err = dispatcher.deliver(handle).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_drop_surface_keeps_other_instances() {
        let (_target, dispatcher) = dispatcher();

        dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
        dispatcher.arm(SurfaceId(1), ActionCode::OpenApp);
        let keep = dispatcher.arm(SurfaceId(2), ActionCode::TriggerSos);

        dispatcher.drop_surface(SurfaceId(1));

        assert_eq!(dispatcher.pending_count(), 1);
        assert_eq!(dispatcher.generation(keep), Some(0));
    }

    #[test]
    fn test_concurrent_arms_keep_one_record_per_pair() {
        let (_target, dispatcher) = dispatcher();
        let dispatcher = Arc::new(dispatcher);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(dispatcher.pending_count(), 1);
    }

    #[test]
    fn test_concurrent_arm_and_deliver() {
        let (target, dispatcher) = dispatcher();
        let dispatcher = Arc::new(dispatcher);

        let armer = {
            let dispatcher = Arc::clone(&dispatcher);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
                }
            })
        };
        let tapper = {
            let dispatcher = Arc::clone(&dispatcher);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let handle = dispatcher.arm(SurfaceId(1), ActionCode::TriggerSos);
                    // The concurrent armer may have replaced nothing: arm is
                    // an upsert, so deliver only fails if a racing tap won
                    let _ = dispatcher.deliver(handle);
                }
            })
        };
        armer.join().unwrap();
        tapper.join().unwrap();

        // Never more than the single pair outstanding
        assert!(dispatcher.pending_count() <= 1);
        assert!(!target.flags().is_empty());
        assert!(target.flags().iter().all(|flags| flags.trigger_sos));
    }
}
