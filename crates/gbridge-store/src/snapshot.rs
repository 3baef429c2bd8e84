//! Snapshot projection over the well-known store keys
//!
//! The snapshot is read-many/write-one: [`SnapshotWriter`] belongs to the
//! primary application (the sole writer), [`SnapshotReader`] to the widget
//! surface (the sole reader). Both sides agree only on the key namespace
//! below; there is no other handshake.

use std::sync::Arc;

use serde_json::{json, Value};

use gbridge_core::prelude::*;
use gbridge_core::{SafetyStatus, StateSnapshot};

use crate::store::StateStore;

/// Key namespace shared between the app and the widget surface
pub const KEY_USER_NAME: &str = "bridge.user_name";
pub const KEY_GUARDIAN_COUNT: &str = "bridge.guardian_count";
pub const KEY_SAFETY_STATUS: &str = "bridge.safety_status";

/// Widget-side read access to the persisted snapshot.
///
/// Loading never fails: a missing or malformed field falls back to its
/// documented default ([`StateSnapshot::default`]), silently from the
/// user's point of view.
#[derive(Clone)]
pub struct SnapshotReader {
    store: Arc<dyn StateStore>,
}

impl SnapshotReader {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Load the current snapshot with per-field default fallback
    pub fn load(&self) -> StateSnapshot {
        let defaults = StateSnapshot::default();

        let user_name = self
            .store
            .get_str_or(KEY_USER_NAME, StateSnapshot::DEFAULT_USER_NAME);

        let guardian_count = self
            .store
            .get_u32_or(KEY_GUARDIAN_COUNT, defaults.guardian_count);

        let safety_status = match self.store.get(KEY_SAFETY_STATUS) {
            Some(Value::String(s)) => SafetyStatus::parse(&s).unwrap_or_else(|| {
                debug!("unrecognized safety status {s:?}, using default");
                defaults.safety_status
            }),
            Some(other) => {
                debug!("safety status holds non-string value {other}, using default");
                defaults.safety_status
            }
            None => defaults.safety_status,
        };

        StateSnapshot {
            user_name,
            guardian_count,
            safety_status,
        }
    }
}

/// App-side write access to the persisted snapshot.
///
/// The snapshot is created implicitly by the first write and never
/// explicitly deleted.
#[derive(Clone)]
pub struct SnapshotWriter {
    store: Arc<dyn StateStore>,
}

impl SnapshotWriter {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Write all snapshot fields
    pub fn write_snapshot(&self, snapshot: &StateSnapshot) -> Result<()> {
        self.set_user_name(&snapshot.user_name)?;
        self.set_guardian_count(snapshot.guardian_count)?;
        self.set_safety_status(snapshot.safety_status)?;
        Ok(())
    }

    pub fn set_user_name(&self, name: &str) -> Result<()> {
        self.store.set(KEY_USER_NAME, json!(name))
    }

    pub fn set_guardian_count(&self, count: u32) -> Result<()> {
        self.store.set(KEY_GUARDIAN_COUNT, json!(count))
    }

    pub fn set_safety_status(&self, status: SafetyStatus) -> Result<()> {
        debug!("safety status -> {status}");
        self.store.set(KEY_SAFETY_STATUS, json!(status.as_str()))
    }
}
