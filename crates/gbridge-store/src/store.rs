//! The shared key-value contract and the in-process backend

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use gbridge_core::prelude::*;

/// Process-wide durable key-value store shared, by convention of well-known
/// keys, between the primary application and the widget surface.
///
/// Contract: per-key atomic `get`/`set`; concurrent writers to the same key
/// settle on last-write-wins; a value written under key `K` is eventually
/// visible to readers of `K`, not necessarily immediately.
pub trait StateStore: Send + Sync {
    /// Read the raw value under `key`, if present
    fn get(&self, key: &str) -> Option<Value>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Read a string value, falling back to `default` when the key is
    /// missing or holds a value of another shape
    fn get_str_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s,
            Some(other) => {
                debug!("key {key} holds non-string value {other}, using default");
                default.to_string()
            }
            None => default.to_string(),
        }
    }

    /// Read an unsigned integer value, falling back to `default` when the
    /// key is missing or the stored value is not a non-negative integer
    fn get_u32_or(&self, key: &str, default: u32) -> u32 {
        match self.get(key) {
            Some(value) => match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
                Some(n) => n,
                None => {
                    debug!("key {key} holds non-integer value {value}, using default");
                    default
                }
            },
            None => default,
        }
    }
}

/// In-process store backend.
///
/// Backs tests and single-process wiring; the durable variant is
/// [`crate::FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}
