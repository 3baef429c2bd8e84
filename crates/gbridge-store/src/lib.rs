//! # gbridge-store - Shared State Store
//!
//! The durable key-value store shared (by convention of well-known keys)
//! between the primary application and the widget surface, plus the
//! snapshot projection both sides agree on.
//!
//! ## Public API
//!
//! ### Store (`store`, `file`)
//! - [`StateStore`] - The per-key atomic `get`/`set` contract
//! - [`MemoryStore`] - In-process backend for tests and single-process wiring
//! - [`FileStore`] - Durable TOML-backed store with exclusive file locking
//!
//! ### Snapshot (`snapshot`)
//! - [`SnapshotReader`] - Widget-side reads with per-field default fallback
//! - [`SnapshotWriter`] - App-side writes (the snapshot's sole writer)

pub mod file;
pub mod snapshot;
pub mod store;

pub use file::FileStore;
pub use snapshot::{
    SnapshotReader, SnapshotWriter, KEY_GUARDIAN_COUNT, KEY_SAFETY_STATUS, KEY_USER_NAME,
};
pub use store::{MemoryStore, StateStore};
