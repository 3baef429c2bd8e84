//! # gbridge-core - Core Domain Types
//!
//! Foundation crate for Guardian Bridge. Provides the domain types, error
//! handling, activation events, and logging setup shared by the store,
//! surface, and app crates.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`StateSnapshot`] - The persisted state view the widget surface renders
//! - [`SafetyStatus`] - Safety state shown on the widget (Safe, Alert, Unknown)
//! - [`SurfaceId`] - Identifier of one placed widget instance
//! - [`ActionCode`] - Armable surface actions (TriggerSos, OpenApp)
//!
//! ### Events (`events`)
//! - [`ActionRequest`] - One user-initiated dispatch of a surface action
//! - [`ActivationFlags`] - Launch flags handed to the activation target
//! - [`Activation`] - A cold-start or resumed activation of the primary app
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use gbridge_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Guardian Bridge crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::{
    ActionRequest, Activation, ActivationFlags, ActivationSource, LaunchKind, TRIGGER_SOS_KEY,
};
pub use types::{ActionCode, SafetyStatus, StateSnapshot, SurfaceId};
