//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // State Store Errors
    // ─────────────────────────────────────────────────────────────
    #[error("State store error: {message}")]
    Store { message: String },

    #[error("Failed to open state store at: {path}")]
    StoreOpen { path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Action Dispatch Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Dispatch error: {message}")]
    Dispatch { message: String },

    #[error("Pending action no longer armed: {message}")]
    StaleAction { message: String },

    // ─────────────────────────────────────────────────────────────
    // Activation Routing Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Activation error: {message}")]
    Activation { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn store_open(path: impl Into<PathBuf>) -> Self {
        Self::StoreOpen { path: path.into() }
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::Dispatch {
            message: message.into(),
        }
    }

    pub fn stale_action(message: impl Into<String>) -> Self {
        Self::StaleAction {
            message: message.into(),
        }
    }

    pub fn activation(message: impl Into<String>) -> Self {
        Self::Activation {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Store { .. }
                | Error::Dispatch { .. }
                | Error::StaleAction { .. }
                | Error::Activation { .. }
                | Error::ChannelSend { .. }
                | Error::ChannelClosed
        )
    }

    /// Check if this error should abort the hosting process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StoreOpen { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
