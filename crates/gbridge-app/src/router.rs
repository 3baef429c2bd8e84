//! Entry routing: consume the activation flag exactly once per activation
//!
//! The router's whole job is the "never dropped, never doubled" property:
//! a new activation replaces the current launch intent (so a stale flag is
//! never re-triggered and a fresh one is never missed), and the flag is
//! consumed by the first `route` call for that activation.

use gbridge_core::prelude::*;
use gbridge_core::{Activation, LaunchKind};

/// Where an activation routes inside the primary application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run the safety-action handler before any other navigation
    SafetyAction,
    /// Regular navigation, nothing pending
    Home,
}

/// The current launch intent and whether it has been routed already
#[derive(Debug, Clone)]
struct LaunchIntent {
    activation: Activation,
    consumed: bool,
}

/// Routes (re)activations of the primary application.
///
/// Cold start and resume feed the same flag through the same path: the only
/// difference between them is who constructs the [`Activation`].
#[derive(Debug, Default)]
pub struct EntryRouter {
    current: Option<LaunchIntent>,
}

impl EntryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current launch intent with a new activation.
    ///
    /// This is the resumed path's set-intent step as much as the cold-start
    /// path's initial one; calling it again before the old intent was routed
    /// discards the old intent entirely.
    pub fn activate(&mut self, activation: Activation) {
        debug!(
            "activation: {:?} (sos: {})",
            activation.kind,
            activation.requests_sos()
        );
        self.current = Some(LaunchIntent {
            activation,
            consumed: false,
        });
    }

    /// Route the current intent, consuming its flag exactly once.
    ///
    /// The first call per activation returns [`Route::SafetyAction`] when
    /// the SOS flag is set; every later call (unrelated internal navigation,
    /// repeated flag observations) returns [`Route::Home`] until a new
    /// activation arrives.
    pub fn route(&mut self) -> Route {
        match self.current.as_mut() {
            Some(intent) if !intent.consumed => {
                intent.consumed = true;
                if intent.activation.requests_sos() {
                    info!("routing {:?} activation to safety action", intent.activation.kind);
                    Route::SafetyAction
                } else {
                    Route::Home
                }
            }
            // Already handled for this activation, or never activated
            Some(_) | None => Route::Home,
        }
    }

    /// Launch kind of the current intent, if any
    pub fn current_kind(&self) -> Option<LaunchKind> {
        self.current.as_ref().map(|intent| intent.activation.kind)
    }
}
