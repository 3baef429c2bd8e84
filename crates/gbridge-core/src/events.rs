//! Activation and dispatch event definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ActionCode, SurfaceId};

/// Wire key for the SOS flag attached to an activation
pub const TRIGGER_SOS_KEY: &str = "trigger_sos";

/// Where an action or activation originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivationSource {
    /// The native shell hosting the widget surface
    Shell,
    /// The application's own UI layer
    InApp,
}

/// How the primary application process came to handle an activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaunchKind {
    /// The process was started by this activation
    ColdStart,
    /// The process was already alive and received a new activation
    Resumed,
}

/// One user-initiated dispatch of a surface action.
///
/// Created when the surface is (re)drawn, consumed when tapped, immutable
/// between redraws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub surface_id: SurfaceId,
    pub code: ActionCode,
    #[serde(default)]
    pub issued_from_shell: bool,
    pub issued_at: DateTime<Utc>,
}

impl ActionRequest {
    pub fn from_shell(surface_id: SurfaceId, code: ActionCode) -> Self {
        Self {
            surface_id,
            code,
            issued_from_shell: true,
            issued_at: Utc::now(),
        }
    }
}

/// The launch flags the dispatcher hands to the activation target.
///
/// Serialized field names are the wire contract: the SOS flag travels under
/// [`TRIGGER_SOS_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationFlags {
    pub trigger_sos: bool,
    pub source: ActivationSource,
}

impl ActivationFlags {
    /// Flags for an SOS dispatch
    pub fn sos(source: ActivationSource) -> Self {
        Self {
            trigger_sos: true,
            source,
        }
    }

    /// Flags for a plain open-the-app dispatch
    pub fn open(source: ActivationSource) -> Self {
        Self {
            trigger_sos: false,
            source,
        }
    }
}

/// One (re)activation of the primary application, as seen by the entry
/// router once the process knows whether it was cold-started or resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub kind: LaunchKind,
    pub flags: ActivationFlags,
    pub received_at: DateTime<Utc>,
}

impl Activation {
    pub fn cold_start(flags: ActivationFlags) -> Self {
        Self {
            kind: LaunchKind::ColdStart,
            flags,
            received_at: Utc::now(),
        }
    }

    pub fn resumed(flags: ActivationFlags) -> Self {
        Self {
            kind: LaunchKind::Resumed,
            flags,
            received_at: Utc::now(),
        }
    }

    /// True when this activation carries the SOS flag
    pub fn requests_sos(&self) -> bool {
        self.flags.trigger_sos
    }
}
