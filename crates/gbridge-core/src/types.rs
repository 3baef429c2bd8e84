//! Domain types shared by the widget surface and the primary application

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one placed widget instance on the host shell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SurfaceId(pub u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface {}", self.0)
    }
}

/// Safety status projected onto the widget surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SafetyStatus {
    #[default]
    Safe,
    Alert,
    Unknown,
}

impl SafetyStatus {
    /// The string form written to and read from the state store
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Safe => "Safe",
            SafetyStatus::Alert => "Alert",
            SafetyStatus::Unknown => "Unknown",
        }
    }

    /// Parse a stored status string.
    ///
    /// Returns `None` for unrecognized values so the caller can substitute
    /// the field default. `Unknown` is a real stored state, not a parse
    /// failure sink.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Safe" => Some(SafetyStatus::Safe),
            "Alert" => Some(SafetyStatus::Alert),
            "Unknown" => Some(SafetyStatus::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted, shared view of application state consumed by the widget.
///
/// Read-many/write-one: only the primary application writes the snapshot;
/// the widget surface only reads it. Every field has a documented default so
/// a reader never fails on missing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub user_name: String,
    pub guardian_count: u32,
    pub safety_status: SafetyStatus,
}

impl StateSnapshot {
    pub const DEFAULT_USER_NAME: &'static str = "User";
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            user_name: Self::DEFAULT_USER_NAME.to_string(),
            guardian_count: 0,
            safety_status: SafetyStatus::Safe,
        }
    }
}

/// Actions armable on a widget surface.
///
/// Each code is scoped per [`SurfaceId`]: the dispatcher keeps at most one
/// pending-action record per `(surface, code)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCode {
    /// Trigger the SOS flow in the primary application
    TriggerSos,
    /// Bring the primary application to the foreground without an action
    OpenApp,
}

impl ActionCode {
    /// Stable identifier used on pending-action records and in logs
    pub fn wire_code(&self) -> &'static str {
        match self {
            ActionCode::TriggerSos => "guardian_bridge.SOS_ACTION",
            ActionCode::OpenApp => "guardian_bridge.OPEN_APP",
        }
    }

    pub fn from_wire(code: &str) -> Option<Self> {
        match code {
            "guardian_bridge.SOS_ACTION" => Some(ActionCode::TriggerSos),
            "guardian_bridge.OPEN_APP" => Some(ActionCode::OpenApp),
            _ => None,
        }
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_code())
    }
}
