//! # gbridge-app - Primary Application Bridge
//!
//! The primary application's side of the bridge: the method channel the
//! native shell invokes commands on, the entry router that consumes the
//! activation flag exactly once, and the orchestration that ties the
//! snapshot writer and widget surface together.
//!
//! ## Public API
//!
//! ### Bridge (`bridge`)
//! - [`MethodChannel`] - the single `method -> handler` registration point
//! - [`MethodResult`] - one terminal result per invocation
//! - [`ChannelClient`] / [`ChannelServer`] - shell-origin transport
//!
//! ### Routing (`router`)
//! - [`EntryRouter`] - replace-intent, consume-once activation routing
//! - [`Route`] - where an activation lands
//!
//! ### Orchestration (`app`)
//! - [`PrimaryApp`] - app core: router + channel + snapshot writer
//! - [`AppHost`] - process-liveness wrapper implementing `ActivationTarget`
//! - [`bootstrap`] - wire a full [`BridgeStack`] over one store

pub mod app;
pub mod bridge;
pub mod router;

pub use app::{bootstrap, AppHost, BridgeStack, PrimaryApp};
pub use bridge::{
    shell_transport, ChannelCall, ChannelClient, ChannelServer, MethodChannel, MethodResult,
    CHANNEL_NAME, METHOD_TRIGGER_SOS, SOS_TRIGGERED,
};
pub use router::{EntryRouter, Route};
