//! # gbridge-surface - Widget Surface and Action Dispatch
//!
//! The secondary display surface: a stateless projection of the persisted
//! snapshot plus the pending-action machinery that turns a user tap into a
//! durable, de-duplicated activation of the primary application.
//!
//! ## Public API
//!
//! ### Dispatch (`dispatcher`)
//! - [`ActionDispatcher`] - arm/deliver/receive over pending-action records
//! - [`ActionHandle`] - identity handle to one armed record
//! - [`ActivationTarget`] - the seam the primary application implements
//!
//! ### Surface (`surface`)
//! - [`WidgetSurface`] - `refresh`/`refresh_all` + host lifecycle hooks
//! - [`RenderedSurface`] - the fixed layout produced by one refresh

pub mod dispatcher;
pub mod surface;

pub use dispatcher::{ActionDispatcher, ActionHandle, ActivationTarget};
pub use surface::{ClickRegion, RenderedSurface, WidgetSurface};
