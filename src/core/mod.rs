//! Core types shared by every part of the panel engine
//!
//! # Modules
//!
//! ## `error` - Error Handling
//!
//! - [`PanelError`] - enumerated failure modes of cascades, resolution, and actions
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any `anyhow::Error` into an [`ErrorContext`]
//!
//! ## `context` - Request Context
//!
//! - [`VisibilityContext`] - create/update/list/detail mode (`"edit"` aliases update)
//! - [`RequestContext`] - per-request state handed to callbacks

pub mod context;
pub mod error;

pub use context::{RequestContext, VisibilityContext};
pub use error::{ErrorContext, PanelError, user_friendly_error};

/// Result alias used across the crate for engine-level failures.
pub type Result<T, E = PanelError> = std::result::Result<T, E>;
