//! panel-core - admin-panel resource engine
//!
//! Exposes CRUD-style resources through declarative field descriptors and
//! per-record actions. The engine owns the parts that are easy to get subtly
//! wrong:
//!
//! - recomputing dependent form fields when one changes, transitively, over a
//!   dependency graph proven acyclic first
//! - resolving field descriptors against many records concurrently without
//!   sharing mutable state, with output order always equal to input order
//! - partial versus all-or-nothing failure across batches
//!
//! HTTP routing, authentication, storage engines, and rendering are left to the
//! embedding application, which plugs in through the traits in [`store`],
//! [`actions`], and [`views`].
//!
//! # Core Modules
//!
//! ## Fields and forms
//! - [`field`] - immutable field configuration, per-unit descriptors, updates
//! - [`form`] - normalization of submitted form payloads
//!
//! ## Dependency cascades
//! - [`resolver`] - dependency graph, cycle detection, cascade resolution
//!
//! ## Record resolution
//! - [`resolution`] - descriptor isolation and the single-item executor
//! - [`views`] - single records, list rows, dashboard cards
//! - [`actions`] - bulk record loading and bulk actions
//! - [`utils`] - the bounded, order-preserving concurrent mapper
//!
//! ## Supporting Modules
//! - [`config`] - TOML configuration with environment overrides
//! - [`constants`] - worker-pool and cascade defaults
//! - [`core`] - error types and request context
//! - [`store`] - data-provider and related-collection capabilities
//! - [`panel`] - facade bundling configuration and registry
//!
//! # Configuration (panel.toml)
//!
//! ```toml
//! [mapper]
//! max_workers = 16
//!
//! [cascade]
//! max_rounds = 64
//!
//! [isolation]
//! policy = "sequential"
//! ```
//!
//! # Example
//!
//! ```rust
//! use panel_core::core::{RequestContext, VisibilityContext};
//! use panel_core::field::{FieldConfig, ResourceSchema};
//! use panel_core::panel::Panel;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let schema = ResourceSchema::new("posts")
//!     .with_field(FieldConfig::builder("title").shared())?
//!     .with_field(FieldConfig::builder("draft").hide_on(VisibilityContext::List).shared())?;
//!
//! let panel = Panel::default();
//! let rows = panel
//!     .resolve_rows(
//!         &schema,
//!         vec![json!({"id": 1, "title": "Hello"}), json!({"id": 2, "title": "World"})],
//!         &RequestContext::new(VisibilityContext::List),
//!     )
//!     .await?;
//!
//! assert_eq!(rows.len(), 2);
//! assert!(rows[0].data().unwrap().get("draft").is_none());
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod constants;
pub mod core;
pub mod field;
pub mod form;
pub mod panel;
pub mod resolution;
pub mod resolver;
pub mod store;
pub mod utils;
pub mod views;

// Test utilities (available for both unit and integration tests)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
