//! Dependent-field resolution for forms.
//!
//! Two stages, always in this order:
//!
//! 1. [`DependencyGraph`] builds the field dependency graph for the active
//!    field-set and proves it acyclic. A cycle aborts the request.
//! 2. [`CascadeResolver`] walks the graph from the changed keys, invoking change
//!    callbacks and propagating published values to further dependents.
//!
//! The graph is rebuilt per call because the field-set depends on the
//! visibility context.
//!
//! # Example
//!
//! ```rust
//! use panel_core::field::{FieldConfig, FieldUpdate, ResourceSchema};
//! use panel_core::core::VisibilityContext;
//! use panel_core::resolver::{CascadeResolver, DependencyRequest};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ResourceSchema::new("addresses")
//!     .with_field(FieldConfig::builder("country").shared())?
//!     .with_field(
//!         FieldConfig::builder("city")
//!             .depends_on(["country"])
//!             .on_change_in(VisibilityContext::Update, |_, _, _| {
//!                 Ok(Some(FieldUpdate::new().with_value("X")))
//!             })
//!             .shared(),
//!     )?;
//!
//! let request: DependencyRequest = serde_json::from_value(json!({
//!     "form": {"country": "1"},
//!     "changed": ["country"],
//!     "context": "edit"
//! }))?;
//! let updates = CascadeResolver::default().resolve_request(&schema, request)?;
//! assert_eq!(serde_json::to_value(&updates)?, json!({"city": {"value": "X"}}));
//! # Ok(())
//! # }
//! ```

mod cascade;
mod dependency_graph;

pub use cascade::{CascadeResolver, CascadeResponse, DependencyRequest};
pub use dependency_graph::DependencyGraph;
