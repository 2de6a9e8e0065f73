//! Field resolution against data items
//!
//! - [`isolation`] decides whether a field-set can be resolved concurrently and
//!   hands each unit of work its own descriptor copies and request context
//! - [`executor`] resolves one item's visible fields into a [`ResolvedRecord`]
//!
//! Batches over many items go through [`crate::utils::OrderedMapper`]; see
//! [`crate::views`].

pub mod executor;
pub mod isolation;

pub use executor::{ResolvedRecord, resolve_item};
pub use isolation::{
    ExecutionMode, IsolationPolicy, ResolutionTask, isolate_context, isolate_fields, plan,
    prepare_tasks, working_copies,
};
