//! Shared execution helpers
//!
//! # Modules
//!
//! - [`parallel`] - bounded, order-preserving concurrent map used by bulk
//!   loading, list rows, and dashboard cards

pub mod parallel;

pub use parallel::{BatchState, CancelSignal, MapOptions, OrderedMapper, WorkContext};
