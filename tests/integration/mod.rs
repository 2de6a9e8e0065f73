//! Integration test suite for panel-core
//!
//! Exercises the public API end to end with the in-memory collaborators from
//! `panel_core::test_utils`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=panel_core=debug cargo test --test integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - **cascade**: dependent-field resolution through the request boundary
//! - **rows**: list-row and single-record resolution, isolation policies
//! - **bulk**: bulk loading and bulk actions
//! - **cards**: dashboard card resolution
//! - **mapper**: ordering and failure modes of the concurrent mapper
//! - **config**: configuration files and environment overrides

mod bulk;
mod cards;
mod cascade;
mod config;
mod mapper;
mod rows;
