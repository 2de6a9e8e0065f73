//! Test utilities for the panel engine
//!
//! In-memory implementations of the store collaborators, custom views with
//! known isolation behavior, and field fixtures shared by unit and
//! integration tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use panel_core::test_utils::{MemoryProvider, init_test_logging};
//! use serde_json::json;
//!
//! init_test_logging(None);
//! let provider = MemoryProvider::new(vec![json!({"id": 1})]).with_batch(true);
//! assert_eq!(provider.find_many_calls(), 0);
//! ```

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::VisibilityContext;
use crate::field::{CustomView, FieldConfig, FieldUpdate, ResourceSchema};
use crate::store::{DataProvider, OptionScope, Record, RelatedCollection, record_attribute, record_id};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Installs a `tracing` subscriber once per process. Uses `level` when given,
/// otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=panel_core=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// In-memory [`DataProvider`] with lookup counters.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    records: Vec<Record>,
    batch: bool,
    latency: Option<Duration>,
    failing: HashSet<String>,
    find_one_calls: AtomicUsize,
    find_many_calls: AtomicUsize,
}

impl MemoryProvider {
    /// Provider serving `records`, keyed by their `id`.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Enable or disable batched lookups.
    #[must_use]
    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    /// Delay every lookup.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make lookups of `id` fail with a store error.
    #[must_use]
    pub fn with_failure(mut self, id: impl Into<String>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// Number of `find_one` calls so far.
    pub fn find_one_calls(&self) -> usize {
        self.find_one_calls.load(Ordering::SeqCst)
    }

    /// Number of `find_many` calls so far.
    pub fn find_many_calls(&self) -> usize {
        self.find_many_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, id: &str) -> Option<Record> {
        self.records.iter().find(|r| record_id(r).as_deref() == Some(id)).cloned()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DataProvider for MemoryProvider {
    async fn find_one(&self, id: &str) -> anyhow::Result<Option<Record>> {
        self.find_one_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failing.contains(id) {
            anyhow::bail!("connection reset while loading {id}");
        }
        Ok(self.lookup(id))
    }

    fn supports_batch(&self) -> bool {
        self.batch
    }

    async fn find_many(&self, ids: &[String]) -> anyhow::Result<Vec<Record>> {
        self.find_many_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(id) = ids.iter().find(|id| self.failing.contains(*id)) {
            anyhow::bail!("connection reset while loading {id}");
        }
        Ok(ids.iter().filter_map(|id| self.lookup(id)).collect())
    }
}

/// In-memory [`RelatedCollection`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    rows: Vec<Record>,
}

impl MemoryCollection {
    /// Collection `name` holding `rows`.
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

#[async_trait]
impl RelatedCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn distinct_values(&self, column: &str, scope: &OptionScope) -> anyhow::Result<Vec<Value>> {
        let mut values: Vec<Value> = Vec::new();
        for row in self.rows.iter().filter(|row| scope.admits(row)) {
            if let Some(value) = record_attribute(row, column) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        Ok(values)
    }
}

/// Custom view that cannot be duplicated.
#[derive(Debug)]
pub struct PinnedView;

impl CustomView for PinnedView {
    fn kind(&self) -> &str {
        "pinned"
    }

    fn extract(&self, record: &Record, attribute: &str) -> anyhow::Result<Value> {
        Ok(record_attribute(record, attribute).cloned().unwrap_or_else(|| json!("pinned")))
    }

    fn try_isolate(&self) -> Option<Arc<dyn CustomView>> {
        None
    }
}

/// Custom view that upper-cases text and isolates freely.
#[derive(Debug)]
pub struct UppercaseView;

impl CustomView for UppercaseView {
    fn kind(&self) -> &str {
        "uppercase"
    }

    fn extract(&self, record: &Record, attribute: &str) -> anyhow::Result<Value> {
        Ok(match record_attribute(record, attribute) {
            Some(Value::String(text)) => Value::String(text.to_uppercase()),
            Some(other) => other.clone(),
            None => Value::Null,
        })
    }

    fn try_isolate(&self) -> Option<Arc<dyn CustomView>> {
        Some(Arc::new(Self))
    }
}

/// `country` and `city`, where `city` depends on `country` and its
/// update-only callback sets the value `"X"`.
#[must_use]
pub fn address_fields() -> Vec<Arc<FieldConfig>> {
    vec![
        FieldConfig::builder("country").shared(),
        FieldConfig::builder("city")
            .depends_on(["country"])
            .on_change_in(VisibilityContext::Update, |_, _, _| Ok(Some(FieldUpdate::new().with_value("X"))))
            .shared(),
    ]
}

/// Schema named `addresses` holding [`address_fields`].
pub fn address_schema() -> crate::core::Result<ResourceSchema> {
    address_fields()
        .into_iter()
        .try_fold(ResourceSchema::new("addresses"), |schema, field| schema.with_field(field))
}
