//! Data-store collaborators.
//!
//! The engine never talks to a database directly. It consumes three
//! capabilities implemented by the embedding application:
//!
//! - [`DataProvider`]: record lookup by identifier, batched where supported
//! - [`RelatedCollection`]: distinct display values of a related resource,
//!   used by auto-options
//! - [`ResourceRegistry`]: name → related collection map shared by all workers
//!   (the store handle passed to dashboard cards)
//!
//! Records are opaque JSON objects. Their identifier is the `id` attribute.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Opaque data item.
pub type Record = Value;

/// Identifier of a record: its `id` attribute rendered as a string.
///
/// Numbers and strings are accepted; anything else has no identifier.
#[must_use]
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Look up a possibly dotted attribute path (`"address.city"`).
#[must_use]
pub fn record_attribute<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, segment| current.get(segment))
}

/// Record lookup capability.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Load one record; `Ok(None)` when it does not exist.
    async fn find_one(&self, id: &str) -> anyhow::Result<Option<Record>>;

    /// Whether [`DataProvider::find_many`] is implemented.
    fn supports_batch(&self) -> bool {
        false
    }

    /// Load every existing record among `ids` in one query.
    ///
    /// Order and duplicates of the result do not matter; callers re-key by
    /// [`record_id`].
    async fn find_many(&self, ids: &[String]) -> anyhow::Result<Vec<Record>> {
        let _ = ids;
        anyhow::bail!("batched lookup is not supported by this provider")
    }
}

/// Which rows of a related collection may be offered as options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionScope {
    /// Every row
    All,
    /// Rows whose `foreign_key` is unset or equals `owner`
    UnassignedOrOwnedBy {
        /// Back-reference column on the related rows
        foreign_key: String,
        /// Identifier of the record being edited; `None` while creating
        owner: Option<String>,
    },
}

impl OptionScope {
    /// Whether a related row falls inside this scope.
    #[must_use]
    pub fn admits(&self, row: &Record) -> bool {
        match self {
            Self::All => true,
            Self::UnassignedOrOwnedBy {
                foreign_key,
                owner,
            } => match row.get(foreign_key.as_str()) {
                None | Some(Value::Null) => true,
                Some(current) => {
                    let current = match current {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    owner.as_deref() == Some(current.as_str())
                }
            },
        }
    }
}

/// Related collection capability used by relationship fields.
#[async_trait]
pub trait RelatedCollection: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Distinct values of `column` among rows admitted by `scope`.
    async fn distinct_values(&self, column: &str, scope: &OptionScope) -> anyhow::Result<Vec<Value>>;
}

/// Thread-safe registry of related collections.
///
/// Shared by every worker of a batch; lookups never block each other.
#[derive(Default)]
pub struct ResourceRegistry {
    collections: DashMap<String, Arc<dyn RelatedCollection>>,
}

/// Shared store handle passed to resolvable cards.
pub type StoreHandle = Arc<ResourceRegistry>;

impl ResourceRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection under its own name, replacing any previous one.
    pub fn register(&self, collection: Arc<dyn RelatedCollection>) {
        let name = collection.name().to_string();
        tracing::debug!("Registering related collection '{}'", name);
        self.collections.insert(name, collection);
    }

    /// Look up a collection by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn RelatedCollection>> {
        self.collections.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("ResourceRegistry").field("collections", &names).finish()
    }
}
