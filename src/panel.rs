//! Engine facade.
//!
//! [`Panel`] owns the configuration and the shared registry of related
//! collections, and exposes every operation with those settings applied.

use std::sync::Arc;

use crate::actions::{self, Action, ActionOutcome, BulkActionRequest, LoadMode, RecordLoader};
use crate::config::PanelConfig;
use crate::core::{PanelError, RequestContext};
use crate::field::ResourceSchema;
use crate::resolution::ResolvedRecord;
use crate::resolver::{CascadeResolver, CascadeResponse, DependencyRequest};
use crate::store::{DataProvider, Record, RelatedCollection, ResourceRegistry, StoreHandle};
use crate::utils::MapOptions;
use crate::views::{self, CardResult, Resolvable, Settled, ViewOptions};

/// Configured panel engine.
#[derive(Debug, Clone)]
pub struct Panel {
    config: PanelConfig,
    registry: StoreHandle,
    cascade: CascadeResolver,
}

impl Default for Panel {
    fn default() -> Self {
        Self::new(PanelConfig::default())
    }
}

impl Panel {
    /// Engine with an empty registry.
    #[must_use]
    pub fn new(config: PanelConfig) -> Self {
        Self::with_registry(config, Arc::new(ResourceRegistry::new()))
    }

    /// Engine sharing an existing registry.
    #[must_use]
    pub fn with_registry(config: PanelConfig, registry: StoreHandle) -> Self {
        let cascade = CascadeResolver::from_config(&config.cascade);
        Self {
            config,
            registry,
            cascade,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Shared store handle.
    #[must_use]
    pub const fn registry(&self) -> &StoreHandle {
        &self.registry
    }

    /// Make a related collection available to relationship fields.
    pub fn register_collection(&self, collection: Arc<dyn RelatedCollection>) {
        self.registry.register(collection);
    }

    /// Resolve dependent fields after a form change.
    pub fn resolve_dependencies(
        &self,
        schema: &ResourceSchema,
        request: DependencyRequest,
    ) -> Result<CascadeResponse, PanelError> {
        self.cascade.resolve_request(schema, request)
    }

    /// Resolve one record.
    pub async fn resolve_record(
        &self,
        schema: &ResourceSchema,
        item: &Record,
        context: &RequestContext,
    ) -> Result<ResolvedRecord, PanelError> {
        views::resolve_record(schema, item, context, &self.registry).await
    }

    /// Resolve list rows in row order.
    pub async fn resolve_rows(
        &self,
        schema: &ResourceSchema,
        items: Vec<Record>,
        context: &RequestContext,
    ) -> Result<Vec<Settled<ResolvedRecord>>, PanelError> {
        views::resolve_rows(schema, items, context, &self.registry, self.view_options()).await
    }

    /// Resolve dashboard cards in declaration order.
    pub async fn resolve_cards(&self, cards: &[Arc<dyn Resolvable>], context: &RequestContext) -> Vec<CardResult> {
        views::resolve_cards(cards, context, &self.registry, self.map_options()).await
    }

    /// Record loader over `provider` using the configured worker cap.
    #[must_use]
    pub fn loader(&self, provider: Arc<dyn DataProvider>) -> RecordLoader {
        RecordLoader::new(provider, self.map_options())
    }

    /// Load records by identifier.
    pub async fn load_records(
        &self,
        provider: Arc<dyn DataProvider>,
        ids: &[String],
        mode: LoadMode,
    ) -> Result<Vec<Result<Record, PanelError>>, PanelError> {
        self.loader(provider).load(ids, mode).await
    }

    /// Run a bulk action over the records named in `request`.
    pub async fn execute_bulk_action(
        &self,
        action: &dyn Action,
        provider: Arc<dyn DataProvider>,
        request: BulkActionRequest,
        context: RequestContext,
    ) -> Result<ActionOutcome, PanelError> {
        actions::execute_bulk_action(action, &self.loader(provider), request, context).await
    }

    fn map_options(&self) -> MapOptions {
        MapOptions::new(self.config.mapper.max_workers)
    }

    fn view_options(&self) -> ViewOptions {
        ViewOptions::from(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryCollection, MemoryProvider, address_schema};
    use serde_json::json;

    #[test]
    fn test_cascade_uses_configured_round_cap() {
        let config = PanelConfig::from_toml_str("[cascade]\nmax_rounds = 3\n").unwrap();
        let panel = Panel::new(config);
        assert_eq!(panel.cascade.max_rounds(), 3);

        let request: DependencyRequest =
            serde_json::from_value(json!({"form": {"country": "1"}, "changed": ["country"], "context": "edit"}))
                .unwrap();
        let updates = panel.resolve_dependencies(&address_schema().unwrap(), request).unwrap();
        assert_eq!(serde_json::to_value(updates).unwrap(), json!({"city": {"value": "X"}}));
    }

    #[tokio::test]
    async fn test_registered_collections_are_shared() {
        let panel = Panel::default();
        panel.register_collection(Arc::new(MemoryCollection::new("tags", vec![])));
        assert!(panel.registry().get("tags").is_some());
    }

    #[tokio::test]
    async fn test_load_records_partial() {
        let panel = Panel::default();
        let provider = Arc::new(MemoryProvider::new(vec![json!({"id": 1})]));
        let ids = vec!["1".to_string(), "2".to_string()];

        let results = panel.load_records(provider, &ids, LoadMode::Partial).await.unwrap();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
