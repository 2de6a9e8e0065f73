//! Dashboard cards

use anyhow::Result;
use async_trait::async_trait;
use panel_core::core::{RequestContext, VisibilityContext};
use panel_core::panel::Panel;
use panel_core::store::StoreHandle;
use panel_core::test_utils::MemoryCollection;
use panel_core::views::Resolvable;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Counts distinct values of a related collection column.
struct DistinctCount {
    key: String,
    collection: &'static str,
    delay: Duration,
}

#[async_trait]
impl Resolvable for DistinctCount {
    fn key(&self) -> &str {
        &self.key
    }

    async fn resolve(&self, context: &RequestContext, store: &StoreHandle) -> anyhow::Result<Value> {
        tokio::time::sleep(self.delay).await;
        let collection = store
            .get(self.collection)
            .ok_or_else(|| anyhow::anyhow!("collection '{}' is not registered", self.collection))?;
        let values = collection.distinct_values("name", &panel_core::store::OptionScope::All).await?;
        Ok(json!({"count": values.len(), "context": context.visibility().as_str()}))
    }
}

fn card(key: &str, collection: &'static str, delay_ms: u64) -> Arc<dyn Resolvable> {
    Arc::new(DistinctCount {
        key: key.to_string(),
        collection,
        delay: Duration::from_millis(delay_ms),
    })
}

#[tokio::test]
async fn test_dashboard_keeps_declaration_order() -> Result<()> {
    let panel = Panel::default();
    panel.register_collection(Arc::new(MemoryCollection::new(
        "players",
        vec![json!({"name": "Ana"}), json!({"name": "Bo"}), json!({"name": "Ana"})],
    )));

    let cards: Vec<_> = (0..12)
        .map(|i| {
            let collection = if i % 4 == 3 { "ghosts" } else { "players" };
            card(&format!("card-{i}"), collection, (12 - i) as u64)
        })
        .collect();

    let results = panel.resolve_cards(&cards, &RequestContext::new(VisibilityContext::List)).await;

    assert_eq!(results.len(), 12);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.key, format!("card-{i}"));
        if i % 4 == 3 {
            assert_eq!(result.outcome.error(), Some("collection 'ghosts' is not registered"));
        } else {
            assert_eq!(result.outcome.data(), Some(&json!({"count": 2, "context": "list"})));
        }
    }
    Ok(())
}
