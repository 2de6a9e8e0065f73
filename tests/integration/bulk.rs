//! Bulk loading and bulk actions

use anyhow::Result;
use async_trait::async_trait;
use panel_core::actions::{Action, ActionContext, BulkActionRequest, LoadMode};
use panel_core::core::{PanelError, RequestContext, VisibilityContext};
use panel_core::panel::Panel;
use panel_core::store::{DataProvider, Record};
use panel_core::test_utils::MemoryProvider;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(ToString::to_string).collect()
}

fn records() -> Vec<Record> {
    (1..=5).map(|i| json!({"id": i, "title": format!("rec{i}")})).collect()
}

fn titles(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r["title"].as_str().unwrap_or_default()).collect()
}

#[tokio::test]
async fn test_load_order_and_duplicates() -> Result<()> {
    let panel = Panel::default();
    for batched in [false, true] {
        let provider: Arc<dyn DataProvider> =
            Arc::new(MemoryProvider::new(records()).with_batch(batched).with_latency(Duration::from_millis(1)));
        let loader = panel.loader(provider);

        assert_eq!(titles(&loader.load_all(&ids(&["3", "1", "2"])).await?), ["rec3", "rec1", "rec2"]);
        assert_eq!(titles(&loader.load_all(&ids(&["2", "2", "1"])).await?), ["rec2", "rec2", "rec1"]);

        let err = loader.load_all(&ids(&["4", "77"])).await.unwrap_err();
        assert_eq!(err.to_string(), "not found: id=77");
    }
    Ok(())
}

#[tokio::test]
async fn test_per_id_fallback_is_bounded_and_counted() -> Result<()> {
    let provider = Arc::new(MemoryProvider::new(records()));
    let panel = Panel::new(panel_core::config::PanelConfig::from_toml_str("[mapper]\nmax_workers = 2\n")?);

    let loaded = panel.loader(Arc::clone(&provider) as Arc<dyn DataProvider>).load_all(&ids(&["5", "4", "3"])).await?;

    assert_eq!(titles(&loaded), ["rec5", "rec4", "rec3"]);
    assert_eq!(provider.find_one_calls(), 3);
    assert_eq!(provider.find_many_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_partial_load_captures_store_failures() -> Result<()> {
    let provider = Arc::new(MemoryProvider::new(records()).with_batch(true).with_failure("2"));
    let panel = Panel::default();

    let results = panel.load_records(provider.clone(), &ids(&["1", "2", "9"]), LoadMode::Partial).await?;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().map(|r| r["id"].clone()).ok(), Some(json!(1)));
    assert!(matches!(results[1], Err(PanelError::StoreError { .. })));
    assert!(matches!(results[2], Err(PanelError::RecordNotFound { ref id }) if id == "9"));
    // batch failed once, then every id was looked up on its own
    assert_eq!(provider.find_many_calls(), 1);
    assert_eq!(provider.find_one_calls(), 3);

    let err = panel.load_records(provider, &ids(&["1", "2"]), LoadMode::AllOrNothing).await.unwrap_err();
    assert!(matches!(err, PanelError::StoreError { .. }));
    Ok(())
}

struct Publish {
    published: Mutex<Vec<Value>>,
}

#[async_trait]
impl Action for Publish {
    fn name(&self) -> &str {
        "publish"
    }

    fn can_run(&self, context: &ActionContext) -> bool {
        context.request.visibility() == VisibilityContext::List
    }

    async fn execute(&self, context: &ActionContext, records: Vec<Record>) -> anyhow::Result<()> {
        let channel = context.payload.get("channel").cloned().unwrap_or(Value::Null);
        let mut published = self.published.lock().map_err(|_| anyhow::anyhow!("lock poisoned"))?;
        for record in records {
            published.push(json!({"id": record["id"], "channel": channel}));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_bulk_action_end_to_end() -> Result<()> {
    let panel = Panel::default();
    let provider: Arc<dyn DataProvider> = Arc::new(MemoryProvider::new(records()).with_batch(true));
    let action = Publish {
        published: Mutex::new(Vec::new()),
    };
    let request: BulkActionRequest =
        serde_json::from_value(json!({"ids": ["2", "5"], "payload": {"channel": "web"}}))?;

    let outcome = panel
        .execute_bulk_action(&action, Arc::clone(&provider), request, RequestContext::new(VisibilityContext::List))
        .await?;

    assert_eq!(serde_json::to_value(&outcome)?, json!({"action": "publish", "affected": 2}));
    assert_eq!(
        *action.published.lock().unwrap(),
        vec![json!({"id": 2, "channel": "web"}), json!({"id": 5, "channel": "web"})]
    );

    let missing: BulkActionRequest = serde_json::from_value(json!({"ids": ["2", "8"]}))?;
    let err = panel
        .execute_bulk_action(&action, Arc::clone(&provider), missing, RequestContext::new(VisibilityContext::List))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "not found: id=8");
    assert_eq!(action.published.lock().unwrap().len(), 2);

    let forbidden: BulkActionRequest = serde_json::from_value(json!({"ids": ["2"]}))?;
    let err = panel
        .execute_bulk_action(&action, provider, forbidden, RequestContext::new(VisibilityContext::Detail))
        .await
        .unwrap_err();
    assert!(matches!(err, PanelError::ActionForbidden { .. }));
    Ok(())
}
