use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::Settled;
use crate::core::RequestContext;
use crate::store::StoreHandle;
use crate::utils::{MapOptions, OrderedMapper};

/// A dashboard card (metric, chart, widget) that computes its own payload.
#[async_trait]
pub trait Resolvable: Send + Sync {
    /// Card key, echoed in the response.
    fn key(&self) -> &str;

    /// Compute the card payload.
    async fn resolve(&self, context: &RequestContext, store: &StoreHandle) -> anyhow::Result<Value>;
}

/// One card of a dashboard response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardResult {
    /// Card key
    pub key: String,
    /// Payload or error
    #[serde(flatten)]
    pub outcome: Settled<Value>,
}

/// Resolve every card concurrently, in declaration order.
///
/// A failing card carries its error; the others are unaffected.
pub async fn resolve_cards(
    cards: &[Arc<dyn Resolvable>],
    context: &RequestContext,
    store: &StoreHandle,
    options: MapOptions,
) -> Vec<CardResult> {
    let keys: Vec<String> = cards.iter().map(|card| card.key().to_string()).collect();
    let context = context.clone();
    let store = Arc::clone(store);

    let outcomes = OrderedMapper::new(options)
        .map_settled(cards.to_vec(), move |_, card| {
            let context = context.clone();
            let store = Arc::clone(&store);
            async move { card.resolve(&context, &store).await }
        })
        .await;

    keys.into_iter()
        .zip(outcomes)
        .map(|(key, outcome)| {
            let outcome = match outcome {
                Ok(data) => Settled::Data {
                    data,
                },
                Err(error) => {
                    tracing::debug!("Card '{}' failed: {:#}", key, error);
                    Settled::Error {
                        error: format!("{error:#}"),
                    }
                }
            };
            CardResult {
                key,
                outcome,
            }
        })
        .collect()
}
