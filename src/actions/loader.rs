//! Bulk record loading by identifier.
//!
//! Batched lookups are preferred: one `find_many` query, results re-keyed by
//! identifier and reassembled in the requested order. Providers without batch
//! support get one `find_one` per identifier through the bounded
//! [`OrderedMapper`]. Either way the output follows the request: `[3, 1, 2]`
//! yields `[rec3, rec1, rec2]`, and a repeated identifier yields an independent
//! copy per occurrence.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::PanelError;
use crate::store::{DataProvider, Record, record_id};
use crate::utils::{MapOptions, OrderedMapper};

/// How missing or failing identifiers affect the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Any missing identifier fails the whole load (bulk actions)
    #[default]
    AllOrNothing,
    /// Each identifier succeeds or fails on its own (list rows)
    Partial,
}

/// Loads records from a [`DataProvider`].
#[derive(Clone)]
pub struct RecordLoader {
    provider: Arc<dyn DataProvider>,
    mapper: OrderedMapper,
}

impl std::fmt::Debug for RecordLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLoader")
            .field("batched", &self.provider.supports_batch())
            .field("mapper", &self.mapper)
            .finish()
    }
}

impl RecordLoader {
    /// Loader over `provider`, fanning out per-id lookups with `options.workers`.
    #[must_use]
    pub fn new(provider: Arc<dyn DataProvider>, options: MapOptions) -> Self {
        Self {
            provider,
            mapper: OrderedMapper::new(options),
        }
    }

    /// Load records in either mode.
    ///
    /// `AllOrNothing` returns the first failure as `Err`; `Partial` always
    /// returns one result per identifier.
    pub async fn load(&self, ids: &[String], mode: LoadMode) -> Result<Vec<Result<Record, PanelError>>, PanelError> {
        match mode {
            LoadMode::AllOrNothing => Ok(self.load_all(ids).await?.into_iter().map(Ok).collect()),
            LoadMode::Partial => Ok(self.load_each(ids).await),
        }
    }

    /// Load every record or fail naming the first missing identifier.
    pub async fn load_all(&self, ids: &[String]) -> Result<Vec<Record>, PanelError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        if self.provider.supports_batch() {
            let index = self.fetch_batch(ids).await?;
            return ids.iter().map(|id| pick(&index, id)).collect();
        }

        let provider = Arc::clone(&self.provider);
        self.mapper
            .try_map(ids.to_vec(), move |_, id| find_one(Arc::clone(&provider), id))
            .await
    }

    /// Load each record independently; failures stay in their slot.
    pub async fn load_each(&self, ids: &[String]) -> Vec<Result<Record, PanelError>> {
        if ids.is_empty() {
            return Vec::new();
        }

        if self.provider.supports_batch() {
            match self.fetch_batch(ids).await {
                Ok(index) => return ids.iter().map(|id| pick(&index, id)).collect(),
                Err(error) => {
                    tracing::warn!("Batched lookup failed, loading records one by one: {}", error);
                }
            }
        }

        let provider = Arc::clone(&self.provider);
        self.mapper.map_settled(ids.to_vec(), move |_, id| find_one(Arc::clone(&provider), id)).await
    }

    async fn fetch_batch(&self, ids: &[String]) -> Result<HashMap<String, Record>, PanelError> {
        let mut unique: Vec<String> = ids.to_vec();
        unique.sort();
        unique.dedup();

        let records = self.provider.find_many(&unique).await.map_err(|source| PanelError::StoreError {
            operation: format!("find_many({} ids)", unique.len()),
            source,
        })?;
        tracing::debug!("Batched lookup returned {} of {} records", records.len(), unique.len());

        Ok(records.into_iter().filter_map(|record| record_id(&record).map(|id| (id, record))).collect())
    }
}

fn pick(index: &HashMap<String, Record>, id: &str) -> Result<Record, PanelError> {
    index.get(id).cloned().ok_or_else(|| PanelError::RecordNotFound {
        id: id.to_string(),
    })
}

async fn find_one(provider: Arc<dyn DataProvider>, id: String) -> Result<Record, PanelError> {
    match provider.find_one(&id).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(PanelError::RecordNotFound {
            id,
        }),
        Err(source) => Err(PanelError::StoreError {
            operation: format!("find_one({id})"),
            source,
        }),
    }
}
