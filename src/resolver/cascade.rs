//! Cascade resolution of dependent form fields.
//!
//! When a form field changes, every field listing it in `depends_on` gets its
//! change callback invoked with the current form data. A callback that
//! publishes a new value for its own field counts as a change too, so its
//! dependents run next, and so on until nothing changes.
//!
//! # Rounds
//!
//! Propagation proceeds in rounds. Round 1 evaluates the direct dependents of
//! the changed keys; round *k + 1* evaluates the dependents of fields whose
//! value changed in round *k*. Within a round fields run in topological order
//! (ties broken by definition order) and each field runs at most once. In an
//! acyclic graph the number of rounds is bounded by the longest dependency
//! path, so a chain of any depth settles. The round limit is the larger of
//! [`CascadeResolver::max_rounds`] and the field count; exceeding it reports
//! [`PanelError::CascadeLimitExceeded`] and means the propagation loop itself
//! misbehaved.
//!
//! # Output
//!
//! Updates are merged per field key, attribute by attribute, later rounds
//! overwriting earlier ones. Callbacks returning `None` or an empty
//! [`FieldUpdate`] publish nothing and leave no entry.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::dependency_graph::DependencyGraph;
use crate::config::CascadeConfig;
use crate::constants::DEFAULT_MAX_CASCADE_ROUNDS;
use crate::core::{PanelError, RequestContext, VisibilityContext};
use crate::field::{FieldConfig, FieldUpdate, ResourceSchema};
use crate::form::FormData;

/// Field key → merged update.
pub type CascadeResponse = BTreeMap<String, FieldUpdate>;

/// Incoming dependency-resolution request.
///
/// ```json
/// {"form": {"country": "1"}, "changed": ["country"], "context": "edit", "record_id": "12"}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyRequest {
    /// Form state in any shape accepted by [`FormData::normalize`]
    #[serde(default)]
    pub form: Value,
    /// Keys of the fields the user just changed
    #[serde(default)]
    pub changed: Vec<String>,
    /// Visibility context token (`create`, `update`, `edit`)
    pub context: String,
    /// Record being edited, for update-context cascades
    #[serde(default)]
    pub record_id: Option<String>,
}

/// Resolves cascades over a field-set.
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    max_rounds: usize,
}

impl Default for CascadeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CASCADE_ROUNDS)
    }
}

impl CascadeResolver {
    /// Resolver allowing at least `max_rounds` propagation rounds.
    ///
    /// Field-sets with more fields than `max_rounds` get one round per field.
    #[must_use]
    pub fn new(max_rounds: usize) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
        }
    }

    /// Resolver configured from the `[cascade]` section.
    #[must_use]
    pub fn from_config(config: &CascadeConfig) -> Self {
        Self::new(config.max_rounds)
    }

    /// Configured minimum round limit.
    #[must_use]
    pub const fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Handle a raw request against a resource schema.
    ///
    /// Parses the context token (`"edit"` selects update callbacks), picks the
    /// field-set visible in that context, and runs [`CascadeResolver::resolve`].
    pub fn resolve_request(
        &self,
        schema: &ResourceSchema,
        request: DependencyRequest,
    ) -> Result<CascadeResponse, PanelError> {
        let visibility: VisibilityContext = request.context.parse()?;
        let mut context = RequestContext::new(visibility);
        if let Some(id) = request.record_id {
            context = context.with_record_id(id);
        }

        let fields = schema.field_set(&context);
        let form = FormData::normalize(request.form)?;
        self.resolve(&fields, form, &request.changed, &context)
    }

    /// Resolve the cascade triggered by `changed`.
    ///
    /// Cycle detection runs first; if the field-set has a cycle no callback is
    /// invoked and the error names the cycle.
    pub fn resolve(
        &self,
        fields: &[Arc<FieldConfig>],
        mut form: FormData,
        changed: &[String],
        context: &RequestContext,
    ) -> Result<CascadeResponse, PanelError> {
        let graph = DependencyGraph::build(fields);
        let ranks = graph.topological_ranks()?;
        let visibility = context.visibility();

        let mut updates = CascadeResponse::new();
        let mut pending: BTreeSet<String> =
            changed.iter().filter(|key| graph.has_dependents(key)).cloned().collect();
        let limit = self.round_limit(graph.node_count());
        let mut round = 0;

        tracing::debug!(
            "Resolving cascade for {:?} in {} context ({} fields, {} edges)",
            changed,
            visibility,
            graph.node_count(),
            graph.edge_count()
        );

        while !pending.is_empty() {
            if round == limit {
                let pending: Vec<String> = pending.into_iter().collect();
                tracing::warn!(
                    "Cascade stopped after {} rounds; still changing: {}",
                    round,
                    pending.join(", ")
                );
                return Err(PanelError::CascadeLimitExceeded {
                    rounds: round,
                    pending,
                });
            }
            round += 1;

            let mut dependents: Vec<&Arc<FieldConfig>> =
                pending.iter().flat_map(|key| graph.dependents_of(key)).collect();
            dependents.sort_by_key(|f| ranks.get(f.key()).copied().unwrap_or(usize::MAX));
            dependents.dedup_by(|a, b| a.key() == b.key());

            let mut next = BTreeSet::new();
            for field in dependents {
                let Some(callback) = field.change_callback_for(visibility) else {
                    continue;
                };

                let update = callback(field, &form, context).map_err(|source| {
                    PanelError::CallbackFailed {
                        field: field.key().to_string(),
                        source,
                    }
                })?;
                let Some(update) = update.filter(|u| !u.is_empty()) else {
                    tracing::trace!("Field '{}' published no update", field.key());
                    continue;
                };

                if let Some(value) = &update.value {
                    if form.set(field.key(), value.clone()) && graph.has_dependents(field.key()) {
                        next.insert(field.key().to_string());
                    }
                }

                match updates.get_mut(field.key()) {
                    Some(existing) => existing.merge(update),
                    None => {
                        updates.insert(field.key().to_string(), update);
                    }
                }
            }

            pending = next;
        }

        tracing::debug!("Cascade settled after {} rounds with {} updates", round, updates.len());
        Ok(updates)
    }

    /// Rounds allowed for a field-set of `node_count` fields.
    ///
    /// The longest path through an acyclic graph is shorter than its node
    /// count, so a valid cascade never reaches this limit.
    fn round_limit(&self, node_count: usize) -> usize {
        self.max_rounds.max(node_count)
    }
}
