use std::sync::Arc;

use super::{Settled, ViewOptions};
use crate::core::{PanelError, RequestContext};
use crate::field::{FieldDescriptor, ResourceSchema};
use crate::resolution::{
    ExecutionMode, ResolvedRecord, isolate_context, isolate_fields, plan, prepare_tasks, resolve_item,
    working_copies,
};
use crate::store::{Record, ResourceRegistry, StoreHandle};
use crate::utils::OrderedMapper;

/// Resolve a single item against its schema.
///
/// Runs on private copies, so the schema's descriptors are never written.
pub async fn resolve_record(
    schema: &ResourceSchema,
    item: &Record,
    context: &RequestContext,
    registry: &ResourceRegistry,
) -> Result<ResolvedRecord, PanelError> {
    let mut fields = isolate_fields(schema.fields()).unwrap_or_else(|_| working_copies(schema.fields()));
    let context = isolate_context(context, item);
    resolve_item(&mut fields, item, &context, registry).await
}

/// Resolve list rows, one settled entry per row in row order.
///
/// Row failures are embedded. The call itself only fails when the isolation
/// policy rejects the field-set. Only fields visible for `context` take part,
/// so a hidden non-isolatable field never forces sequential mode.
pub async fn resolve_rows(
    schema: &ResourceSchema,
    items: Vec<Record>,
    context: &RequestContext,
    registry: &StoreHandle,
    options: ViewOptions,
) -> Result<Vec<Settled<ResolvedRecord>>, PanelError> {
    let fields: Vec<FieldDescriptor> =
        schema.visible_fields(context).map(FieldDescriptor::working_copy).collect();
    let mode = plan(&fields, options.policy)?;
    let count = items.len();
    let tasks = prepare_tasks(&fields, items, context, mode)?;
    tracing::debug!("Resolving {} rows of '{}' ({:?}, {})", count, schema.name(), mode, options);

    let rows = match mode {
        ExecutionMode::Concurrent => {
            let registry = Arc::clone(registry);
            OrderedMapper::new(options.map_options())
                .map_settled(tasks, move |_, mut task| {
                    let registry = Arc::clone(&registry);
                    async move { resolve_item(&mut task.fields, &task.item, &task.context, &registry).await }
                })
                .await
                .into_iter()
                .map(Settled::from_result)
                .collect::<Vec<_>>()
        }
        ExecutionMode::Sequential => {
            let mut rows = Vec::with_capacity(tasks.len());
            for mut task in tasks {
                let resolved = resolve_item(&mut task.fields, &task.item, &task.context, registry).await;
                rows.push(Settled::from_result(resolved));
            }
            rows
        }
    };

    let failed = rows.iter().filter(|row| !row.is_ok()).count();
    if failed > 0 {
        tracing::warn!("{} of {} rows of '{}' failed to resolve", failed, count, schema.name());
    }
    Ok(rows)
}
