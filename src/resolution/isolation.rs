//! Per-unit isolation of descriptors and request context.
//!
//! Every unit of work resolves against its own descriptor copies so that value
//! extraction in one worker is never visible to another, nor to the schema.
//! Configuration stays shared through the `Arc` inside each descriptor; only
//! the value slot (and any custom view state) is duplicated.

use serde::{Deserialize, Serialize};

use crate::core::{PanelError, RequestContext};
use crate::field::FieldDescriptor;
use crate::store::{Record, record_id};

/// How to handle field-sets containing a descriptor that cannot be duplicated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationPolicy {
    /// Resolve the batch strictly one item at a time over shared working copies
    #[default]
    Sequential,
    /// Refuse the batch with [`PanelError::IsolationUnsupported`]
    Reject,
}

/// How a batch will be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Bounded concurrent workers, one isolated copy per item
    Concurrent,
    /// One item at a time
    Sequential,
}

/// One unit of resolution work: an item with its private field copies and
/// request context.
#[derive(Debug)]
pub struct ResolutionTask {
    /// The data item
    pub item: Record,
    /// Descriptor copies owned by this unit
    pub fields: Vec<FieldDescriptor>,
    /// Request context scoped to this item
    pub context: RequestContext,
}

/// Decide how `fields` can be resolved across several items.
///
/// Fully isolatable field-sets run concurrently. Otherwise the policy decides:
/// `Sequential` degrades to one-at-a-time execution, `Reject` fails naming the
/// first offending field.
pub fn plan(fields: &[FieldDescriptor], policy: IsolationPolicy) -> Result<ExecutionMode, PanelError> {
    let Some(blocker) = fields.iter().find(|f| !f.is_isolatable()) else {
        return Ok(ExecutionMode::Concurrent);
    };

    match policy {
        IsolationPolicy::Reject => Err(PanelError::IsolationUnsupported {
            field: blocker.key().to_string(),
        }),
        IsolationPolicy::Sequential => {
            tracing::warn!(
                "Field '{}' cannot be isolated; resolving this batch sequentially",
                blocker.key()
            );
            Ok(ExecutionMode::Sequential)
        }
    }
}

/// Private copies of `fields` for one concurrent unit.
pub fn isolate_fields(fields: &[FieldDescriptor]) -> Result<Vec<FieldDescriptor>, PanelError> {
    fields
        .iter()
        .map(|field| {
            field.try_isolate().ok_or_else(|| PanelError::IsolationUnsupported {
                field: field.key().to_string(),
            })
        })
        .collect()
}

/// Copies of `fields` for sequential resolution; custom views stay shared.
#[must_use]
pub fn working_copies(fields: &[FieldDescriptor]) -> Vec<FieldDescriptor> {
    fields.iter().map(FieldDescriptor::working_copy).collect()
}

/// Request context scoped to `item`.
///
/// The item's identifier becomes the context's record id so auto-options can
/// narrow to rows owned by this item.
#[must_use]
pub fn isolate_context(context: &RequestContext, item: &Record) -> RequestContext {
    context.for_record(record_id(item))
}

/// Build one task per item, in item order.
pub fn prepare_tasks(
    fields: &[FieldDescriptor],
    items: Vec<Record>,
    context: &RequestContext,
    mode: ExecutionMode,
) -> Result<Vec<ResolutionTask>, PanelError> {
    items
        .into_iter()
        .map(|item| {
            let fields = match mode {
                ExecutionMode::Concurrent => isolate_fields(fields)?,
                ExecutionMode::Sequential => working_copies(fields),
            };
            Ok(ResolutionTask {
                context: isolate_context(context, &item),
                fields,
                item,
            })
        })
        .collect()
}
