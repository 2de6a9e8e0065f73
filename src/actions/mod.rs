//! Per-record actions and bulk execution.
//!
//! A bulk action request names its target records and carries a free-form
//! payload. Execution is all-or-nothing over the target set:
//!
//! 1. the action's [`Action::can_run`] gate is checked
//! 2. every target is loaded; one missing identifier fails the request
//! 3. [`Action::execute`] receives the records in requested order

mod loader;

pub use loader::{LoadMode, RecordLoader};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{PanelError, RequestContext};
use crate::store::Record;

/// What an action sees when it runs.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// The request the action was triggered from
    pub request: RequestContext,
    /// Field payload submitted with the action
    pub payload: Map<String, Value>,
}

/// An operation applied to a set of records.
#[async_trait]
pub trait Action: Send + Sync {
    /// Action name, used in errors and logs.
    fn name(&self) -> &str;

    /// Whether the action may run in this context.
    fn can_run(&self, context: &ActionContext) -> bool {
        let _ = context;
        true
    }

    /// Apply the action to `records`.
    async fn execute(&self, context: &ActionContext, records: Vec<Record>) -> anyhow::Result<()>;
}

/// Incoming bulk action request.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkActionRequest {
    /// Target record identifiers, in the order the action should see them
    pub ids: Vec<String>,
    /// Arbitrary field payload
    #[serde(default)]
    pub payload: Map<String, Value>,
}

/// Result of a successful bulk action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    /// Name of the action that ran
    pub action: String,
    /// Number of records it was applied to
    pub affected: usize,
}

/// Run `action` over the records named in `request`.
pub async fn execute_bulk_action(
    action: &dyn Action,
    loader: &RecordLoader,
    request: BulkActionRequest,
    context: RequestContext,
) -> Result<ActionOutcome, PanelError> {
    let context = ActionContext {
        request: context,
        payload: request.payload,
    };

    if !action.can_run(&context) {
        tracing::debug!("Action '{}' refused to run", action.name());
        return Err(PanelError::ActionForbidden {
            action: action.name().to_string(),
        });
    }

    let records = loader.load_all(&request.ids).await?;
    let affected = records.len();

    action.execute(&context, records).await.map_err(|source| PanelError::ActionFailed {
        action: action.name().to_string(),
        source,
    })?;

    tracing::info!("Action '{}' applied to {} records", action.name(), affected);
    Ok(ActionOutcome {
        action: action.name().to_string(),
        affected,
    })
}
