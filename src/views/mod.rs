//! Presentation surfaces built on the executor and the mapper.
//!
//! - [`resolve_record`]: one item, detail or edit page
//! - [`resolve_rows`]: list view, one settled entry per row
//! - [`resolve_cards`]: dashboard cards, in declaration order
//!
//! List and card responses embed per-item failures as `{"error": "..."}`
//! instead of failing the response.

mod cards;
mod rows;

pub use cards::{CardResult, Resolvable, resolve_cards};
pub use rows::{resolve_record, resolve_rows};

use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;

use crate::config::PanelConfig;
use crate::resolution::IsolationPolicy;
use crate::utils::MapOptions;

/// Outcome of one item of a settled batch.
///
/// Serializes as `{"data": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Settled<T> {
    /// The item resolved
    Data {
        /// Resolved payload
        data: T,
    },
    /// The item failed; siblings were unaffected
    Error {
        /// Error message including its causes
        error: String,
    },
}

impl<T> Settled<T> {
    /// Settle a result, rendering the error with its source chain.
    pub fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: StdError,
    {
        match result {
            Ok(data) => Self::Data {
                data,
            },
            Err(error) => Self::Error {
                error: describe(&error),
            },
        }
    }

    /// Whether the item resolved.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// Resolved payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Data {
                data,
            } => Some(data),
            Self::Error { .. } => None,
        }
    }

    /// Error message, if the item failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Data { .. } => None,
            Self::Error {
                error,
            } => Some(error),
        }
    }
}

fn describe(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Batch settings for list and card resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Worker cap for concurrent resolution
    pub workers: usize,
    /// What to do when descriptors cannot be isolated
    pub policy: IsolationPolicy,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self::from(&PanelConfig::default())
    }
}

impl From<&PanelConfig> for ViewOptions {
    fn from(config: &PanelConfig) -> Self {
        Self {
            workers: config.mapper.max_workers,
            policy: config.isolation.policy,
        }
    }
}

impl ViewOptions {
    pub(crate) const fn map_options(self) -> MapOptions {
        MapOptions::new(self.workers)
    }
}

impl fmt::Display for ViewOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workers={}, isolation={:?}", self.workers, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PanelError;
    use serde_json::json;

    #[test]
    fn test_settled_shapes() {
        let ok: Settled<i32> = Settled::from_result(Ok::<_, PanelError>(3));
        let failed: Settled<i32> = Settled::from_result(Err(PanelError::RecordNotFound {
            id: "4".into(),
        }));

        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"data": 3}));
        assert_eq!(serde_json::to_value(&failed).unwrap(), json!({"error": "not found: id=4"}));
        assert!(ok.is_ok());
        assert_eq!(failed.error(), Some("not found: id=4"));
    }

    #[test]
    fn test_error_message_includes_causes() {
        let error = PanelError::resolution("price", "display transform", anyhow::anyhow!("bad currency"));
        let settled: Settled<()> = Settled::from_result(Err(error));
        assert_eq!(
            settled.error(),
            Some("Failed to resolve field 'price': display transform: bad currency")
        );
    }
}
