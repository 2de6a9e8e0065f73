//! Field view kinds and their capabilities.
//!
//! A view describes how a field's raw value is read from a record and presented.
//! The set is closed ([`FieldView`]); code that needs relationship or
//! auto-options behavior asks for the capability ([`FieldView::as_relationship`])
//! instead of comparing kind names.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::store::Record;

/// How a relationship field relates to the owning record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// The related row stores this record's id (one related row at most).
    HasOne,
    /// The related rows store this record's id.
    HasMany,
    /// This record stores the related row's id.
    BelongsTo,
    /// A join table links both sides.
    ManyToMany,
}

impl Cardinality {
    /// Whether each related row can belong to at most one owner.
    ///
    /// Auto-options for such relations only offer rows that are unassigned or
    /// already owned by the current record.
    #[must_use]
    pub const fn is_exclusive(self) -> bool {
        matches!(self, Self::HasOne | Self::HasMany)
    }

    /// Short lowercase label used in serialized metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::BelongsTo => "belongs_to",
            Self::ManyToMany => "many_to_many",
        }
    }
}

/// Cross-reference to another registered resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipView {
    /// Name of the related collection in the [`crate::store::ResourceRegistry`].
    pub resource: String,
    /// Relation shape.
    pub cardinality: Cardinality,
    /// Column of the related collection shown to users and offered as options.
    pub display_column: String,
    /// Column on the related collection pointing back at the owner, for
    /// exclusive relations.
    pub foreign_key: Option<String>,
}

impl RelationshipView {
    /// Relationship to `resource`, displaying its `name` column.
    pub fn new(resource: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            resource: resource.into(),
            cardinality,
            display_column: "name".to_string(),
            foreign_key: None,
        }
    }

    /// Override the displayed column.
    #[must_use]
    pub fn display_column(mut self, column: impl Into<String>) -> Self {
        self.display_column = column.into();
        self
    }

    /// Set the back-reference column used to narrow exclusive relations.
    #[must_use]
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }
}

/// Application-defined view.
///
/// Custom views may carry their own state. Implementations that can hand out
/// an independent copy return it from [`CustomView::try_isolate`]; those that
/// cannot return `None`, which makes field-sets containing them subject to
/// [`crate::resolution::IsolationPolicy`].
pub trait CustomView: fmt::Debug + Send + Sync {
    /// Kind label reported in serialized metadata.
    fn kind(&self) -> &str;

    /// Read the field value from a record.
    fn extract(&self, record: &Record, attribute: &str) -> anyhow::Result<Value>;

    /// Produce a private instance for one concurrent unit of work.
    fn try_isolate(&self) -> Option<Arc<dyn CustomView>>;
}

/// Closed set of field kinds.
#[derive(Debug, Clone)]
pub enum FieldView {
    /// Free text, value passed through unchanged
    Text,
    /// Numeric value; numeric strings are coerced
    Number,
    /// Boolean value; `"true"`/`"false"`/`0`/`1` are coerced
    Boolean,
    /// Fixed option list
    Select {
        /// Allowed values
        options: Vec<Value>,
    },
    /// Cross-reference to another resource
    Relationship(RelationshipView),
    /// Application-defined view
    Custom(Arc<dyn CustomView>),
}

impl FieldView {
    /// Kind label used in serialized metadata.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select { .. } => "select",
            Self::Relationship(_) => "relationship",
            Self::Custom(view) => view.kind(),
        }
    }

    /// Relationship capability.
    #[must_use]
    pub const fn as_relationship(&self) -> Option<&RelationshipView> {
        match self {
            Self::Relationship(rel) => Some(rel),
            _ => None,
        }
    }

    /// Custom view capability.
    #[must_use]
    pub fn as_custom(&self) -> Option<&Arc<dyn CustomView>> {
        match self {
            Self::Custom(view) => Some(view),
            _ => None,
        }
    }

    /// Coerce an extracted raw value into this view's representation.
    pub(crate) fn coerce(&self, raw: Value) -> anyhow::Result<Value> {
        match self {
            Self::Number => match raw {
                Value::String(s) if !s.trim().is_empty() => {
                    let parsed: f64 = s
                        .trim()
                        .parse()
                        .map_err(|_| anyhow::anyhow!("expected a number, found '{s}'"))?;
                    Ok(number_value(parsed))
                }
                Value::String(_) => Ok(Value::Null),
                Value::Number(_) | Value::Null => Ok(raw),
                other => anyhow::bail!("expected a number, found {other}"),
            },
            Self::Boolean => match raw {
                Value::Bool(_) | Value::Null => Ok(raw),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                    "false" | "0" | "no" | "off" | "" => Ok(Value::Bool(false)),
                    _ => anyhow::bail!("expected a boolean, found '{s}'"),
                },
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Value::Bool(false)),
                    Some(1) => Ok(Value::Bool(true)),
                    _ => anyhow::bail!("expected a boolean, found {n}"),
                },
                other => anyhow::bail!("expected a boolean, found {other}"),
            },
            _ => Ok(raw),
        }
    }
}

fn number_value(parsed: f64) -> Value {
    if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
        Value::from(parsed as i64)
    } else {
        serde_json::Number::from_f64(parsed).map_or(Value::Null, Value::Number)
    }
}
