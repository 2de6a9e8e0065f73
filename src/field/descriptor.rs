//! Field descriptors: shared configuration plus a private value slot.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::config::FieldConfig;
use super::view::CustomView;
use crate::store::{Record, RelatedCollection};

/// Transient slot holding the value extracted for the record being resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueHolder(Option<Value>);

impl ValueHolder {
    /// Store a freshly extracted value.
    pub fn set(&mut self, value: Value) {
        self.0 = Some(value);
    }

    /// Current value, if one was extracted.
    #[must_use]
    pub const fn get(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    /// Whether a value has been extracted.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.0.is_some()
    }

    /// Empty the slot.
    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// One field as seen by a single resolution unit.
///
/// The configuration is shared; the value holder and the bound relationship
/// handle are private. `FieldDescriptor` is intentionally not `Clone`: copies
/// for concurrent workers go through [`FieldDescriptor::try_isolate`], which
/// refuses descriptors whose custom view cannot be duplicated.
pub struct FieldDescriptor {
    config: Arc<FieldConfig>,
    value: ValueHolder,
    custom: Option<Arc<dyn CustomView>>,
    related: Option<Arc<dyn RelatedCollection>>,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("key", &self.config.key())
            .field("value", &self.value)
            .field("custom", &self.custom)
            .field("related", &self.related.as_ref().map(|r| r.name().to_string()))
            .finish()
    }
}

impl FieldDescriptor {
    /// Wrap a configuration in a descriptor with an empty value slot.
    #[must_use]
    pub fn new(config: Arc<FieldConfig>) -> Self {
        let custom = config.view().as_custom().cloned();
        Self {
            config,
            value: ValueHolder::default(),
            custom,
            related: None,
        }
    }

    /// Shared configuration.
    #[must_use]
    pub const fn config(&self) -> &Arc<FieldConfig> {
        &self.config
    }

    /// Field key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.config.key()
    }

    /// Current value slot.
    #[must_use]
    pub const fn value(&self) -> &ValueHolder {
        &self.value
    }

    /// Whether [`FieldDescriptor::try_isolate`] will succeed.
    #[must_use]
    pub fn is_isolatable(&self) -> bool {
        self.custom.as_ref().is_none_or(|view| view.try_isolate().is_some())
    }

    /// Private copy for one concurrent unit of work.
    ///
    /// Configuration is shared by reference; the value slot starts empty and the
    /// relationship binding is dropped. Returns `None` when the custom view
    /// cannot be duplicated.
    #[must_use]
    pub fn try_isolate(&self) -> Option<Self> {
        let custom = match &self.custom {
            Some(view) => Some(view.try_isolate()?),
            None => None,
        };
        Some(Self {
            config: Arc::clone(&self.config),
            value: ValueHolder::default(),
            custom,
            related: None,
        })
    }

    /// Working copy that shares the custom view instance.
    ///
    /// Only for strictly sequential resolution, where no two units can touch
    /// the shared view at the same time.
    #[must_use]
    pub fn working_copy(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            value: ValueHolder::default(),
            custom: self.custom.clone(),
            related: None,
        }
    }

    /// Attach the related collection handle of a relationship field.
    pub fn bind_related(&mut self, related: Arc<dyn RelatedCollection>) {
        self.related = Some(related);
    }

    /// Bound related collection, if any.
    #[must_use]
    pub fn related(&self) -> Option<&Arc<dyn RelatedCollection>> {
        self.related.as_ref()
    }

    /// Extract this field's value from `record` into the value slot.
    pub fn extract(&mut self, record: &Record) -> anyhow::Result<()> {
        let value = match &self.custom {
            Some(view) => view.extract(record, self.config.attribute())?,
            None => self.config.extract_value(record)?,
        };
        self.value.set(value);
        Ok(())
    }

    /// Serialize the current state.
    #[must_use]
    pub fn serialize(&self) -> SerializedField {
        let kind = match &self.custom {
            Some(view) => view.kind().to_string(),
            None => self.config.view().kind().to_string(),
        };
        let relationship = self.config.view().as_relationship().map(|rel| RelationshipMetadata {
            resource: rel.resource.clone(),
            cardinality: rel.cardinality.as_str(),
        });
        let options = match self.config.view() {
            super::FieldView::Select {
                options,
            } => Some(options.clone()),
            _ => None,
        };

        SerializedField {
            key: self.config.key().to_string(),
            name: self.config.name().to_string(),
            data: self.value.get().cloned().unwrap_or(Value::Null),
            metadata: FieldMetadata {
                view: kind,
                rules: self.config.rules().to_vec(),
                options,
                relationship,
                fields: None,
            },
        }
    }
}

/// Plain presentation structure for one resolved field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedField {
    /// Field key
    pub key: String,
    /// Display name
    pub name: String,
    /// Resolved value
    pub data: Value,
    /// View kind, rules, options, nested fields
    pub metadata: FieldMetadata,
}

/// Metadata attached to a [`SerializedField`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMetadata {
    /// View kind label
    pub view: String,
    /// Validation rules
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
    /// Static or auto-computed option list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    /// Related resource for relationship fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipMetadata>,
    /// Nested sub-fields from a composite display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SerializedField>>,
}

/// Relationship part of [`FieldMetadata`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipMetadata {
    /// Related resource name
    pub resource: String,
    /// Relation shape
    pub cardinality: &'static str,
}
