//! Single-item field resolution.
//!
//! For each visible field, in definition order:
//!
//! 1. bind the related collection of relationship fields
//! 2. extract the value into the descriptor's value slot
//! 3. serialize to `{key, name, data, metadata}`
//! 4. compute auto-options from the related collection
//! 5. apply the display transform (possibly a composite with nested fields)
//! 6. apply the resolve callback
//!
//! Any failure aborts the whole item. The executor mutates the descriptors it
//! is given, so concurrent callers must hand it isolated copies.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::sync::Arc;

use crate::core::{PanelError, RequestContext};
use crate::field::{CompositeDisplay, DisplayValue, FieldDescriptor, RelationshipView, SerializedField};
use crate::store::{OptionScope, Record, ResourceRegistry, record_id};

/// Serialized fields of one item, in definition order.
///
/// Serializes as a JSON object keyed by field key.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    id: Option<String>,
    fields: Vec<SerializedField>,
}

impl ResolvedRecord {
    /// Identifier of the source item.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Look up a resolved field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SerializedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Resolved fields in definition order.
    #[must_use]
    pub fn fields(&self) -> &[SerializedField] {
        &self.fields
    }

    /// Keys of the resolved fields.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Take the fields out.
    #[must_use]
    pub fn into_fields(self) -> Vec<SerializedField> {
        self.fields
    }
}

impl Serialize for ResolvedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.key, field)?;
        }
        map.end()
    }
}

/// Resolve every field of `item` visible in `context`.
///
/// Invisible fields are omitted from the output, never nulled.
pub async fn resolve_item(
    fields: &mut [FieldDescriptor],
    item: &Record,
    context: &RequestContext,
    registry: &ResourceRegistry,
) -> Result<ResolvedRecord, PanelError> {
    let mut resolved = Vec::with_capacity(fields.len());
    for field in fields.iter_mut() {
        if !field.config().is_visible(context) {
            continue;
        }
        resolved.push(resolve_field(field, item, context, registry).await?);
    }

    let id = record_id(item);
    tracing::trace!("Resolved {} fields for record {:?}", resolved.len(), id);
    Ok(ResolvedRecord {
        id,
        fields: resolved,
    })
}

fn resolve_field<'a>(
    field: &'a mut FieldDescriptor,
    item: &'a Record,
    context: &'a RequestContext,
    registry: &'a ResourceRegistry,
) -> BoxFuture<'a, Result<SerializedField, PanelError>> {
    async move {
        let config = Arc::clone(field.config());
        let key = config.key();

        if let Some(relationship) = config.view().as_relationship() {
            if field.related().is_none() {
                let related =
                    registry.get(&relationship.resource).ok_or_else(|| PanelError::UnknownResource {
                        field: key.to_string(),
                        resource: relationship.resource.clone(),
                    })?;
                field.bind_related(related);
            }
        }

        field.extract(item).map_err(|e| PanelError::resolution(key, "extract", e))?;
        let mut serialized = field.serialize();

        if config.supports_auto_options() {
            if let (Some(relationship), Some(related)) = (config.view().as_relationship(), field.related()) {
                let related = Arc::clone(related);
                let scope = option_scope(relationship, context);
                let options = related
                    .distinct_values(&relationship.display_column, &scope)
                    .await
                    .map_err(|e| PanelError::resolution(key, "auto-options", e))?;
                tracing::trace!("Field '{}' offers {} options", key, options.len());
                serialized.metadata.options = Some(options);
            }
        }

        if let Some(display) = config.display_callback() {
            let shown =
                display(&serialized.data, item).map_err(|e| PanelError::resolution(key, "display transform", e))?;
            serialized = match shown {
                DisplayValue::Plain(value) => SerializedField {
                    data: value,
                    ..serialized
                },
                DisplayValue::Composite(composite) => {
                    compose(serialized, composite, item, context, registry).await?
                }
            };
        }

        if let Some(resolve) = config.resolve_callback() {
            serialized.data = resolve(serialized.data, item, context)
                .map_err(|e| PanelError::resolution(key, "resolve callback", e))?;
        }

        Ok(serialized)
    }
    .boxed()
}

async fn compose(
    outer: SerializedField,
    composite: CompositeDisplay,
    item: &Record,
    context: &RequestContext,
    registry: &ResourceRegistry,
) -> Result<SerializedField, PanelError> {
    let mut nested = Vec::with_capacity(composite.fields.len());
    for config in composite.fields {
        if !config.is_visible(context) {
            continue;
        }
        let mut descriptor = FieldDescriptor::new(config);
        nested.push(resolve_field(&mut descriptor, item, context, registry).await?);
    }

    let mut metadata = outer.metadata;
    metadata.fields = Some(nested);
    Ok(SerializedField {
        key: composite.key.unwrap_or(outer.key),
        name: composite.name.unwrap_or(outer.name),
        data: composite.data.unwrap_or(outer.data),
        metadata,
    })
}

/// Rows of the related collection a relationship may offer.
///
/// Exclusive relations with a back-reference column only offer rows that are
/// unassigned or already owned by the record in context.
fn option_scope(relationship: &RelationshipView, context: &RequestContext) -> OptionScope {
    match (&relationship.foreign_key, relationship.cardinality.is_exclusive()) {
        (Some(foreign_key), true) => OptionScope::UnassignedOrOwnedBy {
            foreign_key: foreign_key.clone(),
            owner: context.record_id().map(str::to_string),
        },
        _ => OptionScope::All,
    }
}
