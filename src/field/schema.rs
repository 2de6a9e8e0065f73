//! Resource schemas: the schema-owned field-set of one resource.

use std::collections::HashSet;
use std::sync::Arc;

use super::config::FieldConfig;
use super::descriptor::FieldDescriptor;
use crate::core::{PanelError, RequestContext};

/// Named resource and its field descriptors, in definition order.
///
/// The descriptors held here are the schema-owned originals. Resolution never
/// writes to them; every request works on copies.
#[derive(Debug)]
pub struct ResourceSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl ResourceSchema {
    /// Empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, rejecting duplicate keys.
    pub fn with_field(mut self, config: impl Into<Arc<FieldConfig>>) -> Result<Self, PanelError> {
        self.add_field(config)?;
        Ok(self)
    }

    /// Append a field, rejecting duplicate keys.
    pub fn add_field(&mut self, config: impl Into<Arc<FieldConfig>>) -> Result<(), PanelError> {
        let config = config.into();
        if self.fields.iter().any(|f| f.key() == config.key()) {
            return Err(PanelError::ConfigError {
                message: format!(
                    "Resource '{}' defines field '{}' more than once",
                    self.name,
                    config.key()
                ),
            });
        }
        self.fields.push(FieldDescriptor::new(config));
        Ok(())
    }

    /// Resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All descriptors, in definition order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptors visible for this request, in definition order.
    pub fn visible_fields<'a>(
        &'a self,
        request: &'a RequestContext,
    ) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.fields.iter().filter(move |f| f.config().is_visible(request))
    }

    /// Configurations of the field-set active for this request.
    #[must_use]
    pub fn field_set(&self, request: &RequestContext) -> Vec<Arc<FieldConfig>> {
        self.visible_fields(request).map(|f| Arc::clone(f.config())).collect()
    }

    /// Keys of all fields, for diagnostics.
    #[must_use]
    pub fn keys(&self) -> HashSet<&str> {
        self.fields.iter().map(FieldDescriptor::key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VisibilityContext;

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = ResourceSchema::new("users")
            .with_field(FieldConfig::builder("email").build())
            .and_then(|s| s.with_field(FieldConfig::builder("email").build()))
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_field_set_filters_by_context() {
        let schema = ResourceSchema::new("users")
            .with_field(FieldConfig::builder("email").build())
            .and_then(|s| {
                s.with_field(
                    FieldConfig::builder("password")
                        .only_on(&[VisibilityContext::Create, VisibilityContext::Update])
                        .build(),
                )
            })
            .unwrap();

        let list = schema.field_set(&RequestContext::new(VisibilityContext::List));
        let create = schema.field_set(&RequestContext::new(VisibilityContext::Create));

        assert_eq!(list.iter().map(|f| f.key()).collect::<Vec<_>>(), ["email"]);
        assert_eq!(create.iter().map(|f| f.key()).collect::<Vec<_>>(), ["email", "password"]);
        assert_eq!(schema.keys().len(), 2);
    }
}
