//! Immutable field configuration.
//!
//! A [`FieldConfig`] holds everything about a field that does not change
//! between requests: key, view, dependencies, callbacks, rules. It is shared
//! behind an [`Arc`] by every [`super::FieldDescriptor`] created from it, so
//! workers resolving different records read the same configuration without
//! copying callbacks.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::update::FieldUpdate;
use super::view::FieldView;
use crate::core::{RequestContext, VisibilityContext};
use crate::form::FormData;
use crate::store::{Record, record_attribute};

/// Callback run when one of a field's dependencies changes.
///
/// Returning `Ok(None)` or an empty [`FieldUpdate`] publishes nothing.
pub type ChangeCallback = Arc<
    dyn Fn(&FieldConfig, &FormData, &RequestContext) -> anyhow::Result<Option<FieldUpdate>>
        + Send
        + Sync,
>;

/// Extra visibility predicate evaluated after the context check.
pub type VisibilityPredicate = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// Display transform applied to the extracted value.
pub type DisplayCallback =
    Arc<dyn Fn(&Value, &Record) -> anyhow::Result<DisplayValue> + Send + Sync>;

/// Final override of the serialized value, with full record and request access.
pub type ResolveCallback =
    Arc<dyn Fn(Value, &Record, &RequestContext) -> anyhow::Result<Value> + Send + Sync>;

/// Which visibility context a change callback is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackScope {
    /// Runs in every context without a more specific callback
    Any,
    /// Runs only in the given context, taking priority over [`CallbackScope::Any`]
    Only(VisibilityContext),
}

/// Result of a display transform.
#[derive(Debug, Clone)]
pub enum DisplayValue {
    /// Replace the value
    Plain(Value),
    /// Replace the field with a composite carrying nested sub-fields
    Composite(CompositeDisplay),
}

/// Composite display produced by a transform.
///
/// Missing `key`, `name`, or `data` are taken from the outer field. Nested
/// fields are resolved against the same record.
#[derive(Debug, Clone, Default)]
pub struct CompositeDisplay {
    /// Override of the outer key
    pub key: Option<String>,
    /// Override of the outer name
    pub name: Option<String>,
    /// Override of the outer value
    pub data: Option<Value>,
    /// Sub-fields serialized under `metadata.fields`
    pub fields: Vec<Arc<FieldConfig>>,
}

/// Immutable configuration of one field.
pub struct FieldConfig {
    pub(crate) key: String,
    pub(crate) name: String,
    pub(crate) attribute: String,
    pub(crate) view: FieldView,
    pub(crate) depends_on: Vec<String>,
    pub(crate) change_callbacks: Vec<(CallbackScope, ChangeCallback)>,
    pub(crate) contexts: Vec<VisibilityContext>,
    pub(crate) visible_when: Option<VisibilityPredicate>,
    pub(crate) rules: Vec<String>,
    pub(crate) auto_options: bool,
    pub(crate) display: Option<DisplayCallback>,
    pub(crate) resolve: Option<ResolveCallback>,
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("key", &self.key)
            .field("view", &self.view.kind())
            .field("depends_on", &self.depends_on)
            .field("contexts", &self.contexts)
            .field("callbacks", &self.change_callbacks.len())
            .field("rules", &self.rules)
            .field("auto_options", &self.auto_options)
            .finish_non_exhaustive()
    }
}

impl FieldConfig {
    /// Start building a field with the given key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use panel_core::field::{FieldConfig, FieldUpdate};
    /// use panel_core::core::VisibilityContext;
    ///
    /// let city = FieldConfig::builder("city")
    ///     .depends_on(["country"])
    ///     .on_change_in(VisibilityContext::Update, |_, form, _| {
    ///         Ok(form.get("country").map(|_| FieldUpdate::new().with_value("X")))
    ///     })
    ///     .build();
    /// assert_eq!(city.depends_on(), ["country"]);
    /// ```
    pub fn builder(key: impl Into<String>) -> FieldConfigBuilder {
        FieldConfigBuilder::new(key)
    }

    /// Field key, unique within a field-set.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record attribute path the value is read from.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// View kind.
    #[must_use]
    pub const fn view(&self) -> &FieldView {
        &self.view
    }

    /// Keys of the fields this one depends on.
    #[must_use]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Validation rules, carried through to serialized metadata.
    #[must_use]
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Whether the field computes its option list from a related collection.
    #[must_use]
    pub fn supports_auto_options(&self) -> bool {
        self.auto_options && self.view.as_relationship().is_some()
    }

    /// Whether any change callback is registered.
    #[must_use]
    pub fn has_change_callback(&self) -> bool {
        !self.change_callbacks.is_empty()
    }

    /// Pick the change callback for `context`.
    ///
    /// A callback registered for exactly this context wins over a generic one.
    #[must_use]
    pub fn change_callback_for(&self, context: VisibilityContext) -> Option<&ChangeCallback> {
        self.change_callbacks
            .iter()
            .find(|(scope, _)| *scope == CallbackScope::Only(context))
            .or_else(|| self.change_callbacks.iter().find(|(scope, _)| *scope == CallbackScope::Any))
            .map(|(_, callback)| callback)
    }

    /// Whether the field is shown for this request.
    #[must_use]
    pub fn is_visible(&self, request: &RequestContext) -> bool {
        if !self.contexts.contains(&request.visibility()) {
            return false;
        }
        self.visible_when.as_ref().is_none_or(|predicate| predicate(request))
    }

    pub(crate) fn display_callback(&self) -> Option<&DisplayCallback> {
        self.display.as_ref()
    }

    pub(crate) fn resolve_callback(&self) -> Option<&ResolveCallback> {
        self.resolve.as_ref()
    }

    /// Read this field's value from a record.
    ///
    /// Pure: the record and the configuration are left untouched. Missing
    /// attributes yield `null`.
    pub fn extract_value(&self, record: &Record) -> anyhow::Result<Value> {
        match &self.view {
            FieldView::Custom(view) => view.extract(record, &self.attribute),
            view => view.coerce(record_attribute(record, &self.attribute).cloned().unwrap_or(Value::Null)),
        }
    }
}

/// Builder for [`FieldConfig`].
pub struct FieldConfigBuilder {
    config: FieldConfig,
}

impl FieldConfigBuilder {
    fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            config: FieldConfig {
                name: humanize(&key),
                attribute: key.clone(),
                key,
                view: FieldView::Text,
                depends_on: Vec::new(),
                change_callbacks: Vec::new(),
                contexts: VisibilityContext::ALL.to_vec(),
                visible_when: None,
                rules: Vec::new(),
                auto_options: false,
                display: None,
                resolve: None,
            },
        }
    }

    /// Set the display name (defaults to the humanized key).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Read the value from a different (possibly dotted) attribute path.
    #[must_use]
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.config.attribute = attribute.into();
        self
    }

    /// Set the view kind.
    #[must_use]
    pub fn view(mut self, view: FieldView) -> Self {
        self.config.view = view;
        self
    }

    /// Declare the fields this one depends on.
    #[must_use]
    pub fn depends_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.config.depends_on.contains(&key) {
                self.config.depends_on.push(key);
            }
        }
        self
    }

    /// Register a change callback for every context.
    #[must_use]
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FieldConfig, &FormData, &RequestContext) -> anyhow::Result<Option<FieldUpdate>>
            + Send
            + Sync
            + 'static,
    {
        self.config.change_callbacks.push((CallbackScope::Any, Arc::new(callback)));
        self
    }

    /// Register a change callback that only runs in `context`.
    #[must_use]
    pub fn on_change_in<F>(mut self, context: VisibilityContext, callback: F) -> Self
    where
        F: Fn(&FieldConfig, &FormData, &RequestContext) -> anyhow::Result<Option<FieldUpdate>>
            + Send
            + Sync
            + 'static,
    {
        self.config.change_callbacks.push((CallbackScope::Only(context), Arc::new(callback)));
        self
    }

    /// Restrict the field to the given contexts.
    #[must_use]
    pub fn only_on(mut self, contexts: &[VisibilityContext]) -> Self {
        self.config.contexts = contexts.to_vec();
        self
    }

    /// Hide the field in one context.
    #[must_use]
    pub fn hide_on(mut self, context: VisibilityContext) -> Self {
        self.config.contexts.retain(|c| *c != context);
        self
    }

    /// Add a visibility predicate evaluated per request.
    #[must_use]
    pub fn visible_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        self.config.visible_when = Some(Arc::new(predicate));
        self
    }

    /// Attach a validation rule.
    #[must_use]
    pub fn rule(mut self, rule: impl Into<String>) -> Self {
        self.config.rules.push(rule.into());
        self
    }

    /// Compute options from the related collection at resolve time.
    #[must_use]
    pub const fn auto_options(mut self) -> Self {
        self.config.auto_options = true;
        self
    }

    /// Set the display transform.
    #[must_use]
    pub fn display<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Value, &Record) -> anyhow::Result<DisplayValue> + Send + Sync + 'static,
    {
        self.config.display = Some(Arc::new(callback));
        self
    }

    /// Set the final resolve callback.
    #[must_use]
    pub fn resolve<F>(mut self, callback: F) -> Self
    where
        F: Fn(Value, &Record, &RequestContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.config.resolve = Some(Arc::new(callback));
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> FieldConfig {
        self.config
    }

    /// Finish building into a shareable handle.
    #[must_use]
    pub fn shared(self) -> Arc<FieldConfig> {
        Arc::new(self.config)
    }
}

// "created_at" -> "Created at"
fn humanize(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
