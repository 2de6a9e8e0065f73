//! Tri-state field mutations produced by change callbacks.

use serde::Serialize;
use serde_json::Value;

/// Mutation a change callback publishes for one field.
///
/// Every attribute is either unset (`None`, "no opinion") or an explicit
/// value. Unset attributes are omitted when serialized, so
/// `FieldUpdate::new().with_value("X")` renders as `{"value":"X"}`.
/// `Some(Value::Null)` is an explicit request to clear the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldUpdate {
    /// Show or hide the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Enable or disable editing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Mark the field as required or optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Replace the field value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldUpdate {
    /// An update with every attribute unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the visibility attribute.
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Set the enabled attribute.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the required attribute.
    #[must_use]
    pub const fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Set the value attribute.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// `true` when no attribute is set.
    ///
    /// An empty update publishes nothing and is treated exactly like a
    /// callback that returned no update at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.visible.is_none()
            && self.enabled.is_none()
            && self.required.is_none()
            && self.value.is_none()
    }

    /// Overlay `later` onto `self`; attributes set in `later` win.
    pub fn merge(&mut self, later: Self) {
        if later.visible.is_some() {
            self.visible = later.visible;
        }
        if later.enabled.is_some() {
            self.enabled = later.enabled;
        }
        if later.required.is_some() {
            self.required = later.required;
        }
        if later.value.is_some() {
            self.value = later.value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_attributes_are_omitted() {
        let update = FieldUpdate::new().with_value("X");
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"value": "X"}));
    }

    #[test]
    fn test_explicit_null_is_kept() {
        let update = FieldUpdate::new().with_value(Value::Null);
        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"value": null}));
    }

    #[test]
    fn test_merge_later_wins_per_attribute() {
        let mut first = FieldUpdate::new().with_visible(false).with_value(1);
        first.merge(FieldUpdate::new().with_value(2).with_required(true));

        assert_eq!(first.visible, Some(false));
        assert_eq!(first.required, Some(true));
        assert_eq!(first.value, Some(json!(2)));
        assert_eq!(first.enabled, None);
    }
}
