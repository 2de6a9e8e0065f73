//! Form data normalization.
//!
//! Clients submit form state in one of three shapes, all normalized to a flat
//! map of field key → raw value:
//!
//! ```json
//! {"country": "1", "city": null}
//! {"country": {"key": "country", "type": "select", "data": "1"}}
//! {"fields": [{"key": "country", "type": "select", "data": "1"}], "meta": {"page": 2}}
//! ```
//!
//! `meta` is discarded. A top-level `fields` array is read as the nested shape
//! only when `meta` sits next to it or every entry is an object with a string
//! `key`; otherwise it is a flat field that happens to be named `fields`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::PanelError;

/// Flat map of field key → raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormData(Map<String, Value>);

impl FormData {
    /// Normalize any accepted payload shape.
    ///
    /// `null` yields an empty form. Anything that is neither an object nor
    /// `null` is rejected.
    pub fn normalize(raw: Value) -> Result<Self, PanelError> {
        let object = match raw {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(PanelError::InvalidFormData {
                    reason: format!("expected an object, found {}", type_name(&other)),
                });
            }
        };

        if is_fields_shape(&object) {
            return Self::flatten_fields(object);
        }

        Ok(Self(object.into_iter().map(|(key, value)| (key, unwrap_envelope(value))).collect()))
    }

    fn flatten_fields(mut object: Map<String, Value>) -> Result<Self, PanelError> {
        let Some(Value::Array(entries)) = object.remove("fields") else {
            return Err(PanelError::InvalidFormData {
                reason: "'fields' must be an array".to_string(),
            });
        };

        let mut flat = Map::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let Value::Object(mut entry) = entry else {
                return Err(PanelError::InvalidFormData {
                    reason: format!("fields[{index}] is not an object"),
                });
            };
            let Some(Value::String(key)) = entry.remove("key") else {
                return Err(PanelError::InvalidFormData {
                    reason: format!("fields[{index}].key must be a string"),
                });
            };
            let data = entry.remove("data").map_or(Value::Null, unwrap_envelope);
            flat.insert(key, data);
        }
        Ok(Self(flat))
    }

    /// Wrap an already flat map.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether storing `value` under `key` would change the form.
    #[must_use]
    pub fn changed_value(&self, key: &str, value: &Value) -> bool {
        self.0.get(key) != Some(value)
    }

    /// Set a field value; returns `true` when the stored value changed.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        if !self.changed_value(key, &value) {
            return false;
        }
        self.0.insert(key.to_string(), value);
        true
    }

    /// Whether a field key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the form is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn is_fields_shape(object: &Map<String, Value>) -> bool {
    let Some(Value::Array(entries)) = object.get("fields") else {
        return false;
    };
    if !object.keys().all(|k| k == "fields" || k == "meta") {
        return false;
    }
    object.contains_key("meta") || (!entries.is_empty() && entries.iter().all(is_keyed_entry))
}

fn is_keyed_entry(entry: &Value) -> bool {
    matches!(entry.get("key"), Some(Value::String(_)))
}

fn is_envelope(object: &Map<String, Value>) -> bool {
    object.contains_key("key") && object.contains_key("type") && object.contains_key("data")
}

fn unwrap_envelope(value: Value) -> Value {
    let mut current = value;
    loop {
        match current {
            Value::Object(mut object) if is_envelope(&object) => {
                current = object.remove("data").unwrap_or(Value::Null);
            }
            other => return other,
        }
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
