//! Request-scoped context shared by cascades and field resolution.
//!
//! A [`RequestContext`] is created once per incoming request and then cloned for
//! every concurrent unit of work (see [`crate::resolution::isolation`]), so a
//! worker can never observe another worker's view of the request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::PanelError;

/// Logical mode a request operates in.
///
/// Selects which fields are visible and which change-callback variant runs.
/// The token `"edit"` is accepted as an alias for [`VisibilityContext::Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityContext {
    /// Creation form for a new record
    Create,
    /// Edit form for an existing record
    #[serde(alias = "edit")]
    Update,
    /// Index/table view
    List,
    /// Read-only detail page
    Detail,
}

impl VisibilityContext {
    /// All contexts, in declaration order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Update, Self::List, Self::Detail];

    /// Canonical lowercase token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::List => "list",
            Self::Detail => "detail",
        }
    }

    /// Whether this context renders a form that can trigger cascades.
    #[must_use]
    pub const fn is_form(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl fmt::Display for VisibilityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilityContext {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" | "edit" => Ok(Self::Update),
            "list" | "index" => Ok(Self::List),
            "detail" | "show" => Ok(Self::Detail),
            _ => Err(PanelError::UnknownVisibilityContext {
                token: s.to_string(),
            }),
        }
    }
}

/// Per-request state handed to callbacks.
///
/// Cheap to clone; every field is owned so clones share nothing mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    visibility: VisibilityContext,
    record_id: Option<String>,
    attributes: Map<String, Value>,
}

impl RequestContext {
    /// Create a context for the given visibility mode.
    #[must_use]
    pub fn new(visibility: VisibilityContext) -> Self {
        Self {
            visibility,
            record_id: None,
            attributes: Map::new(),
        }
    }

    /// Attach the identifier of the record being edited or displayed.
    #[must_use]
    pub fn with_record_id(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(id.into());
        self
    }

    /// Attach an arbitrary request attribute (current user, locale, ...).
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// The visibility mode of this request.
    #[must_use]
    pub const fn visibility(&self) -> VisibilityContext {
        self.visibility
    }

    /// Identifier of the record this request targets, if any.
    #[must_use]
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Look up a request attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Set or replace a request attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    /// Copy of this context scoped to a single record.
    #[must_use]
    pub fn for_record(&self, id: Option<String>) -> Self {
        let mut scoped = self.clone();
        if id.is_some() {
            scoped.record_id = id;
        }
        scoped
    }
}
