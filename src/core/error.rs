//! Error handling for the panel engine
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`PanelError`]) for everything the engine itself reports
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for
//!    whoever renders the failure (an admin UI, a log line, a CLI wrapper)
//!
//! User-supplied callbacks (change callbacks, display transforms, resolve
//! callbacks, visibility predicates) return [`anyhow::Result`]. The engine wraps
//! their failures in [`PanelError::CallbackFailed`] or
//! [`PanelError::FieldResolution`] so the offending field key is always part of
//! the message while the original error stays reachable through
//! [`std::error::Error::source`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use panel_core::core::{PanelError, user_friendly_error};
//!
//! let err = PanelError::RecordNotFound { id: "42".to_string() };
//! assert_eq!(err.to_string(), "not found: id=42");
//!
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for panel operations
///
/// # Error Categories
///
/// ## Dependency cascade
/// - [`CircularDependency`] - the field graph contains a cycle
/// - [`CascadeLimitExceeded`] - propagation outran the round limit
/// - [`CallbackFailed`] - a change callback returned an error
/// - [`InvalidFormData`] - the submitted form could not be normalized
/// - [`UnknownVisibilityContext`] - unrecognized context token
///
/// ## Field resolution
/// - [`FieldResolution`] - one step of a field's resolution failed
/// - [`UnknownResource`] - a relationship names a collection nobody registered
/// - [`IsolationUnsupported`] - a descriptor cannot be duplicated for a worker
///
/// ## Records and actions
/// - [`RecordNotFound`] - bulk load could not find a requested identifier
/// - [`ActionForbidden`] - `can_run` rejected the action
/// - [`ActionFailed`] - the action itself failed
///
/// [`CircularDependency`]: PanelError::CircularDependency
/// [`CascadeLimitExceeded`]: PanelError::CascadeLimitExceeded
/// [`CallbackFailed`]: PanelError::CallbackFailed
/// [`InvalidFormData`]: PanelError::InvalidFormData
/// [`UnknownVisibilityContext`]: PanelError::UnknownVisibilityContext
/// [`FieldResolution`]: PanelError::FieldResolution
/// [`UnknownResource`]: PanelError::UnknownResource
/// [`IsolationUnsupported`]: PanelError::IsolationUnsupported
/// [`RecordNotFound`]: PanelError::RecordNotFound
/// [`ActionForbidden`]: PanelError::ActionForbidden
/// [`ActionFailed`]: PanelError::ActionFailed
#[derive(Error, Debug)]
pub enum PanelError {
    /// Circular dependency detected between field descriptors
    ///
    /// `chain` lists the field keys in traversal order and repeats the first key
    /// at the end to show where the cycle closes (`a → b → a`). A field that
    /// depends on itself yields a two-entry chain (`a → a`).
    #[error("Circular dependency detected: {}", .chain.join(" → "))]
    CircularDependency {
        /// Field keys forming the cycle, in traversal order
        chain: Vec<String>,
    },

    /// Cascade propagation did not settle within the round limit
    #[error(
        "Cascade did not settle after {rounds} rounds; still changing: {}",
        .pending.join(", ")
    )]
    CascadeLimitExceeded {
        /// Number of rounds that were executed
        rounds: usize,
        /// Field keys that were still publishing new values
        pending: Vec<String>,
    },

    /// A change callback returned an error
    #[error("Change callback for field '{field}' failed")]
    CallbackFailed {
        /// Key of the field whose callback failed
        field: String,
        /// Error returned by the callback
        #[source]
        source: anyhow::Error,
    },

    /// Submitted form data has an unusable shape
    #[error("Invalid form data: {reason}")]
    InvalidFormData {
        /// Why the payload was rejected
        reason: String,
    },

    /// Visibility context token is not recognized
    #[error("Unknown visibility context: '{token}'")]
    UnknownVisibilityContext {
        /// The token that failed to parse
        token: String,
    },

    /// Resolving a single field of an item failed
    #[error("Failed to resolve field '{field}': {stage}")]
    FieldResolution {
        /// Key of the field being resolved
        field: String,
        /// Resolution step that failed (e.g. "display transform")
        stage: String,
        /// Underlying error
        #[source]
        source: anyhow::Error,
    },

    /// A relationship references a collection that is not registered
    #[error("Field '{field}' references unknown resource '{resource}'")]
    UnknownResource {
        /// Key of the relationship field
        field: String,
        /// Name of the missing related resource
        resource: String,
    },

    /// A descriptor cannot be duplicated for concurrent resolution
    #[error("Field '{field}' cannot be isolated for concurrent resolution")]
    IsolationUnsupported {
        /// Key of the non-duplicable field
        field: String,
    },

    /// Bulk load could not find a requested record
    #[error("not found: id={id}")]
    RecordNotFound {
        /// The missing identifier
        id: String,
    },

    /// The action refused to run in the current context
    #[error("Action '{action}' is not allowed in this context")]
    ActionForbidden {
        /// Name of the rejected action
        action: String,
    },

    /// The action failed while executing
    #[error("Action '{action}' failed")]
    ActionFailed {
        /// Name of the failed action
        action: String,
        /// Error returned by the action
        #[source]
        source: anyhow::Error,
    },

    /// A data-store lookup failed
    #[error("Data store lookup failed: {operation}")]
    StoreError {
        /// The lookup that failed
        operation: String,
        /// Underlying error
        #[source]
        source: anyhow::Error,
    },

    /// The batch was cancelled before this unit could run
    #[error("Batch cancelled before unit {position} was started")]
    Cancelled {
        /// Input position of the skipped unit
        position: usize,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl PanelError {
    /// Wrap a callback error for `field` raised during `stage` of resolution.
    pub fn resolution(
        field: impl Into<String>,
        stage: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::FieldResolution {
            field: field.into(),
            stage: stage.into(),
            source,
        }
    }
}

/// Error wrapper carrying user-facing details and a suggestion
///
/// Built by [`user_friendly_error`] or by hand with the builder methods.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying panel error
    pub error: PanelError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: PanelError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with contextual suggestions.
///
/// Typed [`PanelError`]s get tailored guidance; anything else is reported as a
/// generic [`PanelError::ConfigError`] carrying the full `anyhow` chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<PanelError>() {
        Ok(panel_error) => panel_error,
        Err(other) => {
            let from_toml = other.chain().any(|cause| cause.is::<toml::de::Error>());
            let context = ErrorContext::new(PanelError::ConfigError {
                message: format!("{other:#}"),
            });
            if from_toml {
                return context.with_suggestion("Check the config file's TOML syntax and value types");
            }
            return context;
        }
    };

    match error {
        PanelError::CircularDependency { ref chain } => {
            let details = format!("Fields involved: {}", chain.join(", "));
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Remove one of the depends_on entries so the fields form a tree")
        }
        PanelError::CascadeLimitExceeded { .. } => ErrorContext::new(error)
            .with_details("Propagation ran more rounds than the field-set has fields")
            .with_suggestion(
                "Report the field-set and the changed keys; raising [cascade] max_rounds \
                 only delays this",
            ),
        PanelError::UnknownVisibilityContext { .. } => ErrorContext::new(error)
            .with_suggestion("Use one of: create, update (or edit), list, detail"),
        PanelError::UnknownResource { ref resource, .. } => {
            let suggestion = format!("Register a collection named '{resource}' before resolving");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        PanelError::IsolationUnsupported { .. } => ErrorContext::new(error)
            .with_details("The field's custom view does not support duplication")
            .with_suggestion("Set [isolation] policy = \"sequential\" to resolve such fields one at a time"),
        PanelError::RecordNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Refresh the list; the record may have been deleted"),
        PanelError::ActionForbidden { .. } => ErrorContext::new(error)
            .with_suggestion("Check the permissions required by this action"),
        PanelError::InvalidFormData { .. } => ErrorContext::new(error).with_suggestion(
            "Send a flat object, {key,type,data} envelopes, or {fields:[...], meta:{...}}",
        ),
        PanelError::TomlError(_) | PanelError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the [mapper], [cascade] and [isolation] sections of the config file"),
        other => ErrorContext::new(other),
    }
}
