//! Error types for the Vista engine.

use std::time::Duration;
use thiserror::Error;

/// Configuration errors - fatal at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required field was never set on a builder.
    #[error("{config}: missing required field '{field}'")]
    MissingField {
        config: &'static str,
        field: &'static str,
    },

    /// A select or multi-select filter without options.
    #[error("Filter '{key}' of type {kind} requires at least one option")]
    MissingOptions { key: String, kind: String },

    /// Two entries of the same kind share an id.
    #[error("Duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    /// `default_section` names a section that is not declared.
    #[error("Default section '{0}' is not declared")]
    UnknownDefaultSection(String),

    /// A column, field or sort key that the record shape does not have.
    #[error("{kind} '{key}' does not address a field of the record")]
    UnknownField { kind: &'static str, key: String },

    /// A status mapped onto a board column that does not exist.
    #[error("Board column '{0}' is not declared")]
    UnknownColumn(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Query and mutation errors - scoped to a single data key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The data source reported a failure.
    #[error("Query '{key}' failed: {message}")]
    Source { key: String, message: String },

    /// The data source did not answer in time.
    #[error("Query '{key}' timed out after {duration:?}")]
    Timeout { key: String, duration: Duration },

    /// The response did not have the expected shape.
    #[error("Query '{key}' returned an unexpected shape: {message}")]
    Decode { key: String, message: String },
}

impl QueryError {
    /// Create a data source failure for `key`.
    pub fn failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            key: key.into(),
            message: message.into(),
        }
    }

    /// The query or mutation key this error belongs to.
    pub fn key(&self) -> &str {
        match self {
            Self::Source { key, .. } | Self::Timeout { key, .. } | Self::Decode { key, .. } => key,
        }
    }
}

/// Action errors - caught at the dispatcher boundary, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// A custom action handler returned an error.
    #[error("Action handler failed: {0}")]
    Handler(String),

    /// The handler, the navigator or a dialog subscriber panicked.
    #[error("Action panicked: {0}")]
    Panicked(String),

    /// No action with this id is configured on the screen.
    #[error("Unknown action: {action_id}")]
    UnknownAction { action_id: String },

    /// The action was clicked before its record loaded.
    #[error("Record not loaded: {entity_id}")]
    NotLoaded { entity_id: String },

    /// The mutation the action invoked failed.
    #[error(transparent)]
    Mutation(#[from] QueryError),
}
