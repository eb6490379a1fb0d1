//! Parse and validation errors for core value types.

use thiserror::Error;

/// Result type used by parsers and constructors across the workspace.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core-level error.
///
/// Raised when a string coming from a payload, config file or caller does not
/// name a known value. Session and network failures live in the session crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A value failed validation (e.g. an empty display name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A role name outside the configured role set.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// An action name outside {view, create, edit, delete, approve, configure}.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A module name outside the module catalog.
    #[error("unknown module: {0}")]
    UnknownModule(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_role(name: impl Into<String>) -> Self {
        Self::UnknownRole(name.into())
    }

    pub fn unknown_action(name: impl Into<String>) -> Self {
        Self::UnknownAction(name.into())
    }

    pub fn unknown_module(name: impl Into<String>) -> Self {
        Self::UnknownModule(name.into())
    }
}
