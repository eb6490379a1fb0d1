//! Session boundary errors.
//!
//! Gateway and storage failures never escape the store as-is: they are folded
//! into [`AuthError`] together with the matching state transition.

use thiserror::Error;

/// Outcome of a failed `login`, `restore_from_storage` or `adopt_credential`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The login endpoint rejected the input. Session state is unchanged.
    #[error("invalid credentials: {0}")]
    InvalidCredential(String),

    /// The stored credential failed revalidation or has expired locally.
    #[error("session expired")]
    SessionExpired,

    /// The endpoint could not be reached.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// The endpoint answered, but with an unusable body or identity.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend vouched for the identity but its account is not active.
    #[error("account is inactive")]
    AccountInactive,

    /// Another login or revalidation is still in flight.
    #[error("a login is already in progress")]
    LoginInProgress,

    /// A logout happened while this attempt was in flight; its result was discarded.
    #[error("attempt superseded by logout")]
    Superseded,

    /// Nothing to restore.
    #[error("no stored credential")]
    NoStoredCredential,

    /// The credential could not be persisted. Session state is unchanged.
    #[error("credential storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    /// Text for the login surface.
    ///
    /// Connection problems get their own wording so a user can tell "wrong
    /// password" from "server unreachable".
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredential(reason) if reason.trim().is_empty() => {
                "Invalid username or password.".to_string()
            }
            AuthError::InvalidCredential(reason) => reason.clone(),
            AuthError::SessionExpired | AuthError::Superseded | AuthError::NoStoredCredential => {
                "Your session has ended. Please sign in again.".to_string()
            }
            AuthError::TransportFailure(_) => {
                "Could not connect to the server. Check your connection and try again.".to_string()
            }
            AuthError::InvalidResponse(_) => {
                "The server sent an unexpected response. Please try again later.".to_string()
            }
            AuthError::AccountInactive => {
                "This account is inactive. Contact an administrator.".to_string()
            }
            AuthError::LoginInProgress => "Signing in, please wait.".to_string(),
            AuthError::Storage(_) => {
                "Could not save your session on this device. Please try again.".to_string()
            }
        }
    }

    /// Whether the caller should route to the login surface instead of
    /// showing the error inline.
    pub fn requires_login_redirect(&self) -> bool {
        matches!(
            self,
            AuthError::SessionExpired
                | AuthError::TransportFailure(_)
                | AuthError::InvalidResponse(_)
                | AuthError::AccountInactive
                | AuthError::NoStoredCredential
                | AuthError::Superseded
        )
    }

    /// Whether retrying the same operation can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredential(_)
                | AuthError::TransportFailure(_)
                | AuthError::LoginInProgress
                | AuthError::Storage(_)
        )
    }
}

/// Failure reported by an [`AuthGateway`](crate::AuthGateway).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The endpoint answered and said no.
    #[error("rejected: {reason}")]
    Rejected { reason: String },

    /// The endpoint could not be reached (connect error, timeout, 5xx).
    #[error("transport: {0}")]
    Transport(String),

    /// The endpoint answered with a body that does not match the contract.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport(detail.into())
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }
}

/// Failure of a [`CredentialStorage`](crate::CredentialStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("credential storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential storage serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
