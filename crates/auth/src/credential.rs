//! Bearer credential and its local lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque bearer token plus the window in which it may be presented.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    token: String,
    pub issued_at: DateTime<Utc>,
    /// `None` means the issuer gave no expiry; the backend decides on revalidation.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialLifetimeError {
    #[error("credential has expired")]
    Expired,

    #[error("credential not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid credential time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("credential token is empty")]
    EmptyToken,
}

impl Credential {
    pub fn new(
        token: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            token: token.into(),
            issued_at,
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Deterministically check the credential's local lifetime.
    ///
    /// This does not say the backend still accepts the token, only that it is
    /// worth presenting.
    pub fn validate_lifetime(&self, now: DateTime<Utc>) -> Result<(), CredentialLifetimeError> {
        if self.token.trim().is_empty() {
            return Err(CredentialLifetimeError::EmptyToken);
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= self.issued_at {
                return Err(CredentialLifetimeError::InvalidTimeWindow);
            }
            if now >= expires_at {
                return Err(CredentialLifetimeError::Expired);
            }
        }
        if now < self.issued_at {
            return Err(CredentialLifetimeError::NotYetValid);
        }
        Ok(())
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
