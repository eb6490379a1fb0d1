//! Backend endpoints consumed by the session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use metroconsole_auth::{AccountStatus, Credential, IdentityPayload, Role};

use crate::error::GatewayError;

/// User-supplied login input.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response: a fresh bearer token and who it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginGrant {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(alias = "user")]
    pub identity: IdentityPayload,
}

impl core::fmt::Debug for LoginGrant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginGrant")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Login and credential-validation endpoints.
///
/// Implementations report what the backend said; they do not touch session
/// state. The store treats every non-success from `validate` the same way:
/// the session is invalidated.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange user input for a credential and identity.
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, GatewayError>;

    /// Ask the backend who `credential` belongs to.
    async fn validate(&self, credential: &Credential) -> Result<IdentityPayload, GatewayError>;
}

/// Development gateway: every login succeeds.
///
/// Tokens are self-describing (`dev.<username>.<uuid>`) so a restored
/// credential still validates after a process restart. Never use this against
/// real data.
#[derive(Debug, Clone)]
pub struct DevAuthGateway {
    role: Role,
}

const DEV_TOKEN_PREFIX: &str = "dev.";

impl DevAuthGateway {
    pub fn new() -> Self {
        Self {
            role: Role::Administrator,
        }
    }

    /// Role given to every identity this gateway hands out.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    fn payload_for(&self, username: &str) -> IdentityPayload {
        IdentityPayload {
            id: username.to_string(),
            display_name: username.to_string(),
            role: self.role,
            status: AccountStatus::Active,
            grants: None,
        }
    }
}

impl Default for DevAuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for DevAuthGateway {
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, GatewayError> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(GatewayError::rejected("Username is required."));
        }
        if username.contains('.') {
            return Err(GatewayError::rejected("Username may not contain '.'."));
        }

        Ok(LoginGrant {
            token: format!("{DEV_TOKEN_PREFIX}{username}.{}", Uuid::now_v7().simple()),
            expires_at: None,
            identity: self.payload_for(username),
        })
    }

    async fn validate(&self, credential: &Credential) -> Result<IdentityPayload, GatewayError> {
        let username = credential
            .token()
            .strip_prefix(DEV_TOKEN_PREFIX)
            .and_then(|rest| rest.split_once('.'))
            .map(|(username, _)| username)
            .filter(|username| !username.is_empty())
            .ok_or_else(|| GatewayError::rejected("not a development token"))?;

        Ok(self.payload_for(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dev_gateway_round_trips_its_own_tokens() {
        let gateway = DevAuthGateway::new().with_role(Role::Supervisor);
        let grant = gateway
            .login(&LoginRequest::new("marta", "anything"))
            .await
            .unwrap();
        assert_eq!(grant.identity.role, Role::Supervisor);

        let credential = Credential::new(grant.token, Utc::now(), None);
        let payload = gateway.validate(&credential).await.unwrap();
        assert_eq!(payload.id, "marta");
    }

    #[tokio::test]
    async fn dev_gateway_rejects_foreign_tokens() {
        let gateway = DevAuthGateway::new();
        let credential = Credential::new("eyJhbGciOi", Utc::now(), None);
        assert!(matches!(
            gateway.validate(&credential).await,
            Err(GatewayError::Rejected { .. })
        ));
        assert!(gateway.login(&LoginRequest::new("  ", "x")).await.is_err());
    }

    #[tokio::test]
    async fn dev_gateway_explains_each_rejected_username() {
        let gateway = DevAuthGateway::new();
        assert_eq!(
            gateway.login(&LoginRequest::new("  ", "x")).await,
            Err(GatewayError::rejected("Username is required."))
        );
        assert_eq!(
            gateway.login(&LoginRequest::new("ana.souza", "x")).await,
            Err(GatewayError::rejected("Username may not contain '.'."))
        );
    }

    #[test]
    fn login_request_debug_hides_password() {
        let request = LoginRequest::new("ana", "hunter2");
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn login_grant_accepts_user_alias() {
        let grant: LoginGrant = serde_json::from_str(
            r#"{"token":"abc","user":{"id":"1","display_name":"Ana","role":"Administrador"}}"#,
        )
        .unwrap();
        assert_eq!(grant.identity.role, Role::Administrator);
        assert!(grant.expires_at.is_none());
    }
}
