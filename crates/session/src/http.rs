//! `AuthGateway` backed by the console's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use metroconsole_auth::{Credential, IdentityPayload};

use crate::error::GatewayError;
use crate::gateway::{AuthGateway, LoginGrant, LoginRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error body returned by the backend with a rejection.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "error", alias = "detail")]
    message: Option<String>,
}

/// Talks to `POST {base}/auth/login` and `GET {base}/auth/session`.
#[derive(Debug, Clone)]
pub struct HttpAuthGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::transport(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, GatewayError> {
        let url = self.url("/auth/login");
        debug!(%url, username = %request.username, "POST login");

        let body = serde_json::json!({
            "username": request.username,
            "password": request.password(),
        });
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))?;

        decode(resp).await
    }

    async fn validate(&self, credential: &Credential) -> Result<IdentityPayload, GatewayError> {
        let url = self.url("/auth/session");
        debug!(%url, "GET session");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))?;

        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<T>()
            .await
            .map_err(|e| GatewayError::malformed(e.to_string()));
    }

    let text = resp.text().await.unwrap_or_default();
    Err(classify(status.as_u16(), &text))
}

/// Map a non-success status and body to a gateway error.
///
/// Only statuses that mean "the backend refused this input" are rejections.
/// Timeouts, rate limits and routing errors (404, 408, 429, ...) say nothing
/// about the credentials and are reported as transport failures.
fn classify(status: u16, body: &str) -> GatewayError {
    match status {
        400 | 401 | 403 | 422 => {
            let reason = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_default();
            GatewayError::rejected(reason)
        }
        _ => GatewayError::transport(format!("HTTP {status}: {}", body.trim())),
    }
}
