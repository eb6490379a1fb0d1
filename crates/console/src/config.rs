//! Console configuration.
//!
//! Defaults, then `METROCONSOLE_*` environment overrides.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use metroconsole_notifications::ExpiryPolicy;

pub const ENV_API_URL: &str = "METROCONSOLE_API_URL";
pub const ENV_CREDENTIAL_PATH: &str = "METROCONSOLE_CREDENTIAL_PATH";
pub const ENV_NOTIFY_INFO_MS: &str = "METROCONSOLE_NOTIFY_INFO_MS";
pub const ENV_NOTIFY_SUCCESS_MS: &str = "METROCONSOLE_NOTIFY_SUCCESS_MS";
pub const ENV_NOTIFY_WARNING_MS: &str = "METROCONSOLE_NOTIFY_WARNING_MS";
pub const ENV_CREDENTIAL_TTL_HOURS: &str = "METROCONSOLE_CREDENTIAL_TTL_HOURS";
pub const ENV_LOG_JSON: &str = "METROCONSOLE_LOG_JSON";
pub const ENV_LOG_FILTER: &str = "METROCONSOLE_LOG";
pub const ENV_GATEWAY: &str = "METROCONSOLE_GATEWAY";

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Which [`metroconsole_session::AuthGateway`] the console talks to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    /// The backend HTTP API.
    #[default]
    Http,
    /// Local development gateway; accepts any username.
    Dev,
}

impl FromStr for GatewayKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(GatewayKind::Http),
            "dev" => Ok(GatewayKind::Dev),
            other => bail!("unknown gateway '{other}' (expected 'http' or 'dev')"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub credential_path: PathBuf,
    pub expiry: ExpiryPolicy,
    /// Local lifetime for credentials issued without an expiry.
    pub credential_ttl_hours: u32,
    pub log_json: bool,
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    pub gateway: GatewayKind,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            credential_path: default_credential_path(),
            expiry: ExpiryPolicy::default(),
            credential_ttl_hours: 12,
            log_json: true,
            log_filter: None,
            gateway: GatewayKind::default(),
        }
    }
}

impl ConsoleConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup` (a stand-in for the environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(path) = get(ENV_CREDENTIAL_PATH) {
            config.credential_path = PathBuf::from(path);
        }
        if let Some(v) = get(ENV_NOTIFY_INFO_MS) {
            config.expiry.info_ms = parse_number(ENV_NOTIFY_INFO_MS, &v)?;
        }
        if let Some(v) = get(ENV_NOTIFY_SUCCESS_MS) {
            config.expiry.success_ms = parse_number(ENV_NOTIFY_SUCCESS_MS, &v)?;
        }
        if let Some(v) = get(ENV_NOTIFY_WARNING_MS) {
            config.expiry.warning_ms = parse_number(ENV_NOTIFY_WARNING_MS, &v)?;
        }
        if let Some(v) = get(ENV_CREDENTIAL_TTL_HOURS) {
            config.credential_ttl_hours = parse_number(ENV_CREDENTIAL_TTL_HOURS, &v)?;
            if config.credential_ttl_hours == 0 {
                bail!("{ENV_CREDENTIAL_TTL_HOURS} must be at least 1");
            }
        }
        if let Some(v) = get(ENV_LOG_JSON) {
            config.log_json = parse_bool(ENV_LOG_JSON, &v)?;
        }
        if let Some(v) = get(ENV_LOG_FILTER) {
            config.log_filter = Some(v);
        }
        if let Some(v) = get(ENV_GATEWAY) {
            config.gateway = v.parse().with_context(|| format!("invalid {ENV_GATEWAY}"))?;
        }

        Ok(config)
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = path.into();
        self
    }

    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_gateway(mut self, gateway: GatewayKind) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn credential_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.credential_ttl_hours))
    }
}

/// `{data_dir}/metroconsole/credential.json`, falling back to
/// `~/.local/share` and finally the working directory.
pub fn default_credential_path() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .unwrap_or_default();
    base.join("metroconsole").join("credential.json")
}

fn parse_number<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a non-negative integer, got {value:?}"))
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be a boolean, got {value:?}"),
    }
}
