//! Console wiring: one session store, one notification feed, one menu.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use metroconsole_auth::{Identity, ModuleCatalog, PermissionTable};
use metroconsole_navigation::{
    MenuCatalog, MenuEntry, VisibleSection, first_visible_entry, visible_entries,
};
use metroconsole_notifications::{FeedSnapshot, NotificationInput, NotificationStore};
use metroconsole_session::{
    AuthError, AuthGateway, CredentialStorage, DevAuthGateway, FileCredentialStorage,
    LoginRequest, SessionState, SessionStore,
};

use crate::config::{ConsoleConfig, GatewayKind};

const SESSION_CATEGORY: &str = "session";

/// Everything the console renders, as one serializable value.
#[derive(Debug, Serialize)]
pub struct ConsoleReport<'a> {
    pub state: SessionState,
    pub identity: Option<Identity>,
    pub landing: Option<&'a MenuEntry>,
    pub menu: Vec<VisibleSection<'a>>,
    pub feed: FeedSnapshot,
}

/// Dependency-injected application context.
///
/// Built once at startup; stores are shared through `Arc`s and mutated only
/// through their own operations.
pub struct ConsoleContext {
    config: ConsoleConfig,
    session: Arc<SessionStore>,
    notifications: Arc<NotificationStore>,
    menu: MenuCatalog,
}

impl ConsoleContext {
    /// Wire the gateway and storage named by `config`.
    pub fn from_config(config: ConsoleConfig) -> anyhow::Result<Self> {
        let gateway = build_gateway(&config)?;
        let storage: Arc<dyn CredentialStorage> =
            Arc::new(FileCredentialStorage::new(config.credential_path.clone()));
        Self::with_parts(config, gateway, storage)
    }

    /// Wire explicit collaborators (tests, embedding).
    pub fn with_parts(
        config: ConsoleConfig,
        gateway: Arc<dyn AuthGateway>,
        storage: Arc<dyn CredentialStorage>,
    ) -> anyhow::Result<Self> {
        let modules = ModuleCatalog::standard();
        let menu = MenuCatalog::standard();
        menu.validate(&modules)?;

        let session = SessionStore::new(gateway, storage)
            .with_permission_table(PermissionTable::standard())
            .with_module_catalog(modules)
            .with_credential_ttl(config.credential_ttl());
        let notifications = NotificationStore::new(config.expiry);

        Ok(Self {
            config,
            session: Arc::new(session),
            notifications: Arc::new(notifications),
            menu,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn notifications(&self) -> &Arc<NotificationStore> {
        &self.notifications
    }

    pub fn menu(&self) -> &MenuCatalog {
        &self.menu
    }

    /// Restore the stored session, if any.
    ///
    /// Failures are reported in the feed and leave the console unauthenticated.
    pub async fn start(&self) -> Option<Identity> {
        match self.session.restore_from_storage().await {
            Ok(identity) => Some(identity),
            Err(AuthError::NoStoredCredential) => None,
            Err(e) => {
                self.report_failure("Session not restored", &e);
                None
            }
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Identity, AuthError> {
        match self.session.login(request).await {
            Ok(identity) => {
                self.notifications.push(
                    NotificationInput::success(
                        "Signed in",
                        format!("Welcome, {}.", identity.display_name),
                    )
                    .with_category(SESSION_CATEGORY),
                );
                Ok(identity)
            }
            Err(e) => {
                self.report_failure("Sign-in failed", &e);
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        self.session.logout();
        self.notifications.push(
            NotificationInput::info("Signed out", "Your session has ended.")
                .with_category(SESSION_CATEGORY),
        );
    }

    /// Menu sections the current identity may see.
    pub fn visible_menu(&self) -> Vec<VisibleSection<'_>> {
        let identity = self.session.current_identity();
        visible_entries(&self.menu, identity.as_ref())
    }

    pub fn report(&self) -> ConsoleReport<'_> {
        let snapshot = self.session.snapshot();
        let identity = snapshot.identity;
        ConsoleReport {
            state: snapshot.state,
            landing: first_visible_entry(&self.menu, identity.as_ref()),
            menu: visible_entries(&self.menu, identity.as_ref()),
            identity,
            feed: self.notifications.snapshot(),
        }
    }

    fn report_failure(&self, title: &str, error: &AuthError) {
        let input = match error {
            AuthError::TransportFailure(_)
            | AuthError::InvalidResponse(_)
            | AuthError::Storage(_) => {
                NotificationInput::error(title, error.user_message())
            }
            _ => NotificationInput::warning(title, error.user_message()),
        };
        self.notifications
            .push(input.with_category(SESSION_CATEGORY));
    }
}

fn build_gateway(config: &ConsoleConfig) -> anyhow::Result<Arc<dyn AuthGateway>> {
    match config.gateway {
        GatewayKind::Dev => {
            warn!("using the development gateway; every login succeeds");
            Ok(Arc::new(DevAuthGateway::new()))
        }
        GatewayKind::Http => http_gateway(config),
    }
}

#[cfg(feature = "http")]
fn http_gateway(config: &ConsoleConfig) -> anyhow::Result<Arc<dyn AuthGateway>> {
    use anyhow::Context;

    let gateway = metroconsole_session::HttpAuthGateway::new(config.api_base_url.clone())
        .context("failed to build HTTP client")?;
    info!(api = %config.api_base_url, "using HTTP gateway");
    Ok(Arc::new(gateway))
}

#[cfg(not(feature = "http"))]
fn http_gateway(_config: &ConsoleConfig) -> anyhow::Result<Arc<dyn AuthGateway>> {
    anyhow::bail!("built without the `http` feature; set METROCONSOLE_GATEWAY=dev")
}
