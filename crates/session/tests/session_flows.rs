use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::oneshot;

use metroconsole_auth::{AccountStatus, Credential, IdentityPayload, PermissionGrant, Role};
use metroconsole_session::{
    AuthError, AuthGateway, CredentialStorage, FileCredentialStorage, GatewayError, LoginGrant,
    LoginRequest, MemoryCredentialStorage, SessionState, SessionStore,
};

enum Scripted<T> {
    Ready(Result<T, GatewayError>),
    Held(oneshot::Receiver<Result<T, GatewayError>>),
}

impl<T> Scripted<T> {
    async fn resolve(self) -> Result<T, GatewayError> {
        match self {
            Scripted::Ready(result) => result,
            Scripted::Held(rx) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::transport("script dropped"))),
        }
    }
}

/// Gateway that replays queued responses, optionally holding them in flight.
#[derive(Default)]
struct ScriptedGateway {
    logins: Mutex<VecDeque<Scripted<LoginGrant>>>,
    validations: Mutex<VecDeque<Scripted<IdentityPayload>>>,
    login_calls: AtomicUsize,
    validate_calls: AtomicUsize,
}

impl ScriptedGateway {
    fn push_login(&self, response: Scripted<LoginGrant>) {
        self.logins.lock().unwrap().push_back(response);
    }

    fn push_validation(&self, response: Scripted<IdentityPayload>) {
        self.validations.lock().unwrap().push_back(response);
    }

    fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthGateway for ScriptedGateway {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginGrant, GatewayError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.logins.lock().unwrap().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Err(GatewayError::transport("no scripted login")),
        }
    }

    async fn validate(&self, _credential: &Credential) -> Result<IdentityPayload, GatewayError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.validations.lock().unwrap().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Err(GatewayError::transport("no scripted validation")),
        }
    }
}

fn payload(id: &str, role: Role) -> IdentityPayload {
    IdentityPayload {
        id: id.to_string(),
        display_name: format!("User {id}"),
        role,
        status: AccountStatus::Active,
        grants: None,
    }
}

fn grant(id: &str, role: Role) -> LoginGrant {
    LoginGrant {
        token: format!("token-{id}"),
        expires_at: Some(Utc::now() + Duration::hours(8)),
        identity: payload(id, role),
    }
}

fn live_credential(token: &str) -> Credential {
    let now = Utc::now();
    Credential::new(token, now - Duration::minutes(1), Some(now + Duration::hours(1)))
}

fn request(username: &str) -> LoginRequest {
    LoginRequest::new(username, "secret")
}

struct Harness {
    gateway: Arc<ScriptedGateway>,
    storage: Arc<MemoryCredentialStorage>,
    store: Arc<SessionStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_storage(MemoryCredentialStorage::new())
    }

    fn with_storage(storage: MemoryCredentialStorage) -> Self {
        let gateway = Arc::new(ScriptedGateway::default());
        let storage = Arc::new(storage);
        let store = Arc::new(SessionStore::new(gateway.clone(), storage.clone()));
        Self {
            gateway,
            storage,
            store,
        }
    }

    fn stored_token(&self) -> Option<String> {
        self.storage
            .load()
            .unwrap()
            .map(|c| c.token().to_string())
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn login_sets_identity_and_persists_credential() {
    let h = Harness::new();
    h.gateway.push_login(Scripted::Ready(Ok(grant("ana", Role::Operator))));

    let identity = h.store.login(request("ana")).await.unwrap();

    assert_eq!(identity.id.as_str(), "ana");
    assert_eq!(h.store.current_identity(), Some(identity));
    assert_eq!(h.store.state(), SessionState::Authenticated);
    assert_eq!(h.stored_token().as_deref(), Some("token-ana"));
    assert_eq!(h.store.bearer_token().as_deref(), Some("token-ana"));
    assert!(!h.store.is_loading());
}

#[tokio::test]
async fn login_without_grants_uses_role_defaults() {
    let h = Harness::new();
    h.gateway.push_login(Scripted::Ready(Ok(grant("ana", Role::Operator))));
    h.store.login(request("ana")).await.unwrap();

    assert!(h.store.can_perform("stock", "edit"));
    assert!(!h.store.can_perform("stock", "delete"));
    assert!(!h.store.can_perform("settings", "view"));
}

#[tokio::test]
async fn explicit_grants_override_role_defaults() {
    let h = Harness::new();
    let mut g = grant("ana", Role::Operator);
    g.identity.grants = Some(vec![PermissionGrant::none("stock").with(
        metroconsole_auth::Action::View,
        true,
    )]);
    h.gateway.push_login(Scripted::Ready(Ok(g)));
    h.store.login(request("ana")).await.unwrap();

    assert!(h.store.can_perform("stock", "view"));
    assert!(!h.store.can_perform("stock", "edit"));
    assert!(!h.store.can_perform("equipment", "view"));
}

#[tokio::test]
async fn rejected_login_leaves_prior_session_untouched() {
    let h = Harness::new();
    h.gateway.push_login(Scripted::Ready(Ok(grant("ana", Role::Supervisor))));
    h.gateway
        .push_login(Scripted::Ready(Err(GatewayError::rejected("Senha incorreta"))));

    let ana = h.store.login(request("ana")).await.unwrap();
    let err = h.store.login(request("bia")).await.unwrap_err();

    assert_eq!(err, AuthError::InvalidCredential("Senha incorreta".into()));
    assert_eq!(h.store.current_identity(), Some(ana));
    assert_eq!(h.store.state(), SessionState::Authenticated);
    assert_eq!(h.stored_token().as_deref(), Some("token-ana"));
}

#[tokio::test]
async fn unreachable_login_endpoint_is_a_transport_failure() {
    let h = Harness::new();
    h.gateway
        .push_login(Scripted::Ready(Err(GatewayError::transport("connection refused"))));

    let err = h.store.login(request("ana")).await.unwrap_err();

    assert!(matches!(err, AuthError::TransportFailure(_)));
    assert_ne!(
        err.user_message(),
        AuthError::InvalidCredential(String::new()).user_message()
    );
    assert!(h.store.current_identity().is_none());
    assert!(h.stored_token().is_none());
}

#[tokio::test]
async fn unusable_identity_in_grant_is_not_a_connection_problem() {
    let h = Harness::new();
    h.gateway.push_login(Scripted::Ready(Ok(grant("  ", Role::Operator))));

    let err = h.store.login(request("ana")).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert_ne!(
        err.user_message(),
        AuthError::TransportFailure(String::new()).user_message()
    );
    assert!(h.store.current_identity().is_none());
    assert!(h.stored_token().is_none());
}

#[tokio::test]
async fn inactive_account_cannot_log_in() {
    let h = Harness::new();
    let mut g = grant("old", Role::Viewer);
    g.identity.status = AccountStatus::Inactive;
    h.gateway.push_login(Scripted::Ready(Ok(g)));

    assert_eq!(
        h.store.login(request("old")).await,
        Err(AuthError::AccountInactive)
    );
    assert!(h.store.current_identity().is_none());
    assert!(h.stored_token().is_none());
}

#[tokio::test]
async fn second_login_while_first_in_flight_is_rejected() {
    let h = Harness::new();
    let (release, held) = oneshot::channel();
    h.gateway.push_login(Scripted::Held(held));
    h.gateway.push_login(Scripted::Ready(Ok(grant("bia", Role::Administrator))));

    let first = tokio::spawn({
        let store = h.store.clone();
        async move { store.login(request("ana")).await }
    });
    wait_until(|| h.store.is_loading()).await;

    let second = h.store.login(request("bia")).await;
    assert_eq!(second, Err(AuthError::LoginInProgress));

    release.send(Ok(grant("ana", Role::Operator))).unwrap();
    let ana = first.await.unwrap().unwrap();

    let current = h.store.current_identity().unwrap();
    assert_eq!(current, ana);
    assert_eq!(current.id.as_str(), "ana");
    assert_eq!(current.role, Role::Operator);
    assert_eq!(h.stored_token().as_deref(), Some("token-ana"));
    assert_eq!(h.gateway.login_calls(), 1);
}

#[tokio::test]
async fn logout_during_login_discards_the_late_result() {
    let h = Harness::new();
    let (release, held) = oneshot::channel();
    h.gateway.push_login(Scripted::Held(held));
    h.gateway.push_login(Scripted::Ready(Ok(grant("bia", Role::Viewer))));

    let first = tokio::spawn({
        let store = h.store.clone();
        async move { store.login(request("ana")).await }
    });
    wait_until(|| h.store.is_loading()).await;

    h.store.logout();
    assert!(!h.store.is_loading());

    let bia = h.store.login(request("bia")).await.unwrap();

    release.send(Ok(grant("ana", Role::Administrator))).unwrap();
    assert_eq!(first.await.unwrap(), Err(AuthError::Superseded));

    assert_eq!(h.store.current_identity(), Some(bia));
    assert_eq!(h.stored_token().as_deref(), Some("token-bia"));
}

#[tokio::test]
async fn cancelled_login_future_releases_the_slot() {
    let h = Harness::new();
    let (_never, held) = oneshot::channel();
    h.gateway.push_login(Scripted::Held(held));
    h.gateway.push_login(Scripted::Ready(Ok(grant("ana", Role::Viewer))));

    let timed_out =
        tokio::time::timeout(StdDuration::from_millis(20), h.store.login(request("ana"))).await;
    assert!(timed_out.is_err());
    assert!(!h.store.is_loading());

    assert!(h.store.login(request("ana")).await.is_ok());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let h = Harness::new();
    h.store.logout();
    h.gateway.push_login(Scripted::Ready(Ok(grant("ana", Role::Viewer))));
    h.store.login(request("ana")).await.unwrap();

    for _ in 0..3 {
        h.store.logout();
        assert!(h.store.current_identity().is_none());
        assert_eq!(h.store.state(), SessionState::Unauthenticated);
        assert!(h.stored_token().is_none());
        assert!(h.store.bearer_token().is_none());
    }
}

#[tokio::test]
async fn restore_without_stored_credential_is_unauthenticated() {
    let h = Harness::new();
    assert_eq!(h.store.state(), SessionState::Unknown);

    assert_eq!(
        h.store.restore_from_storage().await,
        Err(AuthError::NoStoredCredential)
    );
    assert_eq!(h.store.state(), SessionState::Unauthenticated);
    assert_eq!(h.gateway.validate_calls(), 0);
}

#[tokio::test]
async fn restore_revalidates_stored_credential() {
    let h = Harness::with_storage(MemoryCredentialStorage::with_credential(live_credential(
        "stored",
    )));
    let (release, held) = oneshot::channel();
    h.gateway.push_validation(Scripted::Held(held));

    let restore = tokio::spawn({
        let store = h.store.clone();
        async move { store.restore_from_storage().await }
    });
    wait_until(|| h.store.is_loading()).await;
    assert_eq!(h.store.state(), SessionState::Validating);
    assert!(h.store.current_identity().is_none());

    release.send(Ok(payload("ana", Role::Supervisor))).unwrap();
    let identity = restore.await.unwrap().unwrap();

    assert_eq!(identity.role, Role::Supervisor);
    assert_eq!(h.store.state(), SessionState::Authenticated);
    assert_eq!(h.store.bearer_token().as_deref(), Some("stored"));
}

#[tokio::test]
async fn restore_with_rejected_credential_logs_out() {
    let h = Harness::with_storage(MemoryCredentialStorage::with_credential(live_credential(
        "revoked",
    )));
    h.gateway
        .push_validation(Scripted::Ready(Err(GatewayError::rejected("token revoked"))));

    let err = h.store.restore_from_storage().await.unwrap_err();

    assert_eq!(err, AuthError::SessionExpired);
    assert!(err.requires_login_redirect());
    assert_eq!(h.store.state(), SessionState::Unauthenticated);
    assert!(h.stored_token().is_none());
}

#[tokio::test]
async fn restore_transport_failure_degrades_to_unauthenticated() {
    let h = Harness::with_storage(MemoryCredentialStorage::with_credential(live_credential(
        "stored",
    )));
    h.gateway
        .push_validation(Scripted::Ready(Err(GatewayError::transport("timeout"))));

    let err = h.store.restore_from_storage().await.unwrap_err();

    assert_eq!(err, AuthError::TransportFailure("timeout".into()));
    assert_eq!(h.store.state(), SessionState::Unauthenticated);
    assert!(h.store.current_identity().is_none());
    assert!(h.stored_token().is_none());
}

#[tokio::test]
async fn restore_with_locally_expired_credential_skips_the_network() {
    let now = Utc::now();
    let expired = Credential::new("old", now - Duration::hours(3), Some(now - Duration::hours(1)));
    let h = Harness::with_storage(MemoryCredentialStorage::with_credential(expired));

    assert_eq!(
        h.store.restore_from_storage().await,
        Err(AuthError::SessionExpired)
    );
    assert_eq!(h.gateway.validate_calls(), 0);
    assert!(h.stored_token().is_none());
    assert_eq!(h.store.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn restore_with_corrupt_credential_file_logs_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credential.json");
    std::fs::write(&path, b"{\"token\": ").unwrap();

    let gateway = Arc::new(ScriptedGateway::default());
    let store = SessionStore::new(gateway.clone(), Arc::new(FileCredentialStorage::new(&path)));

    assert_eq!(
        store.restore_from_storage().await,
        Err(AuthError::SessionExpired)
    );
    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert!(!path.exists());
    assert_eq!(gateway.validate_calls(), 0);
}

#[tokio::test]
async fn restore_of_inactive_account_logs_out() {
    let h = Harness::with_storage(MemoryCredentialStorage::with_credential(live_credential(
        "stored",
    )));
    let mut p = payload("old", Role::Administrator);
    p.status = AccountStatus::Inactive;
    h.gateway.push_validation(Scripted::Ready(Ok(p)));

    assert_eq!(
        h.store.restore_from_storage().await,
        Err(AuthError::AccountInactive)
    );
    assert!(h.store.current_identity().is_none());
    assert!(!h.store.can_perform("stock", "view"));
    assert!(h.stored_token().is_none());
}

#[tokio::test]
async fn logout_during_restore_does_not_resurrect_identity() {
    let h = Harness::with_storage(MemoryCredentialStorage::with_credential(live_credential(
        "stored",
    )));
    let (release, held) = oneshot::channel();
    h.gateway.push_validation(Scripted::Held(held));

    let restore = tokio::spawn({
        let store = h.store.clone();
        async move { store.restore_from_storage().await }
    });
    wait_until(|| h.store.is_loading()).await;

    h.store.logout();
    release.send(Ok(payload("ana", Role::Administrator))).unwrap();

    assert_eq!(restore.await.unwrap(), Err(AuthError::Superseded));
    assert!(h.store.current_identity().is_none());
    assert_eq!(h.store.state(), SessionState::Unauthenticated);
    assert!(h.stored_token().is_none());
}

#[tokio::test]
async fn adopting_a_credential_drops_identity_until_revalidated() {
    let h = Harness::new();
    h.gateway.push_login(Scripted::Ready(Ok(grant("ana", Role::Operator))));
    h.store.login(request("ana")).await.unwrap();

    let (release, held) = oneshot::channel();
    h.gateway.push_validation(Scripted::Held(held));

    let adopt = tokio::spawn({
        let store = h.store.clone();
        async move { store.adopt_credential(live_credential("handed-over")).await }
    });
    wait_until(|| h.store.is_loading()).await;

    assert!(h.store.current_identity().is_none());
    assert_eq!(h.store.state(), SessionState::Validating);
    assert_eq!(h.stored_token().as_deref(), Some("handed-over"));

    release.send(Ok(payload("bia", Role::Viewer))).unwrap();
    let bia = adopt.await.unwrap().unwrap();
    assert_eq!(h.store.current_identity(), Some(bia));
    assert_eq!(h.store.bearer_token().as_deref(), Some("handed-over"));
}

#[tokio::test]
async fn subscribers_see_loading_then_authenticated() {
    let h = Harness::new();
    let mut rx = h.store.subscribe();
    let (release, held) = oneshot::channel();
    h.gateway.push_login(Scripted::Held(held));

    let login = tokio::spawn({
        let store = h.store.clone();
        async move { store.login(request("ana")).await }
    });

    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().loading);

    release.send(Ok(grant("ana", Role::Viewer))).unwrap();
    login.await.unwrap().unwrap();

    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update().clone();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert_eq!(snapshot.identity.unwrap().id.as_str(), "ana");
}
