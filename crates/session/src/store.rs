//! The session store.
//!
//! # State machine
//!
//! ```text
//! Unknown ──(stored credential)──▶ Validating ──(valid)──────────▶ Authenticated
//!    │                                  │                               │
//!    └──(none stored)──▶ Unauthenticated ◀──(invalid/expired/transport)─┘ (logout)
//! ```
//!
//! # In-flight attempts
//!
//! At most one login/revalidation round trip runs at a time; a second call is
//! rejected with [`AuthError::LoginInProgress`]. Every attempt carries a
//! ticket. `logout` invalidates outstanding tickets, so a round trip that
//! resolves after an explicit logout is discarded instead of resurrecting the
//! old identity.
//!
//! The internal lock is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use metroconsole_auth::{
    Credential, Identity, IdentityPayload, ModuleCatalog, PermissionTable, can_perform,
};

use crate::error::{AuthError, GatewayError};
use crate::gateway::{AuthGateway, LoginGrant, LoginRequest};
use crate::state::{SessionSnapshot, SessionState};
use crate::storage::CredentialStorage;

/// Local lifetime given to credentials that arrive without an expiry.
const DEFAULT_CREDENTIAL_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Login,
    Restore,
    Adopt,
}

impl Attempt {
    fn as_str(self) -> &'static str {
        match self {
            Attempt::Login => "login",
            Attempt::Restore => "restore",
            Attempt::Adopt => "adopt",
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    identity: Option<Identity>,
    credential: Option<Credential>,
    /// Ticket of the attempt currently in flight.
    in_flight: Option<u64>,
    /// Last ticket handed out; bumped by every attempt and every logout.
    generation: u64,
}

impl Inner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            identity: self.identity.clone(),
            loading: self.in_flight.is_some(),
        }
    }

    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.generation
    }

    fn owns(&self, ticket: u64) -> bool {
        self.in_flight == Some(ticket)
    }

    fn reset(&mut self) {
        self.identity = None;
        self.credential = None;
        self.in_flight = None;
        self.generation += 1;
        self.state = SessionState::Unauthenticated;
    }
}

/// Single source of truth for the logged-in identity and its credential.
///
/// Construct once at startup and share by reference (or `Arc`).
pub struct SessionStore {
    gateway: Arc<dyn AuthGateway>,
    storage: Arc<dyn CredentialStorage>,
    table: PermissionTable,
    catalog: ModuleCatalog,
    credential_ttl: Duration,
    inner: Mutex<Inner>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("state", &inner.state)
            .field("identity", &inner.identity.as_ref().map(|i| &i.id))
            .field("loading", &inner.in_flight.is_some())
            .finish()
    }
}

impl SessionStore {
    pub fn new(gateway: Arc<dyn AuthGateway>, storage: Arc<dyn CredentialStorage>) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            gateway,
            storage,
            table: PermissionTable::standard(),
            catalog: ModuleCatalog::standard(),
            credential_ttl: Duration::hours(DEFAULT_CREDENTIAL_TTL_HOURS),
            inner: Mutex::new(Inner::default()),
            snapshots,
        }
    }

    /// Role defaults applied to identities that arrive without grants.
    pub fn with_permission_table(mut self, table: PermissionTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_module_catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Local lifetime stamped on credentials issued without an expiry.
    pub fn with_credential_ttl(mut self, ttl: Duration) -> Self {
        self.credential_ttl = ttl;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn current_identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// A login or revalidation round trip is in flight.
    pub fn is_loading(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Receive a snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Bearer token for outgoing API calls, while authenticated.
    pub fn bearer_token(&self) -> Option<String> {
        let inner = self.lock();
        match inner.state {
            SessionState::Authenticated => inner.credential.as_ref().map(|c| c.token().to_string()),
            _ => None,
        }
    }

    /// Evaluate against the current identity. See [`metroconsole_auth::can_perform`].
    pub fn can_perform(&self, module: &str, action: &str) -> bool {
        let inner = self.lock();
        can_perform(inner.identity.as_ref(), module, action)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Log in with user input.
    ///
    /// On success the identity becomes current and the credential is
    /// persisted. On failure nothing changes and nothing is persisted.
    pub async fn login(&self, request: LoginRequest) -> Result<Identity, AuthError> {
        let mut guard = self.begin(Attempt::Login, |_| Ok(()))?;
        info!(username = %request.username, "login started");

        let outcome = self.gateway.login(&request).await;

        let mut inner = self.lock();
        if !guard.finish(&inner) {
            info!(username = %request.username, "login result discarded after logout");
            return Err(AuthError::Superseded);
        }
        inner.in_flight = None;

        let result = match outcome {
            Ok(grant) => self.accept_login(&mut inner, grant),
            Err(GatewayError::Rejected { reason }) => Err(AuthError::InvalidCredential(reason)),
            Err(GatewayError::Transport(detail)) => Err(AuthError::TransportFailure(detail)),
            Err(GatewayError::Malformed(detail)) => Err(AuthError::InvalidResponse(detail)),
        };

        match &result {
            Ok(identity) => info!(identity = %identity.id, role = %identity.role, "login succeeded"),
            Err(e) => warn!(username = %request.username, error = %e, "login failed"),
        }

        self.publish(&inner);
        result
    }

    /// Restore the persisted credential at startup and revalidate it.
    ///
    /// Any failure (nothing stored, unreadable, expired, rejected, unreachable)
    /// leaves the store `Unauthenticated` with storage cleared; the caller
    /// routes to the login surface. An unreadable file is `SessionExpired`.
    pub async fn restore_from_storage(&self) -> Result<Identity, AuthError> {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                let mut inner = self.lock();
                if inner.in_flight.is_some() {
                    return Err(AuthError::LoginInProgress);
                }
                warn!(error = %e, "stored credential unreadable; logging out");
                self.reset_locked(&mut inner);
                return Err(AuthError::SessionExpired);
            }
        };

        let Some(credential) = stored else {
            let mut inner = self.lock();
            if inner.in_flight.is_some() {
                return Err(AuthError::LoginInProgress);
            }
            if inner.state != SessionState::Authenticated {
                inner.state = SessionState::Unauthenticated;
                self.publish(&inner);
            }
            debug!("no stored credential");
            return Err(AuthError::NoStoredCredential);
        };

        if let Err(e) = credential.validate_lifetime(Utc::now()) {
            let mut inner = self.lock();
            if inner.in_flight.is_some() {
                return Err(AuthError::LoginInProgress);
            }
            info!(error = %e, "stored credential unusable; logging out");
            self.reset_locked(&mut inner);
            return Err(AuthError::SessionExpired);
        }

        let guard = self.begin(Attempt::Restore, |inner| {
            inner.identity = None;
            inner.credential = Some(credential.clone());
            inner.state = SessionState::Validating;
            Ok(())
        })?;
        self.revalidate(guard, credential).await
    }

    /// Replace the live credential and revalidate it.
    ///
    /// The previous identity is dropped immediately: a new credential is not
    /// trusted until the backend vouches for it.
    pub async fn adopt_credential(&self, credential: Credential) -> Result<Identity, AuthError> {
        if let Err(e) = credential.validate_lifetime(Utc::now()) {
            warn!(error = %e, "refusing to adopt unusable credential");
            return Err(AuthError::SessionExpired);
        }

        let guard = self.begin(Attempt::Adopt, |inner| {
            if let Err(e) = self.storage.save(&credential) {
                warn!(error = %e, "could not persist adopted credential");
                return Err(AuthError::Storage(e.to_string()));
            }
            inner.identity = None;
            inner.credential = Some(credential.clone());
            inner.state = SessionState::Validating;
            Ok(())
        })?;
        self.revalidate(guard, credential).await
    }

    /// Clear the identity and the stored credential.
    ///
    /// Idempotent. Any in-flight attempt is discarded when it resolves.
    pub fn logout(&self) {
        let mut inner = self.lock();
        let had_identity = inner.identity.is_some();
        self.reset_locked(&mut inner);
        if had_identity {
            info!("logged out");
        } else {
            debug!("logout with no identity");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.snapshots.send_replace(inner.snapshot());
    }

    /// Claim the in-flight slot, running `prepare` under the same lock.
    ///
    /// If `prepare` fails the slot is not claimed and nothing is published.
    fn begin(
        &self,
        attempt: Attempt,
        prepare: impl FnOnce(&mut Inner) -> Result<(), AuthError>,
    ) -> Result<AttemptGuard<'_>, AuthError> {
        let mut inner = self.lock();
        if inner.in_flight.is_some() {
            debug!(attempt = attempt.as_str(), "rejected: another attempt is in flight");
            return Err(AuthError::LoginInProgress);
        }
        prepare(&mut inner)?;
        let ticket = inner.begin();
        self.publish(&inner);
        Ok(AttemptGuard {
            store: self,
            attempt,
            ticket,
            finished: false,
        })
    }

    fn reset_locked(&self, inner: &mut Inner) {
        inner.reset();
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "could not clear stored credential");
        }
        self.publish(inner);
    }

    async fn revalidate(
        &self,
        mut guard: AttemptGuard<'_>,
        credential: Credential,
    ) -> Result<Identity, AuthError> {
        let attempt = guard.attempt;
        let outcome = self.gateway.validate(&credential).await;

        let mut inner = self.lock();
        if !guard.finish(&inner) {
            info!(attempt = attempt.as_str(), "revalidation result discarded after logout");
            return Err(AuthError::Superseded);
        }
        inner.in_flight = None;

        let result = match outcome {
            Ok(payload) => self.resolve_identity(payload),
            Err(GatewayError::Rejected { reason }) => {
                info!(attempt = attempt.as_str(), %reason, "credential rejected");
                Err(AuthError::SessionExpired)
            }
            Err(GatewayError::Transport(detail)) => {
                warn!(attempt = attempt.as_str(), %detail, "revalidation failed");
                Err(AuthError::TransportFailure(detail))
            }
            Err(GatewayError::Malformed(detail)) => {
                warn!(attempt = attempt.as_str(), %detail, "revalidation answer unusable");
                Err(AuthError::InvalidResponse(detail))
            }
        };

        match result {
            Ok(identity) => {
                info!(
                    attempt = attempt.as_str(),
                    identity = %identity.id,
                    role = %identity.role,
                    "session revalidated"
                );
                inner.identity = Some(identity.clone());
                inner.credential = Some(credential);
                inner.state = SessionState::Authenticated;
                self.publish(&inner);
                Ok(identity)
            }
            Err(e) => {
                self.reset_locked(&mut inner);
                Err(e)
            }
        }
    }

    fn accept_login(&self, inner: &mut Inner, grant: LoginGrant) -> Result<Identity, AuthError> {
        let identity = self.resolve_identity(grant.identity)?;

        let now = Utc::now();
        let credential = Credential::new(grant.token, now, Some(self.expiry_from(now, grant.expires_at)));
        if let Err(e) = credential.validate_lifetime(now) {
            return Err(AuthError::InvalidResponse(format!("unusable credential issued: {e}")));
        }

        if let Err(e) = self.storage.save(&credential) {
            warn!(error = %e, "could not persist credential");
            return Err(AuthError::Storage(e.to_string()));
        }

        inner.identity = Some(identity.clone());
        inner.credential = Some(credential);
        inner.state = SessionState::Authenticated;
        Ok(identity)
    }

    fn resolve_identity(&self, payload: IdentityPayload) -> Result<Identity, AuthError> {
        let identity = Identity::resolve(payload, &self.table, &self.catalog)
            .map_err(|e| AuthError::InvalidResponse(format!("malformed identity payload: {e}")))?;
        if !identity.is_active() {
            return Err(AuthError::AccountInactive);
        }
        Ok(identity)
    }

    fn expiry_from(&self, now: DateTime<Utc>, issued: Option<DateTime<Utc>>) -> DateTime<Utc> {
        issued.unwrap_or(now + self.credential_ttl)
    }
}

/// Releases the in-flight slot if the owning future is dropped mid-round-trip.
struct AttemptGuard<'a> {
    store: &'a SessionStore,
    attempt: Attempt,
    ticket: u64,
    finished: bool,
}

impl AttemptGuard<'_> {
    /// Mark the attempt as resolved; returns whether it still owns the slot.
    fn finish(&mut self, inner: &Inner) -> bool {
        self.finished = true;
        inner.owns(self.ticket)
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut inner = self.store.lock();
        if !inner.owns(self.ticket) {
            return;
        }
        debug!(attempt = self.attempt.as_str(), "attempt cancelled by caller");
        inner.in_flight = None;
        if inner.state == SessionState::Validating {
            inner.identity = None;
            inner.state = SessionState::Unauthenticated;
        }
        self.store.publish(&inner);
    }
}
