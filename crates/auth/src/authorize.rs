use serde::Serialize;
use thiserror::Error;

use crate::identity::{AccountStatus, Identity};
use crate::permissions::{Action, ModuleName};
use crate::roles::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no authenticated identity")]
    Unauthenticated,

    #[error("forbidden: missing '{action}' on module '{module}'")]
    Forbidden { module: String, action: String },
}

/// Can `identity` perform `action` on `module`?
///
/// - No identity, or an inactive one: `false`.
/// - Administrator: `true` for every module and action.
/// - Otherwise: the identity's grant for `module`, `false` when absent.
///
/// Pure: no IO, no caching, no logging above `trace`.
pub fn can(identity: Option<&Identity>, module: &ModuleName, action: Action) -> bool {
    decide(identity, module.as_str(), action).is_granted()
}

/// String form of [`can`] for UI decision points.
///
/// Unknown action names are denied, never an error.
pub fn can_perform(identity: Option<&Identity>, module: &str, action: &str) -> bool {
    match action.parse::<Action>() {
        Ok(action) => decide(identity, module, action).is_granted(),
        Err(_) => {
            tracing::trace!(module, action, "unknown action denied");
            false
        }
    }
}

/// [`can`] for call sites that want a `Result`.
pub fn authorize(
    identity: Option<&Identity>,
    module: &ModuleName,
    action: Action,
) -> Result<(), AuthzError> {
    match decide(identity, module.as_str(), action) {
        Decision::Granted(_) => Ok(()),
        Decision::Denied(DenialKind::NoIdentity | DenialKind::InactiveAccount) => {
            Err(AuthzError::Unauthenticated)
        }
        Decision::Denied(_) => Err(AuthzError::Forbidden {
            module: module.to_string(),
            action: action.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    AdministratorOverride,
    ExplicitGrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoIdentity,
    InactiveAccount,
    NoGrantForModule,
    ActionNotGranted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Granted(GrantKind),
    Denied(DenialKind),
}

impl Decision {
    fn is_granted(self) -> bool {
        matches!(self, Decision::Granted(_))
    }
}

// The administrator override is checked here and nowhere else.
fn decide(identity: Option<&Identity>, module: &str, action: Action) -> Decision {
    let Some(identity) = identity else {
        return Decision::Denied(DenialKind::NoIdentity);
    };
    if identity.status != AccountStatus::Active {
        return Decision::Denied(DenialKind::InactiveAccount);
    }
    if identity.role.is_administrator() {
        return Decision::Granted(GrantKind::AdministratorOverride);
    }
    match identity.grants.get(module) {
        None => Decision::Denied(DenialKind::NoGrantForModule),
        Some(grant) if grant.allows(action) => Decision::Granted(GrantKind::ExplicitGrant),
        Some(_) => Decision::Denied(DenialKind::ActionNotGranted),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision, for admin screens and
/// support tooling.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub module: String,
    pub action: Action,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub identity: Option<IdentityState>,
    pub granted_by: Option<GrantKind>,
    pub denial: Option<DenialKind>,
}

/// The parts of an identity that fed the decision.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityState {
    pub id: String,
    pub role: Role,
    pub status: AccountStatus,
    /// Actions granted on the requested module, in declaration order.
    pub module_actions: Vec<Action>,
}

/// Explain why [`can`] returns what it returns for these arguments.
pub fn explain_authorization(
    identity: Option<&Identity>,
    module: &ModuleName,
    action: Action,
) -> AuthorizationExplanation {
    let decision = decide(identity, module.as_str(), action);

    let state = identity.map(|i| IdentityState {
        id: i.id.to_string(),
        role: i.role,
        status: i.status,
        module_actions: i
            .grants
            .get(module.as_str())
            .map(|g| g.allowed_actions())
            .unwrap_or_default(),
    });

    let reason = match decision {
        Decision::Granted(GrantKind::AdministratorOverride) => {
            "Identity holds the Administrator role, which is granted everything".to_string()
        }
        Decision::Granted(GrantKind::ExplicitGrant) => {
            format!("Identity has '{action}' granted on module '{module}'")
        }
        Decision::Denied(DenialKind::NoIdentity) => "No identity is logged in".to_string(),
        Decision::Denied(DenialKind::InactiveAccount) => {
            "Identity's account is inactive and is treated as unauthenticated".to_string()
        }
        Decision::Denied(DenialKind::NoGrantForModule) => {
            format!("Identity has no grant for module '{module}'")
        }
        Decision::Denied(DenialKind::ActionNotGranted) => {
            format!("Identity's grant for module '{module}' does not include '{action}'")
        }
    };

    let (granted_by, denial) = match decision {
        Decision::Granted(kind) => (Some(kind), None),
        Decision::Denied(kind) => (None, Some(kind)),
    };

    AuthorizationExplanation {
        module: module.to_string(),
        action,
        granted: decision.is_granted(),
        reason,
        identity: state,
        granted_by,
        denial,
    }
}
