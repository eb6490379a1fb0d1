//! `metroconsole-auth` — pure authorization boundary for the console.
//!
//! No IO and no async: identities arrive already resolved from the session
//! layer, and every decision here is a function of its arguments.

pub mod authorize;
pub mod credential;
pub mod identity;
pub mod permissions;
pub mod roles;
pub mod table;

pub use authorize::{
    AuthorizationExplanation, AuthzError, DenialKind, GrantKind, IdentityState, authorize, can,
    can_perform, explain_authorization,
};
pub use credential::{Credential, CredentialLifetimeError};
pub use identity::{AccountStatus, Identity, IdentityPayload};
pub use permissions::{Action, GrantSet, ModuleCatalog, ModuleName, PermissionGrant};
pub use roles::Role;
pub use table::PermissionTable;
