//! Authenticated principal.

use serde::{Deserialize, Serialize};

use metroconsole_core::{CoreError, IdentityId};

use crate::permissions::{GrantSet, ModuleCatalog, PermissionGrant};
use crate::roles::Role;
use crate::table::PermissionTable;

/// Account status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountStatus {
    /// Account may authenticate and act.
    #[default]
    #[serde(alias = "Ativo", alias = "active")]
    Active,
    /// Account exists but must be treated as unauthenticated.
    #[serde(alias = "Inativo", alias = "inactive")]
    Inactive,
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "Active"),
            AccountStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

/// Identity as it arrives from the login and validation endpoints.
///
/// `grants` is optional: older backends send only the role and expect the
/// console to apply the role defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub grants: Option<Vec<PermissionGrant>>,
}

/// The authenticated principal the evaluator reasons about.
///
/// Replaced wholesale on re-login; never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub grants: GrantSet,
}

impl Identity {
    pub fn new(id: IdentityId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
            status: AccountStatus::Active,
            grants: GrantSet::new(),
        }
    }

    pub fn with_grants(mut self, grants: impl Into<GrantSet>) -> Self {
        self.grants = grants.into();
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn is_administrator(&self) -> bool {
        self.role.is_administrator()
    }

    /// Build an identity from a backend payload.
    ///
    /// Explicit grants are authoritative; a payload without grants gets the
    /// role defaults from `table`. Grants naming modules outside `catalog` are
    /// dropped.
    pub fn resolve(
        payload: IdentityPayload,
        table: &PermissionTable,
        catalog: &ModuleCatalog,
    ) -> Result<Self, CoreError> {
        let id = IdentityId::new(payload.id)?;

        let display_name = payload.display_name.trim();
        if display_name.is_empty() {
            return Err(CoreError::validation("display name cannot be empty"));
        }

        let mut grants = match payload.grants {
            Some(explicit) => GrantSet::from(explicit),
            None => table.grants_for(payload.role),
        };

        let dropped = grants.retain_catalog(catalog);
        if !dropped.is_empty() {
            tracing::warn!(
                identity = %id,
                modules = ?dropped,
                "dropping grants for modules outside the catalog"
            );
        }

        Ok(Self {
            id,
            display_name: display_name.to_string(),
            role: payload.role,
            status: payload.status,
            grants,
        })
    }
}
