//! Static role → module → action table.

use std::collections::HashMap;

use serde::Serialize;

use crate::permissions::{Action, GrantSet, ModuleCatalog, PermissionGrant};
use crate::roles::Role;

/// Role-default grants.
///
/// Used to fill in an identity whose payload carries no explicit grants. The
/// administrator row is informational only: the evaluator short-circuits that
/// role before any lookup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PermissionTable {
    rows: HashMap<Role, GrantSet>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for the metrology console.
    pub fn standard() -> Self {
        use Action::*;

        let all = &Action::ALL[..];
        let domain = [
            ModuleCatalog::EQUIPMENT,
            ModuleCatalog::CALIBRATION,
            ModuleCatalog::WELLS,
            ModuleCatalog::CHEMICAL_ANALYSIS,
            ModuleCatalog::STOCK,
        ];

        let administrator = ModuleCatalog::standard()
            .iter()
            .map(|m| PermissionGrant::allowing(m.clone(), all))
            .collect();

        let supervisor = domain
            .iter()
            .map(|m| PermissionGrant::allowing(m.clone(), &[View, Create, Edit, Delete, Approve]))
            .chain([
                PermissionGrant::allowing(ModuleCatalog::SUPPLIERS, &[View, Create, Edit]),
                PermissionGrant::allowing(ModuleCatalog::REPORTS, &[View, Create]),
                PermissionGrant::allowing(ModuleCatalog::USERS, &[View]),
            ])
            .collect();

        let operator = domain
            .iter()
            .map(|m| PermissionGrant::allowing(m.clone(), &[View, Create, Edit]))
            .chain([
                PermissionGrant::allowing(ModuleCatalog::SUPPLIERS, &[View]),
                PermissionGrant::allowing(ModuleCatalog::REPORTS, &[View]),
            ])
            .collect();

        let viewer = domain
            .iter()
            .cloned()
            .chain([ModuleCatalog::REPORTS])
            .map(|m| PermissionGrant::allowing(m, &[View]))
            .collect();

        Self::new()
            .with_role(Role::Administrator, administrator)
            .with_role(Role::Supervisor, supervisor)
            .with_role(Role::Operator, operator)
            .with_role(Role::Viewer, viewer)
    }

    pub fn with_role(mut self, role: Role, grants: GrantSet) -> Self {
        self.rows.insert(role, grants);
        self
    }

    /// Default grants for `role` (empty when the role has no row).
    pub fn grants_for(&self, role: Role) -> GrantSet {
        self.rows.get(&role).cloned().unwrap_or_default()
    }
}
