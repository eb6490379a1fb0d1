//! Actions, module names and per-module permission grants.

use std::borrow::Cow;
use std::collections::HashSet;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use metroconsole_core::CoreError;

/// An operation a principal may attempt on a module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
    Configure,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Approve,
        Action::Configure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Configure => "configure",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            "approve" => Ok(Action::Approve),
            "configure" => Ok(Action::Configure),
            _ => Err(CoreError::unknown_action(s)),
        }
    }
}

/// Name of a console module (e.g. `"stock"`).
///
/// Names are opaque strings at this layer; [`ModuleCatalog`] decides which are
/// known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(Cow<'static, str>);

impl ModuleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ModuleName {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

/// The fixed set of modules a grant may name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCatalog {
    modules: Vec<ModuleName>,
}

impl ModuleCatalog {
    pub const EQUIPMENT: ModuleName = ModuleName::from_static("equipment");
    pub const CALIBRATION: ModuleName = ModuleName::from_static("calibration");
    pub const WELLS: ModuleName = ModuleName::from_static("wells");
    pub const CHEMICAL_ANALYSIS: ModuleName = ModuleName::from_static("chemical_analysis");
    pub const STOCK: ModuleName = ModuleName::from_static("stock");
    pub const SUPPLIERS: ModuleName = ModuleName::from_static("suppliers");
    pub const REPORTS: ModuleName = ModuleName::from_static("reports");
    pub const USERS: ModuleName = ModuleName::from_static("users");
    pub const SETTINGS: ModuleName = ModuleName::from_static("settings");

    /// The metrology console's module set.
    pub fn standard() -> Self {
        Self::new([
            Self::EQUIPMENT,
            Self::CALIBRATION,
            Self::WELLS,
            Self::CHEMICAL_ANALYSIS,
            Self::STOCK,
            Self::SUPPLIERS,
            Self::REPORTS,
            Self::USERS,
            Self::SETTINGS,
        ])
    }

    /// Build a catalog; duplicates are dropped, declaration order is kept.
    pub fn new(modules: impl IntoIterator<Item = ModuleName>) -> Self {
        let mut seen = HashSet::new();
        let modules = modules
            .into_iter()
            .filter(|m| seen.insert(m.clone()))
            .collect();
        Self { modules }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m.as_str() == module)
    }

    /// Resolve a name to its catalog entry.
    pub fn resolve(&self, module: &str) -> Result<ModuleName, CoreError> {
        self.modules
            .iter()
            .find(|m| m.as_str() == module)
            .cloned()
            .ok_or_else(|| CoreError::unknown_module(module))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleName> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Per-module grant: one boolean per [`Action`].
///
/// Wire shape: `{"module": "stock", "view": true, "edit": false}`; omitted
/// actions are not granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub module: ModuleName,
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub approve: bool,
    #[serde(default)]
    pub configure: bool,
}

impl PermissionGrant {
    /// A grant for `module` with every action denied.
    pub fn none(module: impl Into<ModuleName>) -> Self {
        Self {
            module: module.into(),
            view: false,
            create: false,
            edit: false,
            delete: false,
            approve: false,
            configure: false,
        }
    }

    /// A grant for `module` allowing exactly `actions`.
    pub fn allowing(module: impl Into<ModuleName>, actions: &[Action]) -> Self {
        actions
            .iter()
            .fold(Self::none(module), |grant, action| grant.with(*action, true))
    }

    pub fn with(mut self, action: Action, granted: bool) -> Self {
        *self.flag_mut(action) = granted;
        self
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
            Action::Approve => self.approve,
            Action::Configure => self.configure,
        }
    }

    /// Actions this grant allows, in [`Action::ALL`] order.
    pub fn allowed_actions(&self) -> Vec<Action> {
        Action::ALL.into_iter().filter(|a| self.allows(*a)).collect()
    }

    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::View => &mut self.view,
            Action::Create => &mut self.create,
            Action::Edit => &mut self.edit,
            Action::Delete => &mut self.delete,
            Action::Approve => &mut self.approve,
            Action::Configure => &mut self.configure,
        }
    }
}

/// Ordered set of grants, at most one per module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PermissionGrant>", into = "Vec<PermissionGrant>")]
pub struct GrantSet(Vec<PermissionGrant>);

impl GrantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant for `module`, if one is present.
    pub fn get(&self, module: &str) -> Option<&PermissionGrant> {
        self.0.iter().find(|g| g.module.as_str() == module)
    }

    pub fn allows(&self, module: &str, action: Action) -> bool {
        self.get(module).is_some_and(|g| g.allows(action))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionGrant> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop grants naming modules outside `catalog`, returning the dropped names.
    pub fn retain_catalog(&mut self, catalog: &ModuleCatalog) -> Vec<ModuleName> {
        let mut dropped = Vec::new();
        self.0.retain(|g| {
            let known = catalog.contains(g.module.as_str());
            if !known {
                dropped.push(g.module.clone());
            }
            known
        });
        dropped
    }
}

impl FromIterator<PermissionGrant> for GrantSet {
    /// Keeps the first grant seen for each module.
    fn from_iter<I: IntoIterator<Item = PermissionGrant>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        Self(
            iter.into_iter()
                .filter(|g| seen.insert(g.module.clone()))
                .collect(),
        )
    }
}

impl From<Vec<PermissionGrant>> for GrantSet {
    fn from(value: Vec<PermissionGrant>) -> Self {
        value.into_iter().collect()
    }
}

impl From<GrantSet> for Vec<PermissionGrant> {
    fn from(value: GrantSet) -> Self {
        value.0
    }
}
