use core::str::FromStr;

use serde::{Deserialize, Serialize};

use metroconsole_core::CoreError;

/// Console role.
///
/// The set is closed. The backend speaks Portuguese role names
/// (`"Administrador"`, `"Operador"`, ...); both those and the English names are
/// accepted on the wire and by [`FromStr`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "Administrador", alias = "administrator", alias = "admin")]
    Administrator,
    #[serde(alias = "supervisor")]
    Supervisor,
    #[serde(alias = "Operador", alias = "operator")]
    Operator,
    #[serde(alias = "Visualizador", alias = "viewer")]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::Supervisor,
        Role::Operator,
        Role::Viewer,
    ];

    /// The single role that carries the global override.
    pub fn is_administrator(self) -> bool {
        matches!(self, Role::Administrator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Supervisor => "Supervisor",
            Role::Operator => "Operator",
            Role::Viewer => "Viewer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "administrator" | "administrador" | "admin" => Ok(Role::Administrator),
            "supervisor" => Ok(Role::Supervisor),
            "operator" | "operador" => Ok(Role::Operator),
            "viewer" | "visualizador" => Ok(Role::Viewer),
            _ => Err(CoreError::unknown_role(s)),
        }
    }
}
