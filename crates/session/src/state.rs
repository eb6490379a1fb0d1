use serde::Serialize;

use metroconsole_auth::Identity;

/// Session lifecycle.
///
/// `Unknown` only exists before the first decision; `Validating` is always
/// transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Unknown,
    Validating,
    Authenticated,
    Unauthenticated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unknown => "unknown",
            SessionState::Validating => "validating",
            SessionState::Authenticated => "authenticated",
            SessionState::Unauthenticated => "unauthenticated",
        }
    }
}

impl core::fmt::Display for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What subscribers see after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub identity: Option<Identity>,
    /// A login or revalidation round trip is in flight.
    pub loading: bool,
}
