//! `metroconsole-session` — who is logged in, with which credential.
//!
//! [`SessionStore`] is the single writer of session state. It talks to the
//! backend through an [`AuthGateway`] and persists the bearer credential
//! through a [`CredentialStorage`]; both are injected so a real credential
//! verifier can replace the development one without touching the store.

pub mod error;
pub mod gateway;
#[cfg(feature = "http")]
pub mod http;
pub mod state;
pub mod storage;
pub mod store;

pub use error::{AuthError, GatewayError, StorageError};
pub use gateway::{AuthGateway, DevAuthGateway, LoginGrant, LoginRequest};
#[cfg(feature = "http")]
pub use http::HttpAuthGateway;
pub use state::{SessionSnapshot, SessionState};
pub use storage::{CredentialStorage, FileCredentialStorage, MemoryCredentialStorage};
pub use store::SessionStore;
