//! `metroconsole-core` — identifiers and error primitives shared by the
//! session, authorization, notification and navigation crates.
//!
//! This crate has no IO and no async code.

pub mod error;
pub mod id;

pub use error::{CoreError, CoreResult};
pub use id::{IdentityId, NotificationId};
