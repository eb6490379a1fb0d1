//! `metroconsole-notifications` — the in-app notification feed.
//!
//! The feed is newest-first. Non-error notifications expire on their own
//! after a severity-specific delay; error notifications stay until dismissed.

pub mod expiry;
pub mod notification;
pub mod store;

pub use expiry::ExpiryPolicy;
pub use notification::{Notification, NotificationInput, Severity};
pub use store::{FeedSnapshot, NotificationStore};

pub use metroconsole_core::NotificationId;
