//! `metroconsole-console`
//!
//! Wires the session store, notification feed and navigation gate together
//! from configuration, and hosts the `metroconsole` binary.

pub mod cli;
pub mod config;
pub mod context;

pub use cli::{Args, Command};
pub use config::{ConsoleConfig, GatewayKind};
pub use context::{ConsoleContext, ConsoleReport};
