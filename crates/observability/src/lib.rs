//! Process-wide tracing setup.

/// Initialize process-wide tracing with the defaults (`RUST_LOG`, else `info`; JSON).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

pub use self::tracing::{DEFAULT_FILTER, init_with};

/// Tracing configuration (filters, layers).
pub mod tracing;
