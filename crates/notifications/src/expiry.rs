use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::notification::Severity;

/// How long each severity stays in the feed before expiring.
///
/// Errors never expire. Durations are configured in milliseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryPolicy {
    pub info_ms: u64,
    pub success_ms: u64,
    pub warning_ms: u64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            info_ms: 5_000,
            success_ms: 5_000,
            warning_ms: 8_000,
        }
    }
}

impl ExpiryPolicy {
    pub fn with_info(mut self, delay: Duration) -> Self {
        self.info_ms = millis(delay);
        self
    }

    pub fn with_success(mut self, delay: Duration) -> Self {
        self.success_ms = millis(delay);
        self
    }

    pub fn with_warning(mut self, delay: Duration) -> Self {
        self.warning_ms = millis(delay);
        self
    }

    /// Delay before a notification of `severity` is removed; `None` = never.
    pub fn delay_for(&self, severity: Severity) -> Option<Duration> {
        match severity {
            Severity::Info => Some(Duration::from_millis(self.info_ms)),
            Severity::Success => Some(Duration::from_millis(self.success_ms)),
            Severity::Warning => Some(Duration::from_millis(self.warning_ms)),
            Severity::Error => None,
        }
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
