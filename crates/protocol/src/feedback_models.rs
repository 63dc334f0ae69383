//! Transient status feedback shown to the author.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A dismissible toast message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StatusMessage {
    pub severity: Severity,
    pub message: String,
    /// Auto-dismiss after this many milliseconds. `None` stays until dismissed.
    #[serde(default)]
    pub duration_ms: Option<u32>,
}

impl StatusMessage {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        let duration_ms = match severity {
            Severity::Error => None,
            Severity::Warning => Some(6_000),
            Severity::Info | Severity::Success => Some(4_000),
        };
        Self {
            severity,
            message: message.into(),
            duration_ms,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_duration_ms(mut self, duration_ms: Option<u32>) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}
