//! Generation step models.
//!
//! A generation pipeline is an ordered list of steps. Each step moves through
//! a small, forward-only lifecycle that the UI renders row by row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle status of a single generation step.
///
/// Normal progression: Pending -> InProgress -> Completed.
///
/// A step that fails lands in `Error`. The only way back to `Pending` is an
/// explicit retry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Declared but not started yet.
    Pending,

    /// Currently executing.
    InProgress,

    /// Finished, either executed or skipped.
    Completed,

    /// Failed; `error_message` carries the reason.
    Error,
}

impl StepStatus {
    /// Terminal statuses count towards pipeline completion.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a generation pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct GenerationStep {
    /// Stable key, unique within its pipeline.
    pub id: String,

    /// Human-readable label.
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub status: StepStatus,

    /// Completion percentage in `0..=100`. Only meaningful while in progress.
    pub progress: u8,

    /// Set when the step enters `InProgress`.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Set when the step leaves `InProgress`.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    /// Present iff `status == Error`.
    #[serde(default)]
    pub error_message: Option<String>,

    /// Distinguishes a skipped step from an executed one. Only ever true
    /// together with `status == Completed`.
    #[serde(default)]
    pub skipped: bool,

    /// Optional duration estimate used for progress weighting.
    #[serde(default)]
    pub estimated_duration_secs: Option<u32>,
}

impl GenerationStep {
    /// Create a pending step.
    pub fn pending(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            status: StepStatus::Pending,
            progress: 0,
            start_time: None,
            end_time: None,
            error_message: None,
            skipped: false,
            estimated_duration_secs: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_estimate(mut self, secs: Option<u32>) -> Self {
        self.estimated_duration_secs = secs;
        self
    }

    /// Wall-clock duration of the step, if it has both timestamps.
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                Some((end - start).num_milliseconds().max(0) as f64 / 1000.0)
            }
            _ => None,
        }
    }
}
