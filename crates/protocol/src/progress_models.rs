//! Aggregate pipeline progress.
//!
//! `GenerationProgress` is owned by the orchestrator and is read-only to the
//! UI. Every snapshot carries the pipeline id and an epoch so that consumers
//! can discard updates from runs that have since been cancelled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::step_models::{GenerationStep, StepStatus};

/// Snapshot of a generation pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct GenerationProgress {
    #[ts(type = "string")]
    pub pipeline_id: Uuid,

    /// Staleness token. Bumped on cancellation; snapshots carrying an older
    /// epoch than the consumer has seen must be dropped.
    pub epoch: u32,

    /// 1-based position of the active step.
    pub current_step: usize,

    pub total_steps: usize,

    /// Aggregate completion percentage in `0.0..=100.0`. Never decreases
    /// while the pipeline is not cancelled.
    pub overall_progress: f64,

    /// Steps in execution order. The order is fixed at creation.
    pub steps: Vec<GenerationStep>,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// Seconds since the first step started.
    pub elapsed_time: f64,

    /// Estimated seconds until completion. An approximation.
    pub remaining_time: f64,

    pub estimated_total_time: f64,

    #[serde(default)]
    pub cancelled: bool,
}

impl GenerationProgress {
    /// True once every step is completed or errored.
    pub fn is_generation_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status.is_terminal())
    }

    pub fn has_errors(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Error)
    }

    pub fn step(&self, id: &str) -> Option<&GenerationStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// The step `current_step` points at, if any.
    pub fn active_step(&self) -> Option<&GenerationStep> {
        self.current_step
            .checked_sub(1)
            .and_then(|index| self.steps.get(index))
    }

    pub fn count_with_status(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}
