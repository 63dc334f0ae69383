//! Inter-process communication protocol.
//!
//! This module defines the message types exchanged between a front-end (the
//! TUI, or the desktop UI through the generated TypeScript bindings) and the
//! core generation service.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the UI to the core
//! - `Event`: Status updates sent from the core to the UI
//!
//! Progress travels as full `GenerationProgress` snapshots rather than
//! deltas, so a consumer that drops a stale snapshot never ends up with
//! half-applied state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::batch_models::{BatchOptions, BatchProgress, BatchResult, LessonSpec};
use crate::feedback_models::StatusMessage;
use crate::generation_models::{
    EnhancementSuggestions, GenerationConfig, QuickAction, QuickActionResult,
};
use crate::progress_models::GenerationProgress;

/// Operations sent from the UI to the core.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "executeStep",
///   "payload": {
///     "workflow_id": "uuid-here",
///     "index": 1
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Create a workflow for one lesson. Steps come from the named template
    /// or, without one, from the requested content types.
    CreateWorkflow {
        config: GenerationConfig,
        #[serde(default)]
        template: Option<String>,
    },

    /// Execute the step at a 0-based index. Every earlier step must already
    /// be completed or skipped.
    ExecuteStep {
        #[ts(type = "string")]
        workflow_id: Uuid,
        index: usize,
    },

    /// Execute all remaining steps in order, stopping at the first failure.
    RunWorkflow {
        #[ts(type = "string")]
        workflow_id: Uuid,
    },

    SkipStep {
        #[ts(type = "string")]
        workflow_id: Uuid,
        index: usize,
    },

    /// Reset a failed step to pending so it can run again.
    RetryStep {
        #[ts(type = "string")]
        workflow_id: Uuid,
        index: usize,
    },

    /// Stop the workflow. Late progress from in-flight work is discarded.
    CancelWorkflow {
        #[ts(type = "string")]
        workflow_id: Uuid,
    },

    ExecuteQuickAction {
        action: QuickAction,
        config: GenerationConfig,
    },

    StartBatch {
        course_name: String,
        lessons: Vec<LessonSpec>,
        #[serde(default)]
        options: Option<BatchOptions>,
    },

    CancelBatch {
        #[ts(type = "string")]
        batch_id: Uuid,
    },

    /// Ask a provider to review imported material. Answered with
    /// `EnhancementSuggestions`, or an error toast on failure.
    GenerateEnhancementSuggestions {
        imported_content: String,
        #[ts(type = "unknown")]
        analysis: serde_json::Value,
        provider_id: String,
    },

    /// Request a snapshot of every known workflow.
    GetDashboardState,

    /// Shut down the service. Running work is cancelled.
    Shutdown,
}

/// Dashboard row for one workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct WorkflowSummary {
    pub topic: String,
    pub progress: GenerationProgress,
}

/// Events sent from the core to the UI.
///
/// ```json
/// {
///   "type": "progressUpdated",
///   "payload": { "progress": { "pipeline_id": "uuid-here", "epoch": 0, "...": "..." } }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    WorkflowCreated {
        topic: String,
        progress: GenerationProgress,
    },

    /// New progress snapshot. Delivered in non-decreasing `current_step`
    /// order per workflow.
    ProgressUpdated { progress: GenerationProgress },

    /// A line of output from a running step.
    StepLog {
        #[ts(type = "string")]
        workflow_id: Uuid,
        epoch: u32,
        step_id: String,
        line: String,
    },

    /// The workflow was cancelled. `epoch` is the new, post-cancel epoch.
    WorkflowCancelled {
        #[ts(type = "string")]
        workflow_id: Uuid,
        epoch: u32,
    },

    QuickActionCompleted { result: QuickActionResult },

    BatchCreated {
        #[ts(type = "string")]
        batch_id: Uuid,
        course_name: String,
        total_items: usize,
    },

    BatchProgress { progress: BatchProgress },

    BatchCompleted { result: BatchResult },

    EnhancementSuggestions {
        provider_id: String,
        suggestions: EnhancementSuggestions,
    },

    /// Toast for the status-feedback channel.
    Status { message: StatusMessage },

    DashboardState { workflows: Vec<WorkflowSummary> },
}
