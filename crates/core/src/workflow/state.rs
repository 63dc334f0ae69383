//! A single lesson workflow: its step plan, tracker, and produced artifacts.

use ck_protocol::{GeneratedArtifact, GenerationConfig, GenerationProgress, StepDefinition};
use uuid::Uuid;

use super::cancel::CancelHandle;
use super::error::WorkflowResult;
use crate::progress::ProgressTracker;

pub struct Workflow {
    pub(crate) id: Uuid,
    pub(crate) topic: String,
    pub(crate) config: GenerationConfig,
    pub(crate) definitions: Vec<StepDefinition>,
    pub(crate) tracker: ProgressTracker,
    pub(crate) artifacts: Vec<GeneratedArtifact>,
    pub(crate) cancel: CancelHandle,
}

impl Workflow {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    pub fn progress(&self) -> &GenerationProgress {
        self.tracker.progress()
    }

    /// Current progress with timing fields refreshed.
    pub fn snapshot(&self) -> GenerationProgress {
        self.tracker.snapshot()
    }

    pub fn artifacts(&self) -> &[GeneratedArtifact] {
        &self.artifacts
    }

    pub fn take_artifacts(&mut self) -> Vec<GeneratedArtifact> {
        std::mem::take(&mut self.artifacts)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.tracker.is_cancelled()
    }

    /// Marks a pending step as skipped.
    pub fn skip_step(&mut self, index: usize) -> WorkflowResult<()> {
        let id = self.tracker.step_id_at(index)?.to_string();
        self.tracker.skip_step(&id)?;
        Ok(())
    }

    /// Resets a failed step so it can run again.
    pub fn retry_step(&mut self, index: usize) -> WorkflowResult<()> {
        let id = self.tracker.step_id_at(index)?.to_string();
        self.tracker.retry_step(&id)?;
        Ok(())
    }

    /// Applies a cancellation request to the tracker.
    ///
    /// Returns the new epoch the first time, `None` afterwards.
    pub fn acknowledge_cancel(&mut self) -> Option<u32> {
        self.cancel.cancel();
        self.tracker.cancel()
    }
}
