//! Errors raised by the workflow engine.

use crate::generators::GeneratorError;
use crate::progress::TransitionError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Workflow {0} not found")]
    NotFound(Uuid),

    #[error("Unknown pipeline template '{0}'")]
    UnknownTemplate(String),

    #[error("Invalid lesson configuration: {0}")]
    InvalidConfig(String),

    #[error("Step '{step_id}' failed: {source}")]
    StepFailed {
        index: usize,
        step_id: String,
        #[source]
        source: GeneratorError,
    },

    #[error("Workflow was cancelled")]
    Cancelled,

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl WorkflowError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            WorkflowError::Cancelled | WorkflowError::Transition(TransitionError::Cancelled)
        )
    }

    /// Index of the failed step, for errors that leave a step in `Error`.
    pub fn failed_step(&self) -> Option<usize> {
        match self {
            WorkflowError::StepFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
