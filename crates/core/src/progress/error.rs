//! Errors raised when a step transition is not allowed.

use ck_protocol::StepStatus;
use thiserror::Error;

/// A rejected state transition. The tracker is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Unknown step '{0}'")]
    UnknownStep(String),

    #[error("Step '{step}' cannot {action} while {status}")]
    InvalidTransition {
        step: String,
        action: &'static str,
        status: StepStatus,
    },

    #[error("Step '{step}' cannot run before '{blocked_by}' is completed or skipped")]
    OutOfOrder { step: String, blocked_by: String },

    #[error("Step index {index} is out of range (pipeline has {total} steps)")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("Pipeline has been cancelled")]
    Cancelled,
}

pub type TransitionResult<T> = Result<T, TransitionError>;
