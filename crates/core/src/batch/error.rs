//! Errors raised by the batch runner.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Batch {0} not found")]
    NotFound(Uuid),

    #[error("Batch {0} has already been started")]
    AlreadyStarted(Uuid),
}

pub type BatchRunResult<T> = Result<T, BatchError>;
