//! Multi-lesson batch generation.

pub mod error;
pub mod runner;

pub use error::{BatchError, BatchRunResult};
pub use runner::BatchRunner;
