//! Lesson workflows.
//!
//! - [`plan`]: derives the step list for a lesson or quick action
//! - [`state`]: the `Workflow` being executed
//! - [`engine`]: runs steps through generators and reports progress
//! - [`cancel`]: cancellation handle

pub mod cancel;
pub mod engine;
pub mod error;
pub mod plan;
pub mod state;

pub use cancel::CancelHandle;
pub use engine::{find_template, QuickActionOutcome, WorkflowEngine};
pub use error::{WorkflowError, WorkflowResult};
pub use state::Workflow;
