//! Generation progress tracking.
//!
//! - [`tracker`]: the step state machine that owns a `GenerationProgress`
//! - [`weighting`]: aggregate progress computation
//! - [`feed`]: stale/out-of-order snapshot filtering for consumers

pub mod error;
pub mod feed;
pub mod tracker;
pub mod weighting;

pub use error::{TransitionError, TransitionResult};
pub use feed::{FeedDecision, ProgressFeed};
pub use tracker::ProgressTracker;
