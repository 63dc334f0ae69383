//! Batch generation models.
//!
//! A batch runs one generation pipeline per lesson under a shared set of
//! options. Per-lesson outcomes are aggregated into a `BatchResult`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::generation_models::{GeneratedArtifact, GenerationConfig};

/// One lesson to generate within a batch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct LessonSpec {
    pub title: String,
    pub config: GenerationConfig,
}

/// Options shared by every lesson in a batch.
///
/// # Example
///
/// ```toml
/// [batch]
/// parallel_generation = true
/// max_parallel_jobs = 4
/// continue_on_error = true
/// max_retries = 2
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct BatchOptions {
    /// Run lesson generations concurrently instead of one after another.
    pub parallel_generation: bool,

    /// Upper bound on concurrent lesson generations. Values below 1 are
    /// treated as 1.
    pub max_parallel_jobs: usize,

    /// When false, the first lesson failure stops the batch.
    pub continue_on_error: bool,

    /// When false, artifacts of successful lessons are discarded if any
    /// lesson in the batch failed.
    pub save_partial_results: bool,

    pub retry_failed_items: bool,

    /// Retries per lesson after the first attempt.
    pub max_retries: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel_generation: false,
            max_parallel_jobs: 3,
            continue_on_error: true,
            save_partial_results: true,
            retry_failed_items: true,
            max_retries: 2,
        }
    }
}

impl BatchOptions {
    /// Total attempts a lesson gets, first try included.
    pub fn max_attempts(&self) -> u32 {
        if self.retry_failed_items {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

/// What happened to one lesson.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LessonOutcome {
    Succeeded {
        attempts: u32,
        artifacts: Vec<GeneratedArtifact>,
    },
    Failed {
        attempts: u32,
        error: String,
    },
    /// Started, but the batch was cancelled before the lesson finished.
    Cancelled { attempts: u32 },
    /// Never started, because the batch stopped early or was cancelled.
    NotAttempted,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct LessonResult {
    pub index: usize,
    pub title: String,
    pub outcome: LessonOutcome,
}

/// Aggregated batch outcome.
///
/// `successful_items + failed_items <= total_items`; the two sides are equal
/// only when the batch ran to completion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct BatchResult {
    #[ts(type = "string")]
    pub batch_id: Uuid,
    pub course_name: String,
    pub total_items: usize,
    pub successful_items: usize,
    pub failed_items: usize,
    /// Seconds.
    pub total_elapsed_time: f64,
    pub lessons: Vec<LessonResult>,
}

impl BatchResult {
    pub fn ran_to_completion(&self) -> bool {
        self.successful_items + self.failed_items == self.total_items
    }

    pub fn not_attempted(&self) -> usize {
        self.lessons
            .iter()
            .filter(|l| matches!(l.outcome, LessonOutcome::NotAttempted))
            .count()
    }
}

/// Progress snapshot emitted while a batch runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct BatchProgress {
    #[ts(type = "string")]
    pub batch_id: Uuid,
    pub completed_items: usize,
    pub total_items: usize,
    /// `round(100 * completed_items / total_items)`.
    pub progress_percent: u8,
    #[serde(default)]
    pub current_lesson: Option<String>,
}

impl BatchProgress {
    pub fn new(batch_id: Uuid, completed_items: usize, total_items: usize) -> Self {
        Self {
            batch_id,
            completed_items,
            total_items,
            progress_percent: percent_of(completed_items, total_items),
            current_lesson: None,
        }
    }
}

/// Rounded percentage; an empty batch counts as complete.
pub fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (100.0 * completed as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}
