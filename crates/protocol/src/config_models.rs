//! Global configuration models for `.curriculum-kit/config.toml`.
//!
//! This module defines the project-wide settings that apply to every
//! workflow and batch.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

use crate::batch_models::BatchOptions;

/// How per-step completion is combined into `overall_progress`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
pub enum ProgressWeighting {
    /// Weight by estimated duration when every step declares one, otherwise
    /// equal weights.
    #[default]
    Auto,
    /// Always weight steps equally.
    Equal,
}

/// Represents global settings from `.curriculum-kit/config.toml`.
///
/// # Example
///
/// ```toml
/// # .curriculum-kit/config.toml
/// default_generator = "lesson-writer"
/// progress_weighting = "auto"
/// event_buffer = 256
///
/// [batch]
/// parallel_generation = true
/// max_parallel_jobs = 4
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(default)]
pub struct GlobalConfig {
    /// Generator profile used for steps that do not name one.
    pub default_generator: Option<String>,

    pub progress_weighting: ProgressWeighting,

    /// Capacity of the core-to-UI event channel.
    pub event_buffer: usize,

    /// Defaults applied to batches that do not override them.
    pub batch: BatchOptions,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_generator: None,
            progress_weighting: ProgressWeighting::default(),
            event_buffer: 256,
            batch: BatchOptions::default(),
        }
    }
}
