//! Pipeline template models for `.curriculum-kit/pipelines/*.yaml`.
//!
//! A template fixes the ordered list of steps a lesson workflow runs. When no
//! template is given, the plan is derived from the requested content types.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::generation_models::ContentType;

/// Declaration of one pipeline stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct StepDefinition {
    /// Stable step key, unique within the template.
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Artifact kind produced by the step, if any.
    #[serde(default)]
    pub content_type: Option<ContentType>,

    /// Used for duration-weighted progress when every step declares one.
    #[serde(default)]
    pub estimated_duration_secs: Option<u32>,

    /// Generator profile to use; falls back to the default generator.
    #[serde(default)]
    pub generator: Option<String>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            content_type: None,
            estimated_duration_secs: None,
            generator: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_estimate(mut self, secs: u32) -> Self {
        self.estimated_duration_secs = Some(secs);
        self
    }
}

/// A named, reusable step plan.
///
/// # Example
///
/// ```yaml
/// name: quick-review
/// description: Slides plus a short quiz
/// steps:
///   - id: objectives
///     name: Refine learning objectives
///     estimated-duration-secs: 20
///   - id: slides
///     name: Generate slides
///     content-type: slides
///     estimated-duration-secs: 90
///   - id: quiz
///     name: Generate quiz
///     content-type: quiz
///     estimated-duration-secs: 60
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineTemplate {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub steps: Vec<StepDefinition>,
}
