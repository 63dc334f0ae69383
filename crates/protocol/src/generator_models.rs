//! Generator profile models for `.curriculum-kit/generators/*.md`.
//!
//! A generator profile names a content generation backend. Profiles are
//! Markdown files with YAML front matter; the body is the system prompt
//! handed to the backend.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Configuration of one content generator.
///
/// # Example
///
/// ```markdown
/// ---
/// name: lesson-writer
/// description: Drafts lesson material with a hosted LLM
/// provider: openai
/// model: gpt-4o
/// command: lesson-gen
/// args: ["--stream"]
/// ---
///
/// You are an experienced instructional designer. Write material that is
/// accurate, age-appropriate and aligned to the stated objectives.
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct GeneratorProfile {
    /// Unique identifier; referenced by `StepDefinition::generator` and by
    /// `default_generator` in `config.toml`.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// LLM provider id, e.g. "openai", "anthropic", "ollama" or "mock".
    pub provider: String,

    #[serde(default)]
    pub model: String,

    /// Executable implementing the generation command layer. When absent
    /// the generator is resolved by provider alone.
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Markdown body of the profile file; not part of the front matter.
    #[serde(skip)]
    pub system_prompt: String,
}
