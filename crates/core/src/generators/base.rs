//! Base abstractions for content generators.
//!
//! A content generator turns one step of a lesson pipeline into content. It
//! reports progress, log lines, and finished artifacts as a stream of
//! [`GeneratorEvent`]s. All backends (a local command, a mock) implement the
//! [`ContentGenerator`] trait.

use async_trait::async_trait;
use ck_protocol::{GeneratedArtifact, GenerationConfig, StepDefinition};
use serde::Serialize;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;
use uuid::Uuid;

/// Everything a generator needs to produce one step's content.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Pipeline the step belongs to, if any.
    pub workflow_id: Option<Uuid>,

    pub step: StepDefinition,

    pub config: GenerationConfig,

    /// Artifacts produced by earlier steps of the same pipeline.
    pub context: Vec<GeneratedArtifact>,

    /// Free-form input for steps that work on existing material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(step: StepDefinition, config: GenerationConfig) -> Self {
        Self {
            workflow_id: None,
            step,
            config,
            context: Vec::new(),
            input: None,
        }
    }

    pub fn for_workflow(mut self, workflow_id: Uuid) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }

    pub fn with_context(mut self, context: Vec<GeneratedArtifact>) -> Self {
        self.context = context;
        self
    }

    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = Some(input);
        self
    }
}

/// Events emitted while a generator runs.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorEvent {
    /// Step-level completion percentage.
    Progress(u8),

    /// A line of human-readable output.
    Log(String),

    Artifact(GeneratedArtifact),

    /// The step finished successfully.
    Completed,
}

/// Errors that can occur during generation. Messages are shown to the user
/// as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Generator not available: {0}")]
    NotAvailable(String),

    #[error("Generation backend failed: {0}")]
    Backend(String),

    #[error("Stream parsing error: {0}")]
    StreamParse(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;

pub type GeneratorStream = Pin<Box<dyn Stream<Item = GeneratorResult<GeneratorEvent>> + Send>>;

/// Core trait that every generation backend implements.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Returns true if the backend can currently be used.
    async fn check_availability(&self) -> bool;

    /// Starts generating content for one step.
    ///
    /// # Errors
    ///
    /// Returns a `GeneratorError` if the backend cannot be started. Failures
    /// after start are reported as `Err` items on the stream.
    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<GeneratorStream>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ck_protocol::ContentType;
    use tokio_stream::StreamExt;

    struct EchoGenerator;

    #[async_trait]
    impl ContentGenerator for EchoGenerator {
        async fn check_availability(&self) -> bool {
            true
        }

        async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<GeneratorStream> {
            let artifact = GeneratedArtifact {
                content_type: request.step.content_type.clone(),
                title: request.config.topic.clone(),
                body: format!("{} for {}", request.step.name, request.config.audience),
            };
            Ok(Box::pin(tokio_stream::iter(vec![
                Ok(GeneratorEvent::Progress(50)),
                Ok(GeneratorEvent::Artifact(artifact)),
                Ok(GeneratorEvent::Completed),
            ])))
        }
    }

    #[tokio::test]
    async fn test_generator_stream_carries_request_data() {
        let step = StepDefinition::new("slides", "Generate slides").with_content_type(ContentType::Slides);
        let request = GenerationRequest::new(step, GenerationConfig::new("Fractions", "Grade 4"));

        let events: Vec<_> = EchoGenerator
            .generate(&request)
            .await
            .expect("start")
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("events");

        assert_eq!(events.len(), 3);
        match &events[1] {
            GeneratorEvent::Artifact(a) => {
                assert_eq!(a.title, "Fractions");
                assert_eq!(a.content_type, Some(ContentType::Slides));
                assert!(a.body.contains("Grade 4"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_request_serializes_without_empty_input() {
        let request = GenerationRequest::new(
            StepDefinition::new("objectives", "Refine objectives"),
            GenerationConfig::new("Fractions", "Grade 4"),
        );
        let json = serde_json::to_value(&request).expect("serialize");
        assert!(json.get("input").is_none());
        assert_eq!(json["config"]["topic"], "Fractions");
        assert_eq!(json["step"]["id"], "objectives");
    }
}
