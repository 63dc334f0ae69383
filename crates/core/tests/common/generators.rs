//! Test-only generators with controllable behavior.

use async_trait::async_trait;
use ck_core::generators::{
    ContentGenerator, GenerationRequest, GeneratorError, GeneratorEvent, GeneratorResult,
    GeneratorStream,
};
use ck_protocol::GeneratedArtifact;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;

fn artifact(request: &GenerationRequest) -> GeneratedArtifact {
    GeneratedArtifact {
        content_type: request.step.content_type.clone(),
        title: format!("{}: {}", request.config.topic, request.step.name),
        body: format!("{} draft", request.step.name),
    }
}

fn succeed(request: &GenerationRequest) -> GeneratorStream {
    Box::pin(tokio_stream::iter(vec![
        Ok(GeneratorEvent::Progress(50)),
        Ok(GeneratorEvent::Artifact(artifact(request))),
        Ok(GeneratorEvent::Completed),
    ]))
}

fn fail(message: String) -> GeneratorStream {
    Box::pin(tokio_stream::iter(vec![
        Ok(GeneratorEvent::Progress(10)),
        Err(GeneratorError::Backend(message)),
    ]))
}

/// Fails every step whose id is in the set; succeeds on the rest.
#[allow(dead_code)]
pub struct StepFailingGenerator {
    failing_steps: HashSet<String>,
}

impl StepFailingGenerator {
    #[allow(dead_code)]
    pub fn new(failing_steps: &[&str]) -> Self {
        Self {
            failing_steps: failing_steps.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ContentGenerator for StepFailingGenerator {
    async fn check_availability(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<GeneratorStream> {
        if self.failing_steps.contains(&request.step.id) {
            return Ok(fail(format!("{} could not be generated", request.step.name)));
        }
        Ok(succeed(request))
    }
}

/// Fails every step of lessons whose topic is in the set.
#[allow(dead_code)]
pub struct TopicFailingGenerator {
    failing_topics: HashSet<String>,
}

impl TopicFailingGenerator {
    #[allow(dead_code)]
    pub fn new(failing_topics: &[&str]) -> Self {
        Self {
            failing_topics: failing_topics.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ContentGenerator for TopicFailingGenerator {
    async fn check_availability(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<GeneratorStream> {
        if self.failing_topics.contains(&request.config.topic) {
            return Ok(fail(format!("backend rejected '{}'", request.config.topic)));
        }
        Ok(succeed(request))
    }
}

/// Reports 40% on the gated step, then waits for [`GatedGenerator::open`]
/// before reporting 80% and completing. Other steps succeed at once.
#[allow(dead_code)]
pub struct GatedGenerator {
    gated_step: String,
    gate: Arc<Notify>,
}

impl GatedGenerator {
    #[allow(dead_code)]
    pub fn new(gated_step: &str) -> Self {
        Self {
            gated_step: gated_step.to_string(),
            gate: Arc::new(Notify::new()),
        }
    }

    #[allow(dead_code)]
    pub fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ContentGenerator for GatedGenerator {
    async fn check_availability(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<GeneratorStream> {
        if request.step.id != self.gated_step {
            return Ok(succeed(request));
        }
        let gate = self.gate.clone();
        let artifact = artifact(request);
        Ok(Box::pin(async_stream::stream! {
            yield Ok(GeneratorEvent::Progress(40));
            gate.notified().await;
            yield Ok(GeneratorEvent::Progress(80));
            yield Ok(GeneratorEvent::Artifact(artifact));
            yield Ok(GeneratorEvent::Completed);
        }))
    }
}
