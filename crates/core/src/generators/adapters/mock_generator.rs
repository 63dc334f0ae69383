//! Mock generator for testing and offline use.
//!
//! `MockGenerator` produces deterministic content without calling any
//! backend. It can succeed, fail, be unavailable, fail a fixed number of
//! times before succeeding, or replay a scripted list of events.

use crate::generators::base::{
    ContentGenerator, GenerationRequest, GeneratorError, GeneratorEvent, GeneratorResult,
    GeneratorStream,
};
use async_trait::async_trait;
use ck_protocol::GeneratedArtifact;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
enum Script {
    Succeed,
    Fail(String),
    Events(Vec<GeneratorResult<GeneratorEvent>>),
}

#[derive(Clone)]
pub struct MockGenerator {
    available: bool,
    script: Script,
    failures_remaining: Arc<AtomicU32>,
    calls: Arc<AtomicU32>,
    delay: Option<Duration>,
}

impl MockGenerator {
    /// Replays `events` verbatim on every call.
    pub fn new(available: bool, events: Vec<GeneratorResult<GeneratorEvent>>) -> Self {
        Self::with_script(available, Script::Events(events))
    }

    /// Reports progress, one artifact built from the request, then completes.
    pub fn success() -> Self {
        Self::with_script(true, Script::Succeed)
    }

    pub fn unavailable() -> Self {
        Self::with_script(false, Script::Succeed)
    }

    /// Starts, then fails with a backend error.
    pub fn failing() -> Self {
        Self::with_script(true, Script::Fail("Mock failure".to_string()))
    }

    /// Fails the first `failures` calls, then succeeds.
    pub fn flaky(failures: u32) -> Self {
        let generator = Self::success();
        generator.failures_remaining.store(failures, Ordering::SeqCst);
        generator
    }

    /// Sleeps before each event.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn with_script(available: bool, script: Script) -> Self {
        Self {
            available,
            script,
            failures_remaining: Arc::new(AtomicU32::new(0)),
            calls: Arc::new(AtomicU32::new(0)),
            delay: None,
        }
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn script_for(&self, request: &GenerationRequest) -> Vec<GeneratorResult<GeneratorEvent>> {
        if self.take_failure() {
            return failure_events("Mock transient failure");
        }
        match &self.script {
            Script::Succeed => success_events(request),
            Script::Fail(message) => failure_events(message),
            Script::Events(events) => events.clone(),
        }
    }
}

fn failure_events(message: &str) -> Vec<GeneratorResult<GeneratorEvent>> {
    vec![
        Ok(GeneratorEvent::Progress(10)),
        Err(GeneratorError::Backend(message.to_string())),
    ]
}

fn success_events(request: &GenerationRequest) -> Vec<GeneratorResult<GeneratorEvent>> {
    let artifact = GeneratedArtifact {
        content_type: request.step.content_type.clone(),
        title: format!("{}: {}", request.config.topic, request.step.name),
        body: format!(
            "{} for {} ({} level)",
            request.step.name,
            if request.config.audience.is_empty() {
                "a general audience"
            } else {
                request.config.audience.as_str()
            },
            complexity_label(request)
        ),
    };
    vec![
        Ok(GeneratorEvent::Progress(25)),
        Ok(GeneratorEvent::Log(format!("Drafting {}", request.step.name))),
        Ok(GeneratorEvent::Progress(75)),
        Ok(GeneratorEvent::Artifact(artifact)),
        Ok(GeneratorEvent::Progress(100)),
        Ok(GeneratorEvent::Completed),
    ]
}

fn complexity_label(request: &GenerationRequest) -> &'static str {
    match request.config.complexity {
        ck_protocol::Complexity::Basic => "basic",
        ck_protocol::Complexity::Intermediate => "intermediate",
        ck_protocol::Complexity::Advanced => "advanced",
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn check_availability(&self) -> bool {
        self.available
    }

    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<GeneratorStream> {
        if !self.available {
            return Err(GeneratorError::NotAvailable(
                "Mock generator is not available".to_string(),
            ));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let events = self.script_for(request);
        match self.delay {
            None => Ok(Box::pin(tokio_stream::iter(events))),
            Some(delay) => Ok(Box::pin(async_stream::stream! {
                for event in events {
                    tokio::time::sleep(delay).await;
                    yield event;
                }
            })),
        }
    }
}
