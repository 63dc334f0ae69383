//! Test fixtures for creating sample configurations and engines.

use ck_core::clock::ManualClock;
use ck_core::generators::{ContentGenerator, GeneratorManager};
use ck_core::workflow::WorkflowEngine;
use ck_protocol::ipc::Event;
use ck_protocol::{
    ContentType, GenerationConfig, LessonSpec, ProgressWeighting, StepDefinition,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// A valid lesson request producing slides only.
#[allow(dead_code)]
pub fn lesson_config(topic: &str) -> GenerationConfig {
    GenerationConfig::new(topic, "Grade 7").with_content_types(vec![ContentType::Slides])
}

/// `n` lessons titled "Lesson 1".."Lesson n", with topics "Topic 1".."Topic n".
#[allow(dead_code)]
pub fn lessons(n: usize) -> Vec<LessonSpec> {
    (1..=n)
        .map(|i| LessonSpec {
            title: format!("Lesson {i}"),
            config: lesson_config(&format!("Topic {i}")),
        })
        .collect()
}

/// Three equally weighted steps: `a`, `b`, `c`.
#[allow(dead_code)]
pub fn three_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new("a", "Step A"),
        StepDefinition::new("b", "Step B"),
        StepDefinition::new("c", "Step C"),
    ]
}

/// An engine whose only generator is `generator`, on a manual clock.
#[allow(dead_code)]
pub fn engine_with(generator: Arc<dyn ContentGenerator>) -> (WorkflowEngine, Arc<ManualClock>) {
    let clock = ManualClock::starting_now();
    let manager = GeneratorManager::new()
        .register("test", "mock", generator)
        .with_default("test");
    let engine = WorkflowEngine::new(Arc::new(manager), clock.clone(), ProgressWeighting::Equal);
    (engine, clock)
}

/// Event channel large enough that no test ever blocks on send.
#[allow(dead_code)]
pub fn event_channel() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(4096)
}

/// Everything currently buffered in the channel.
#[allow(dead_code)]
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Create a temporary project with a `.curriculum-kit/` directory.
///
/// The project has one mock generator profile and a three-step pipeline
/// template named `short-lesson`.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path().join(".curriculum-kit");

    std::fs::create_dir_all(root.join("generators"))?;
    std::fs::create_dir_all(root.join("pipelines"))?;

    std::fs::write(
        root.join("config.toml"),
        r#"
default_generator = "offline"
progress_weighting = "equal"

[batch]
max_retries = 1
"#,
    )?;

    std::fs::write(
        root.join("generators/offline.md"),
        r#"---
name: offline
description: Deterministic offline writer
provider: mock
model: mock-success
---
You write short lesson drafts."#,
    )?;

    std::fs::write(
        root.join("pipelines/short-lesson.yaml"),
        r#"
name: short-lesson
description: Objectives, slides and a quiz
steps:
  - id: objectives
    name: Learning Objectives
    estimated-duration-secs: 20
  - id: slides
    name: Slides
    content-type: slides
    estimated-duration-secs: 90
  - id: quiz
    name: Quiz
    content-type: quiz
    estimated-duration-secs: 60
"#,
    )?;

    Ok(temp_dir)
}
