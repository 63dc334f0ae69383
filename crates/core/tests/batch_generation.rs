//! Batch generation tests: retries, partial failure and cancellation.

mod common;

use ck_core::batch::{BatchError, BatchRunner};
use ck_core::generators::adapters::MockGenerator;
use ck_core::workflow::WorkflowEngine;
use ck_protocol::ipc::Event;
use ck_protocol::{BatchOptions, LessonOutcome};
use common::*;
use std::sync::Arc;
use std::time::Duration;

fn runner(engine: WorkflowEngine) -> BatchRunner {
    BatchRunner::new(Arc::new(engine))
}

fn batch_progress(events: &[Event]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::BatchProgress { progress } => Some(progress.completed_items),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_partial_failure_after_retries() {
    let (engine, _clock) = engine_with(Arc::new(TopicFailingGenerator::new(&["Topic 2", "Topic 4"])));
    let runner = runner(engine);
    let (tx, mut rx) = event_channel();
    let options = BatchOptions {
        max_retries: 2,
        ..BatchOptions::default()
    };

    let result = runner
        .run_batch("Earth Science", lessons(5), options, &tx)
        .await
        .expect("batch");

    assert_eq!(result.total_items, 5);
    assert_eq!(result.successful_items, 3);
    assert_eq!(result.failed_items, 2);
    assert!(result.ran_to_completion());
    for index in [1, 3] {
        assert!(matches!(
            &result.lessons[index].outcome,
            LessonOutcome::Failed { attempts: 3, error } if error.contains("backend rejected")
        ));
    }
    assert!(matches!(
        &result.lessons[0].outcome,
        LessonOutcome::Succeeded { attempts: 1, .. }
    ));

    let completed = batch_progress(&drain(&mut rx));
    assert!(completed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(completed.last(), Some(&5));
}

#[tokio::test]
async fn test_parallel_batch_matches_sequential_totals() {
    let (engine, _clock) = engine_with(Arc::new(TopicFailingGenerator::new(&["Topic 3"])));
    let runner = runner(engine);
    let (tx, mut rx) = event_channel();
    let options = BatchOptions {
        parallel_generation: true,
        max_parallel_jobs: 2,
        retry_failed_items: false,
        ..BatchOptions::default()
    };

    let result = runner
        .run_batch("Earth Science", lessons(4), options, &tx)
        .await
        .expect("batch");

    assert_eq!((result.successful_items, result.failed_items), (3, 1));
    assert!(matches!(
        result.lessons[2].outcome,
        LessonOutcome::Failed { attempts: 1, .. }
    ));
    let titles: Vec<_> = result.lessons.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, ["Lesson 1", "Lesson 2", "Lesson 3", "Lesson 4"]);

    let completed = batch_progress(&drain(&mut rx));
    assert!(completed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(completed.last(), Some(&4));
}

#[tokio::test]
async fn test_partial_results_discarded_on_failure() {
    let (engine, _clock) = engine_with(Arc::new(TopicFailingGenerator::new(&["Topic 2"])));
    let runner = runner(engine);
    let (tx, _rx) = event_channel();
    let options = BatchOptions {
        save_partial_results: false,
        retry_failed_items: false,
        ..BatchOptions::default()
    };

    let result = runner
        .run_batch("Earth Science", lessons(2), options, &tx)
        .await
        .expect("batch");

    assert!(matches!(
        &result.lessons[0].outcome,
        LessonOutcome::Succeeded { artifacts, .. } if artifacts.is_empty()
    ));
}

#[tokio::test]
async fn test_cancel_stops_remaining_lessons() {
    let generator = MockGenerator::success().with_delay(Duration::from_millis(20));
    let (engine, _clock) = engine_with(Arc::new(generator));
    let runner = Arc::new(runner(engine));
    let (tx, _rx) = event_channel();

    let batch_id = runner
        .create_batch("Earth Science", lessons(4), BatchOptions::default())
        .await;
    let task_runner = runner.clone();
    let task = tokio::spawn(async move { task_runner.execute_batch(batch_id, &tx).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    runner.cancel_batch(batch_id).await.expect("cancel");

    let result = task.await.expect("task").expect("batch");
    assert_eq!(result.failed_items, 0);
    assert!(result.successful_items < 4);
    assert!(!result.ran_to_completion());
    assert!(result
        .lessons
        .iter()
        .any(|l| matches!(l.outcome, LessonOutcome::Cancelled { .. })));
    assert!(matches!(
        result.lessons[3].outcome,
        LessonOutcome::NotAttempted
    ));

    assert_eq!(
        runner.cancel_batch(batch_id).await,
        Err(BatchError::NotFound(batch_id))
    );
}

#[tokio::test]
async fn test_parallel_batch_stops_at_first_failure() {
    let (engine, _clock) = engine_with(Arc::new(MockGenerator::failing()));
    let runner = runner(engine);
    let (tx, _rx) = event_channel();
    let options = BatchOptions {
        parallel_generation: true,
        max_parallel_jobs: 1,
        continue_on_error: false,
        retry_failed_items: false,
        ..BatchOptions::default()
    };

    let result = runner
        .run_batch("Earth Science", lessons(5), options, &tx)
        .await
        .expect("batch");

    assert_eq!(result.failed_items, 1);
    assert_eq!(result.successful_items, 0);
    assert!(!result.ran_to_completion());
    let not_attempted = result
        .lessons
        .iter()
        .filter(|l| matches!(l.outcome, LessonOutcome::NotAttempted))
        .count();
    assert_eq!(not_attempted, 4);
}
