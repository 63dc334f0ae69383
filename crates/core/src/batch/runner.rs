//! Batch runner.
//!
//! Each lesson in a batch is a full workflow run. Lessons run one after
//! another, or concurrently up to `max_parallel_jobs` when
//! `parallel_generation` is set. A failed step is retried in place until the
//! lesson's attempts are used up.

use std::collections::HashMap;
use std::sync::Arc;

use ck_protocol::ipc::Event;
use ck_protocol::{BatchOptions, BatchProgress, BatchResult, LessonOutcome, LessonResult, LessonSpec};
use tokio::sync::mpsc::Sender;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{BatchError, BatchRunResult};
use crate::workflow::plan::plan_steps;
use crate::workflow::{CancelHandle, WorkflowEngine};

struct BatchEntry {
    course_name: String,
    /// Taken when the batch starts.
    lessons: Option<Vec<LessonSpec>>,
    options: BatchOptions,
    cancel: CancelHandle,
}

pub struct BatchRunner {
    engine: Arc<WorkflowEngine>,
    batches: Mutex<HashMap<Uuid, BatchEntry>>,
}

impl BatchRunner {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self {
            engine,
            batches: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a batch without starting it.
    pub async fn create_batch(
        &self,
        course_name: impl Into<String>,
        lessons: Vec<LessonSpec>,
        options: BatchOptions,
    ) -> Uuid {
        let batch_id = Uuid::new_v4();
        let course_name = course_name.into();
        info!(batch_id = %batch_id, course = %course_name, lessons = lessons.len(), "batch created");
        self.batches.lock().await.insert(
            batch_id,
            BatchEntry {
                course_name,
                lessons: Some(lessons),
                options,
                cancel: CancelHandle::new(),
            },
        );
        batch_id
    }

    /// Requests cancellation. No new lessons start; running lessons are
    /// cancelled.
    ///
    /// # Errors
    ///
    /// `NotFound` if the batch is unknown or already finished.
    pub async fn cancel_batch(&self, batch_id: Uuid) -> BatchRunResult<()> {
        let batches = self.batches.lock().await;
        let entry = batches.get(&batch_id).ok_or(BatchError::NotFound(batch_id))?;
        entry.cancel.cancel();
        info!(batch_id = %batch_id, "batch cancellation requested");
        Ok(())
    }

    /// Cancels every batch that has not finished.
    pub async fn cancel_all(&self) {
        for entry in self.batches.lock().await.values() {
            entry.cancel.cancel();
        }
    }

    /// Runs a created batch to the end and returns the aggregated result.
    ///
    /// `BatchProgress` is emitted each time a lesson finishes, so
    /// `completed_items` only ever grows.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the batch is unknown
    /// - `AlreadyStarted` if the batch is already running
    pub async fn execute_batch(
        &self,
        batch_id: Uuid,
        events_tx: &Sender<Event>,
    ) -> BatchRunResult<BatchResult> {
        let (course_name, lessons, options, cancel) = {
            let mut batches = self.batches.lock().await;
            let entry = batches
                .get_mut(&batch_id)
                .ok_or(BatchError::NotFound(batch_id))?;
            let lessons = entry
                .lessons
                .take()
                .ok_or(BatchError::AlreadyStarted(batch_id))?;
            (
                entry.course_name.clone(),
                lessons,
                entry.options.clone(),
                entry.cancel.clone(),
            )
        };

        let started = self.engine.clock().now();
        info!(
            batch_id = %batch_id,
            course = %course_name,
            total = lessons.len(),
            parallel = options.parallel_generation,
            "batch started"
        );

        let mut tally = Tally::new(batch_id, &lessons);
        if options.parallel_generation {
            self.run_parallel(lessons, &options, &cancel, &mut tally, events_tx)
                .await;
        } else {
            self.run_sequential(lessons, &options, &cancel, &mut tally, events_tx)
                .await;
        }

        self.batches.lock().await.remove(&batch_id);

        let elapsed = (self.engine.clock().now() - started).num_milliseconds().max(0) as f64 / 1000.0;
        let result = tally.finish(course_name, elapsed, options.save_partial_results);
        info!(
            batch_id = %batch_id,
            successful = result.successful_items,
            failed = result.failed_items,
            total = result.total_items,
            "batch finished"
        );
        Ok(result)
    }

    /// Creates and executes a batch in one call.
    pub async fn run_batch(
        &self,
        course_name: impl Into<String>,
        lessons: Vec<LessonSpec>,
        options: BatchOptions,
        events_tx: &Sender<Event>,
    ) -> BatchRunResult<BatchResult> {
        let batch_id = self.create_batch(course_name, lessons, options).await;
        self.execute_batch(batch_id, events_tx).await
    }

    async fn run_sequential(
        &self,
        lessons: Vec<LessonSpec>,
        options: &BatchOptions,
        cancel: &CancelHandle,
        tally: &mut Tally,
        events_tx: &Sender<Event>,
    ) {
        for (index, lesson) in lessons.into_iter().enumerate() {
            if cancel.is_cancelled() || tally.halted {
                break;
            }
            tally.emit(events_tx, Some(lesson.title.clone())).await;
            let result = run_lesson(
                self.engine.clone(),
                index,
                lesson,
                options.max_attempts(),
                cancel.clone(),
                events_tx.clone(),
            )
            .await;
            tally.record(result, options.continue_on_error);
            tally.emit(events_tx, None).await;
        }
    }

    async fn run_parallel(
        &self,
        lessons: Vec<LessonSpec>,
        options: &BatchOptions,
        cancel: &CancelHandle,
        tally: &mut Tally,
        events_tx: &Sender<Event>,
    ) {
        let semaphore = Arc::new(Semaphore::new(options.max_parallel_jobs.max(1)));
        // Set on the first failure when the batch must stop. Running lessons finish.
        let halt = CancelHandle::new();
        let mut join_set = JoinSet::new();

        for (index, lesson) in lessons.into_iter().enumerate() {
            let engine = self.engine.clone();
            let semaphore = semaphore.clone();
            let halt = halt.clone();
            let cancel = cancel.clone();
            let events_tx = events_tx.clone();
            let max_attempts = options.max_attempts();
            let continue_on_error = options.continue_on_error;

            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return not_attempted(index, lesson.title);
                };
                if halt.is_cancelled() || cancel.is_cancelled() {
                    return not_attempted(index, lesson.title);
                }
                let result = run_lesson(engine, index, lesson, max_attempts, cancel, events_tx).await;
                // Raised while the permit is still held so no queued lesson
                // can start after a failure.
                if !continue_on_error && matches!(result.outcome, LessonOutcome::Failed { .. }) {
                    halt.cancel();
                }
                result
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => {
                    tally.record(result, options.continue_on_error);
                    if tally.halted {
                        halt.cancel();
                    }
                    tally.emit(events_tx, None).await;
                }
                Err(e) => warn!(error = %e, "lesson task did not finish"),
            }
        }
    }
}

/// Runs one lesson as a workflow, retrying failed steps in place.
async fn run_lesson(
    engine: Arc<WorkflowEngine>,
    index: usize,
    lesson: LessonSpec,
    max_attempts: u32,
    batch_cancel: CancelHandle,
    events_tx: Sender<Event>,
) -> LessonResult {
    let steps = plan_steps(&lesson.config);
    let mut workflow =
        engine.create_workflow_from_steps(lesson.title.clone(), lesson.config.clone(), steps);
    engine.announce(&workflow, &events_tx).await;

    let workflow_cancel = workflow.cancel_handle();
    let forward = tokio::spawn(async move {
        batch_cancel.cancelled().await;
        workflow_cancel.cancel();
    });

    let mut attempts = 1;
    let outcome = loop {
        match engine.run_to_end(&mut workflow, &events_tx).await {
            Ok(()) => {
                break LessonOutcome::Succeeded {
                    attempts,
                    artifacts: workflow.take_artifacts(),
                }
            }
            Err(e) if e.is_cancelled() => break LessonOutcome::Cancelled { attempts },
            Err(e) => {
                let retried = match e.failed_step() {
                    Some(step) if attempts < max_attempts => {
                        engine.retry_step(&mut workflow, step, &events_tx).await.is_ok()
                    }
                    _ => false,
                };
                if !retried {
                    warn!(lesson = %lesson.title, attempts, error = %e, "lesson failed");
                    break LessonOutcome::Failed {
                        attempts,
                        error: e.to_string(),
                    };
                }
                attempts += 1;
                info!(lesson = %lesson.title, attempt = attempts, "retrying lesson step");
            }
        }
    };
    forward.abort();

    LessonResult {
        index,
        title: lesson.title,
        outcome,
    }
}

fn not_attempted(index: usize, title: String) -> LessonResult {
    LessonResult {
        index,
        title,
        outcome: LessonOutcome::NotAttempted,
    }
}

/// Running totals for a batch.
struct Tally {
    batch_id: Uuid,
    lessons: Vec<LessonResult>,
    successful: usize,
    failed: usize,
    halted: bool,
}

impl Tally {
    fn new(batch_id: Uuid, lessons: &[LessonSpec]) -> Self {
        Self {
            batch_id,
            lessons: lessons
                .iter()
                .enumerate()
                .map(|(index, lesson)| not_attempted(index, lesson.title.clone()))
                .collect(),
            successful: 0,
            failed: 0,
            halted: false,
        }
    }

    fn record(&mut self, result: LessonResult, continue_on_error: bool) {
        match result.outcome {
            LessonOutcome::Succeeded { .. } => self.successful += 1,
            LessonOutcome::Failed { .. } => {
                self.failed += 1;
                if !continue_on_error {
                    self.halted = true;
                }
            }
            LessonOutcome::Cancelled { .. } | LessonOutcome::NotAttempted => {}
        }
        if let Some(slot) = self.lessons.get_mut(result.index) {
            *slot = result;
        }
    }

    async fn emit(&self, events_tx: &Sender<Event>, current_lesson: Option<String>) {
        let mut progress = BatchProgress::new(
            self.batch_id,
            self.successful + self.failed,
            self.lessons.len(),
        );
        progress.current_lesson = current_lesson;
        let _ = events_tx.send(Event::BatchProgress { progress }).await;
    }

    fn finish(mut self, course_name: String, elapsed: f64, save_partial_results: bool) -> BatchResult {
        if !save_partial_results && self.failed > 0 {
            for lesson in &mut self.lessons {
                if let LessonOutcome::Succeeded { artifacts, .. } = &mut lesson.outcome {
                    artifacts.clear();
                }
            }
        }
        BatchResult {
            batch_id: self.batch_id,
            course_name,
            total_items: self.lessons.len(),
            successful_items: self.successful,
            failed_items: self.failed,
            total_elapsed_time: elapsed,
            lessons: self.lessons,
        }
    }
}
