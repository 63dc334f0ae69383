//! Workflow execution engine.
//!
//! The `WorkflowEngine` drives the steps of a [`Workflow`] through its
//! generators. It enforces step ordering, applies generator progress to the
//! tracker, and emits a `ProgressUpdated` snapshot after every state change.
//! Snapshots for one workflow are emitted from a single task, so consumers
//! see `current_step` in non-decreasing order.

use std::sync::Arc;

use ck_protocol::ipc::Event;
use ck_protocol::{
    GeneratedArtifact, GenerationConfig, PipelineTemplate, ProgressWeighting, QuickAction,
    QuickActionResult, StatusMessage, StepDefinition, StepStatus,
};
use tokio::sync::mpsc::Sender;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use super::cancel::CancelHandle;
use super::error::{WorkflowError, WorkflowResult};
use super::plan::{plan_from_template, plan_quick_action, plan_steps};
use super::state::Workflow;
use crate::clock::SharedClock;
use crate::generators::{GenerationRequest, GeneratorError, GeneratorEvent, GeneratorManager};
use crate::progress::ProgressTracker;

/// How a single step run ended.
enum StepOutcome {
    Completed(Vec<GeneratedArtifact>),
    Failed(GeneratorError),
    /// Cancel signal received, or the run epoch moved on.
    Cancelled,
}

/// Result of a quick action, with the toast to show for it.
#[derive(Debug, Clone)]
pub struct QuickActionOutcome {
    pub result: QuickActionResult,
    pub status: StatusMessage,
}

pub struct WorkflowEngine {
    generators: Arc<GeneratorManager>,
    clock: SharedClock,
    weighting: ProgressWeighting,
}

impl WorkflowEngine {
    /// Creates an engine.
    ///
    /// # Arguments
    ///
    /// * `generators` - Registry used to resolve each step's generator
    /// * `clock` - Time source for step timings
    /// * `weighting` - Aggregation rule for `overall_progress`
    pub fn new(
        generators: Arc<GeneratorManager>,
        clock: SharedClock,
        weighting: ProgressWeighting,
    ) -> Self {
        Self {
            generators,
            clock,
            weighting,
        }
    }

    pub fn generators(&self) -> &GeneratorManager {
        &self.generators
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Creates a workflow planned from `template`, or from the requested
    /// content types when no template is given.
    pub fn create_workflow(
        &self,
        config: GenerationConfig,
        template: Option<&PipelineTemplate>,
    ) -> Workflow {
        let steps = match template {
            Some(template) => plan_from_template(template),
            None => plan_steps(&config),
        };
        let topic = config.topic.clone();
        self.create_workflow_from_steps(topic, config, steps)
    }

    pub fn create_workflow_from_steps(
        &self,
        topic: impl Into<String>,
        config: GenerationConfig,
        steps: Vec<StepDefinition>,
    ) -> Workflow {
        let id = Uuid::new_v4();
        let tracker = ProgressTracker::create_pipeline(id, &steps, self.weighting, self.clock.clone());
        let topic = topic.into();
        info!(workflow_id = %id, topic = %topic, steps = steps.len(), "workflow created");
        Workflow {
            id,
            topic,
            config,
            definitions: steps,
            tracker,
            artifacts: Vec::new(),
            cancel: CancelHandle::new(),
        }
    }

    /// Sends `WorkflowCreated` for a new workflow.
    pub async fn announce(&self, workflow: &Workflow, events_tx: &Sender<Event>) {
        let _ = events_tx
            .send(Event::WorkflowCreated {
                topic: workflow.topic.clone(),
                progress: workflow.snapshot(),
            })
            .await;
    }

    /// Executes the step at `index`.
    ///
    /// This method:
    /// 1. Checks that every earlier step is completed or skipped
    /// 2. Starts the step and records the run epoch
    /// 3. Streams generator events, applying progress and forwarding logs
    /// 4. Completes or fails the step
    ///
    /// A cancel signal stops the step where it is: it stays `InProgress`,
    /// `WorkflowCancelled` is emitted, and no further snapshots follow.
    ///
    /// # Errors
    ///
    /// - `Transition` if the step is out of order or not pending
    /// - `StepFailed` if the generator failed; the step is left in `Error`
    /// - `Cancelled` if the workflow was cancelled
    pub async fn execute_step(
        &self,
        workflow: &mut Workflow,
        index: usize,
        events_tx: &Sender<Event>,
    ) -> WorkflowResult<()> {
        self.run_step(workflow, index, events_tx, true).await
    }

    async fn run_step(
        &self,
        workflow: &mut Workflow,
        index: usize,
        events_tx: &Sender<Event>,
        gated: bool,
    ) -> WorkflowResult<()> {
        let step_id = workflow.tracker.step_id_at(index)?.to_string();

        if workflow.cancel.is_cancelled() {
            self.finish_cancel(workflow, events_tx).await;
            return Err(WorkflowError::Cancelled);
        }
        if gated {
            workflow.tracker.ensure_ready(index)?;
        }

        workflow.tracker.start_step(&step_id)?;
        let epoch = workflow.tracker.epoch();
        self.emit_progress(workflow, events_tx).await;
        info!(workflow_id = %workflow.id, step = %step_id, "step started");

        let definition = workflow.definitions[index].clone();
        let generator = definition.generator.clone();
        let request = GenerationRequest::new(definition, workflow.config.clone())
            .for_workflow(workflow.id)
            .with_context(workflow.artifacts.clone());

        let cancel = workflow.cancel.clone();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => StepOutcome::Cancelled,
            outcome = self.drive_generator(
                workflow,
                &step_id,
                epoch,
                generator.as_deref(),
                &request,
                events_tx,
            ) => outcome,
        };

        match outcome {
            StepOutcome::Completed(artifacts) => {
                workflow.tracker.complete_step(&step_id)?;
                workflow.artifacts.extend(artifacts);
                self.emit_progress(workflow, events_tx).await;
                info!(workflow_id = %workflow.id, step = %step_id, "step completed");
                Ok(())
            }
            StepOutcome::Failed(source) => {
                workflow.tracker.fail_step(&step_id, source.to_string())?;
                self.emit_progress(workflow, events_tx).await;
                warn!(workflow_id = %workflow.id, step = %step_id, error = %source, "step failed");
                Err(WorkflowError::StepFailed {
                    index,
                    step_id,
                    source,
                })
            }
            StepOutcome::Cancelled => {
                self.finish_cancel(workflow, events_tx).await;
                Err(WorkflowError::Cancelled)
            }
        }
    }

    /// Consumes the generator stream for one step.
    ///
    /// Cancellation is handled by the caller, which races this future against
    /// the cancel handle and drops it, so no event is applied after a cancel.
    /// A malformed line (`StreamParse`) is logged and skipped; any other
    /// error fails the step.
    async fn drive_generator(
        &self,
        workflow: &mut Workflow,
        step_id: &str,
        epoch: u32,
        generator: Option<&str>,
        request: &GenerationRequest,
        events_tx: &Sender<Event>,
    ) -> StepOutcome {
        let mut stream = match self.generators.generate(generator, request).await {
            Ok(stream) => stream,
            Err(e) => return StepOutcome::Failed(e),
        };

        let mut produced = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(GeneratorEvent::Progress(percent)) => {
                    if workflow
                        .tracker
                        .update_step_progress(step_id, i32::from(percent))
                        .is_ok()
                    {
                        self.emit_progress(workflow, events_tx).await;
                    }
                }
                Ok(GeneratorEvent::Log(line)) => {
                    let _ = events_tx
                        .send(Event::StepLog {
                            workflow_id: workflow.id,
                            epoch,
                            step_id: step_id.to_string(),
                            line,
                        })
                        .await;
                }
                Ok(GeneratorEvent::Artifact(artifact)) => produced.push(artifact),
                Ok(GeneratorEvent::Completed) => return StepOutcome::Completed(produced),
                Err(GeneratorError::StreamParse(message)) => {
                    warn!(
                        workflow_id = %workflow.id,
                        step = %step_id,
                        %message,
                        "skipping malformed generator output"
                    );
                }
                Err(e) => return StepOutcome::Failed(e),
            }
        }

        // A stream that ends without an error counts as completed.
        StepOutcome::Completed(produced)
    }

    /// Skips the pending step at `index`.
    pub async fn skip_step(
        &self,
        workflow: &mut Workflow,
        index: usize,
        events_tx: &Sender<Event>,
    ) -> WorkflowResult<()> {
        workflow.skip_step(index)?;
        info!(workflow_id = %workflow.id, index, "step skipped");
        self.emit_progress(workflow, events_tx).await;
        Ok(())
    }

    /// Resets the failed step at `index` to pending.
    ///
    /// # Errors
    ///
    /// `Transition(InvalidTransition)` unless the step is in `Error`.
    pub async fn retry_step(
        &self,
        workflow: &mut Workflow,
        index: usize,
        events_tx: &Sender<Event>,
    ) -> WorkflowResult<()> {
        workflow.retry_step(index)?;
        info!(workflow_id = %workflow.id, index, "step reset for retry");
        self.emit_progress(workflow, events_tx).await;
        Ok(())
    }

    /// Cancels a workflow that is not currently executing a step.
    ///
    /// Returns false if it was already cancelled.
    pub async fn cancel(&self, workflow: &mut Workflow, events_tx: &Sender<Event>) -> bool {
        self.finish_cancel(workflow, events_tx).await
    }

    async fn finish_cancel(&self, workflow: &mut Workflow, events_tx: &Sender<Event>) -> bool {
        let Some(epoch) = workflow.acknowledge_cancel() else {
            return false;
        };
        info!(workflow_id = %workflow.id, epoch, "workflow cancelled");
        let _ = events_tx
            .send(Event::WorkflowCancelled {
                workflow_id: workflow.id,
                epoch,
            })
            .await;
        true
    }

    /// Runs every remaining step in order, stopping at the first failure.
    ///
    /// Completed steps are passed over. A step already in `Error` stops the
    /// run until it is retried or the workflow is recreated.
    pub async fn run_to_end(
        &self,
        workflow: &mut Workflow,
        events_tx: &Sender<Event>,
    ) -> WorkflowResult<()> {
        for index in 0..workflow.definitions.len() {
            let status = workflow.tracker.progress().steps[index].status;
            match status {
                StepStatus::Completed => continue,
                StepStatus::Error => {
                    let step = &workflow.tracker.progress().steps[index];
                    return Err(WorkflowError::StepFailed {
                        index,
                        step_id: step.id.clone(),
                        source: GeneratorError::Execution(
                            step.error_message
                                .clone()
                                .unwrap_or_else(|| "step previously failed".to_string()),
                        ),
                    });
                }
                StepStatus::Pending | StepStatus::InProgress => {
                    self.execute_step(workflow, index, events_tx).await?;
                }
            }
        }
        Ok(())
    }

    /// Builds the ad-hoc workflow for a quick action.
    pub fn create_quick_action_workflow(
        &self,
        action: QuickAction,
        config: GenerationConfig,
    ) -> Workflow {
        let steps = plan_quick_action(action, &config);
        let topic = format!("{} ({})", config.topic, action);
        self.create_workflow_from_steps(topic, config, steps)
    }

    /// Runs every step of a quick-action workflow without ordering gates.
    ///
    /// A failing step does not stop the others; the result reports failure
    /// if any step failed or the run was cancelled.
    pub async fn run_quick_action(
        &self,
        workflow: &mut Workflow,
        action: QuickAction,
        events_tx: &Sender<Event>,
    ) -> QuickActionOutcome {
        let mut failures = Vec::new();
        for index in 0..workflow.definitions.len() {
            match self.run_step(workflow, index, events_tx, false).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    failures.push(e.to_string());
                    break;
                }
                Err(e) => failures.push(e.to_string()),
            }
        }

        let artifacts = workflow.artifacts.clone();
        let (result, status) = if failures.is_empty() {
            let status = StatusMessage::success(format!(
                "{} finished with {} artifact(s)",
                action.label(),
                artifacts.len()
            ));
            (
                QuickActionResult {
                    action,
                    success: true,
                    artifacts,
                    error: None,
                },
                status,
            )
        } else {
            let error = failures.join("; ");
            let status = StatusMessage::error(format!("{} failed: {}", action.label(), error));
            (
                QuickActionResult {
                    action,
                    success: false,
                    artifacts,
                    error: Some(error),
                },
                status,
            )
        };

        info!(workflow_id = %workflow.id, action = %action, success = result.success, "quick action finished");
        QuickActionOutcome { result, status }
    }

    /// Creates, announces and runs a quick action in one call.
    pub async fn execute_quick_action(
        &self,
        action: QuickAction,
        config: GenerationConfig,
        events_tx: &Sender<Event>,
    ) -> QuickActionOutcome {
        let mut workflow = self.create_quick_action_workflow(action, config);
        self.announce(&workflow, events_tx).await;
        self.run_quick_action(&mut workflow, action, events_tx).await
    }

    async fn emit_progress(&self, workflow: &Workflow, events_tx: &Sender<Event>) {
        let _ = events_tx
            .send(Event::ProgressUpdated {
                progress: workflow.snapshot(),
            })
            .await;
    }
}

/// Looks up a template by name.
///
/// # Errors
///
/// `UnknownTemplate` if no template has that name.
pub fn find_template<'a>(
    templates: &'a [PipelineTemplate],
    name: &str,
) -> WorkflowResult<&'a PipelineTemplate> {
    templates
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| WorkflowError::UnknownTemplate(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::generators::adapters::MockGenerator;
    use crate::progress::TransitionError;
    use ck_protocol::ContentType;
    use tokio::sync::mpsc;

    fn engine(generator: MockGenerator) -> WorkflowEngine {
        let manager = GeneratorManager::new()
            .register("mock", "mock", Arc::new(generator))
            .with_default("mock");
        WorkflowEngine::new(
            Arc::new(manager),
            ManualClock::starting_now(),
            ProgressWeighting::Equal,
        )
    }

    fn config() -> GenerationConfig {
        GenerationConfig::new("Volcanoes", "Grade 6")
            .with_content_types(vec![ContentType::Slides, ContentType::Quiz])
    }

    fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_execute_step_completes_and_collects_artifacts() {
        let engine = engine(MockGenerator::success());
        let (tx, mut rx) = mpsc::channel(256);
        let mut workflow = engine.create_workflow(config(), None);

        engine.execute_step(&mut workflow, 0, &tx).await.expect("step 0");

        let progress = workflow.progress();
        assert_eq!(progress.steps[0].status, StepStatus::Completed);
        assert_eq!(progress.current_step, 2);
        assert_eq!(workflow.artifacts().len(), 1);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, Event::StepLog { .. })));
        assert!(matches!(events.last(), Some(Event::ProgressUpdated { .. })));
    }

    #[tokio::test]
    async fn test_malformed_output_line_is_skipped() {
        let artifact = ck_protocol::GeneratedArtifact {
            content_type: Some(ContentType::Slides),
            title: "Slides".to_string(),
            body: "Lava flows".to_string(),
        };
        let engine = engine(MockGenerator::new(
            true,
            vec![
                Ok(GeneratorEvent::Progress(40)),
                Err(GeneratorError::StreamParse("Malformed generator message".to_string())),
                Ok(GeneratorEvent::Artifact(artifact)),
                Ok(GeneratorEvent::Completed),
            ],
        ));
        let (tx, _rx) = mpsc::channel(256);
        let mut workflow = engine.create_workflow(config(), None);

        engine.execute_step(&mut workflow, 0, &tx).await.expect("step 0");

        let progress = workflow.progress();
        assert_eq!(progress.steps[0].status, StepStatus::Completed);
        assert!(progress.steps[0].error_message.is_none());
        assert_eq!(workflow.artifacts().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_step_out_of_order_is_rejected() {
        let engine = engine(MockGenerator::success());
        let (tx, _rx) = mpsc::channel(256);
        let mut workflow = engine.create_workflow(config(), None);

        let err = engine.execute_step(&mut workflow, 2, &tx).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Transition(TransitionError::OutOfOrder { .. })
        ));
        assert_eq!(workflow.progress().steps[2].status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_step_then_retry() {
        let engine = engine(MockGenerator::flaky(1));
        let (tx, _rx) = mpsc::channel(256);
        let mut workflow = engine.create_workflow(config(), None);

        let err = engine.execute_step(&mut workflow, 0, &tx).await.unwrap_err();
        assert_eq!(err.failed_step(), Some(0));
        assert_eq!(workflow.progress().steps[0].status, StepStatus::Error);

        engine.retry_step(&mut workflow, 0, &tx).await.expect("retry");
        engine.execute_step(&mut workflow, 0, &tx).await.expect("second attempt");
        assert_eq!(workflow.progress().steps[0].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_run_to_end_completes_every_step() {
        let engine = engine(MockGenerator::success());
        let (tx, _rx) = mpsc::channel(1024);
        let mut workflow = engine.create_workflow(config(), None);

        engine.run_to_end(&mut workflow, &tx).await.expect("run");
        let progress = workflow.snapshot();
        assert!(progress.is_generation_complete());
        assert!(!progress.has_errors());
        assert_eq!(progress.overall_progress, 100.0);
        assert_eq!(workflow.artifacts().len(), 4);
    }

    #[tokio::test]
    async fn test_skip_then_run() {
        let engine = engine(MockGenerator::success());
        let (tx, _rx) = mpsc::channel(1024);
        let mut workflow = engine.create_workflow(config(), None);

        engine.skip_step(&mut workflow, 0, &tx).await.expect("skip");
        engine.run_to_end(&mut workflow, &tx).await.expect("run");
        assert!(workflow.progress().steps[0].skipped);
        assert_eq!(workflow.artifacts().len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_idle_workflow() {
        let engine = engine(MockGenerator::success());
        let (tx, mut rx) = mpsc::channel(16);
        let mut workflow = engine.create_workflow(config(), None);

        assert!(engine.cancel(&mut workflow, &tx).await);
        assert!(!engine.cancel(&mut workflow, &tx).await);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [Event::WorkflowCancelled { epoch: 1, .. }]
        ));

        let err = engine.execute_step(&mut workflow, 0, &tx).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_quick_action_reports_failure() {
        let engine = engine(MockGenerator::failing());
        let (tx, _rx) = mpsc::channel(256);
        let outcome = engine
            .execute_quick_action(QuickAction::AssessmentSuite, config(), &tx)
            .await;
        assert!(!outcome.result.success);
        assert!(outcome.result.error.is_some());
        assert_eq!(outcome.status.severity, ck_protocol::Severity::Error);
    }

    #[tokio::test]
    async fn test_quick_action_success() {
        let engine = engine(MockGenerator::success());
        let (tx, _rx) = mpsc::channel(256);
        let outcome = engine
            .execute_quick_action(QuickAction::SlidesOnly, config(), &tx)
            .await;
        assert!(outcome.result.success);
        assert_eq!(outcome.result.artifacts.len(), 1);
        assert_eq!(
            outcome.result.artifacts[0].content_type,
            Some(ContentType::Slides)
        );
    }

    #[test]
    fn test_find_template() {
        let templates = vec![PipelineTemplate {
            name: "quick-review".to_string(),
            description: String::new(),
            steps: vec![StepDefinition::new("slides", "Slides")],
        }];
        assert!(find_template(&templates, "quick-review").is_ok());
        assert!(matches!(
            find_template(&templates, "missing"),
            Err(WorkflowError::UnknownTemplate(_))
        ));
    }
}
