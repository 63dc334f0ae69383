//! Generation service.
//!
//! The `GenerationService` is the single entry point a front-end talks to.
//! It receives `Op`s, keeps a registry of live workflows, and reports back
//! through `Event`s. Long-running work (step execution, quick actions,
//! batches) is spawned so the op loop stays responsive, which is what lets a
//! `CancelWorkflow` reach a workflow while one of its steps is running.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use ck_protocol::ipc::{Event, Op, WorkflowSummary};
use ck_protocol::{
    BatchOptions, BatchResult, GenerationConfig, GenerationProgress, LessonSpec, PipelineTemplate,
    QuickAction, StatusMessage,
};
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::batch::BatchRunner;
use crate::clock::SharedClock;
use crate::config::models::AppConfig;
use crate::generators::enhancement::generate_enhancement_suggestions;
use crate::generators::GeneratorManager;
use crate::validation::{summarize, validate_config, validate_quick_action};
use crate::workflow::{find_template, CancelHandle, Workflow, WorkflowEngine, WorkflowError};

/// Registry entry for one workflow.
///
/// The cancel handle lives outside the workflow lock so a cancel request
/// does not wait for the running step.
#[derive(Clone)]
struct WorkflowEntry {
    workflow: Arc<Mutex<Workflow>>,
    cancel: CancelHandle,
    topic: String,
    /// Last snapshot taken while the lock was free.
    last_known: Arc<std::sync::Mutex<GenerationProgress>>,
}

impl WorkflowEntry {
    fn new(workflow: Workflow) -> Self {
        Self {
            cancel: workflow.cancel_handle(),
            topic: workflow.topic().to_string(),
            last_known: Arc::new(std::sync::Mutex::new(workflow.snapshot())),
            workflow: Arc::new(Mutex::new(workflow)),
        }
    }

    fn remember(&self, workflow: &Workflow) {
        let mut last = self.last_known.lock().unwrap_or_else(|e| e.into_inner());
        *last = workflow.snapshot();
    }

    /// Current snapshot, or the last known one while a step holds the lock.
    fn summary(&self) -> WorkflowSummary {
        let progress = match self.workflow.try_lock() {
            Ok(workflow) => {
                self.remember(&workflow);
                workflow.snapshot()
            }
            Err(_) => self
                .last_known
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        };
        WorkflowSummary {
            topic: self.topic.clone(),
            progress,
        }
    }
}

/// Per-workflow operations that run in the background.
#[derive(Debug, Clone, Copy)]
enum WorkflowCommand {
    Execute(usize),
    RunAll,
    Skip(usize),
    Retry(usize),
}

/// Coordinates workflows and batches for one front-end.
#[derive(Clone)]
pub struct GenerationService {
    engine: Arc<WorkflowEngine>,
    batches: Arc<BatchRunner>,
    templates: Arc<Vec<PipelineTemplate>>,
    batch_defaults: BatchOptions,
    workflows: Arc<Mutex<HashMap<Uuid, WorkflowEntry>>>,
    events_tx: Sender<Event>,
}

impl GenerationService {
    /// Creates a service.
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded project configuration (templates, batch defaults, weighting)
    /// * `generators` - Registry used to run steps
    /// * `clock` - Time source for step timings
    /// * `events_tx` - Channel for events to the front-end
    pub fn new(
        config: &AppConfig,
        generators: GeneratorManager,
        clock: SharedClock,
        events_tx: Sender<Event>,
    ) -> Self {
        let engine = Arc::new(WorkflowEngine::new(
            Arc::new(generators),
            clock,
            config.global.progress_weighting,
        ));
        Self {
            batches: Arc::new(BatchRunner::new(engine.clone())),
            engine,
            templates: Arc::new(config.pipelines.clone()),
            batch_defaults: config.global.batch.clone(),
            workflows: Arc::new(Mutex::new(HashMap::new())),
            events_tx,
        }
    }

    /// Processes operations until `Shutdown` arrives or the sender is dropped.
    pub async fn run(&self, mut ops_rx: UnboundedReceiver<Op>) {
        info!("generation service started");
        while let Some(op) = ops_rx.recv().await {
            if matches!(op, Op::Shutdown) {
                break;
            }
            self.handle_op(op).await;
        }
        self.shutdown().await;
        info!("generation service stopped");
    }

    /// Handles one operation. Failures are reported as error toasts.
    pub async fn handle_op(&self, op: Op) {
        debug!(?op, "op received");
        if let Err(e) = self.dispatch(op).await {
            warn!(error = %e, "operation failed");
            self.status(StatusMessage::error(e.to_string())).await;
        }
    }

    async fn dispatch(&self, op: Op) -> Result<()> {
        match op {
            Op::CreateWorkflow { config, template } => {
                self.create_workflow(config, template.as_deref()).await?;
            }
            Op::ExecuteStep { workflow_id, index } => {
                self.spawn_command(workflow_id, WorkflowCommand::Execute(index))
                    .await?;
            }
            Op::RunWorkflow { workflow_id } => {
                self.spawn_command(workflow_id, WorkflowCommand::RunAll).await?;
            }
            Op::SkipStep { workflow_id, index } => {
                self.spawn_command(workflow_id, WorkflowCommand::Skip(index))
                    .await?;
            }
            Op::RetryStep { workflow_id, index } => {
                self.spawn_command(workflow_id, WorkflowCommand::Retry(index))
                    .await?;
            }
            Op::CancelWorkflow { workflow_id } => self.cancel_workflow(workflow_id).await?,
            Op::ExecuteQuickAction { action, config } => {
                self.start_quick_action(action, config).await?;
            }
            Op::StartBatch {
                course_name,
                lessons,
                options,
            } => {
                self.start_batch(course_name, lessons, options).await?;
            }
            Op::CancelBatch { batch_id } => {
                self.batches.cancel_batch(batch_id).await?;
                self.status(StatusMessage::warning("Batch cancellation requested"))
                    .await;
            }
            Op::GenerateEnhancementSuggestions {
                imported_content,
                analysis,
                provider_id,
            } => self.start_enhancement(imported_content, analysis, provider_id),
            Op::GetDashboardState => {
                let workflows = self.dashboard().await;
                let _ = self.events_tx.send(Event::DashboardState { workflows }).await;
            }
            Op::Shutdown => self.shutdown().await,
        }
        Ok(())
    }

    /// Validates the request, builds the workflow and announces it.
    ///
    /// # Returns
    ///
    /// The id of the new workflow.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the lesson parameters fail validation
    /// - `UnknownTemplate` if `template` names no loaded template
    pub async fn create_workflow(
        &self,
        config: GenerationConfig,
        template: Option<&str>,
    ) -> Result<Uuid> {
        let issues = validate_config(&config);
        if !issues.is_empty() {
            return Err(WorkflowError::InvalidConfig(summarize(&issues)).into());
        }
        let template = template
            .map(|name| find_template(&self.templates, name))
            .transpose()?;

        let workflow = self.engine.create_workflow(config, template);
        let id = workflow.id();
        self.engine.announce(&workflow, &self.events_tx).await;
        self.register(workflow).await;
        Ok(id)
    }

    /// Every known workflow, oldest first.
    pub async fn dashboard(&self) -> Vec<WorkflowSummary> {
        let entries: Vec<WorkflowEntry> = self.workflows.lock().await.values().cloned().collect();
        let mut summaries: Vec<WorkflowSummary> = entries.iter().map(WorkflowEntry::summary).collect();
        summaries.sort_by(|a, b| a.progress.start_time.cmp(&b.progress.start_time));
        summaries
    }

    /// Cancels every workflow and batch.
    pub async fn shutdown(&self) {
        let entries: Vec<WorkflowEntry> = self.workflows.lock().await.values().cloned().collect();
        for entry in entries {
            entry.cancel.cancel();
        }
        self.batches.cancel_all().await;
    }

    async fn register(&self, workflow: Workflow) -> WorkflowEntry {
        let id = workflow.id();
        let entry = WorkflowEntry::new(workflow);
        self.workflows.lock().await.insert(id, entry.clone());
        entry
    }

    async fn entry(&self, workflow_id: Uuid) -> Result<WorkflowEntry> {
        self.workflows
            .lock()
            .await
            .get(&workflow_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(workflow_id).into())
    }

    async fn spawn_command(&self, workflow_id: Uuid, command: WorkflowCommand) -> Result<()> {
        let entry = self.entry(workflow_id).await?;
        let service = self.clone();
        tokio::spawn(async move {
            service.run_command(entry, command).await;
        });
        Ok(())
    }

    async fn run_command(&self, entry: WorkflowEntry, command: WorkflowCommand) {
        let mut workflow = entry.workflow.lock().await;
        let tx = &self.events_tx;
        let result = match command {
            WorkflowCommand::Execute(index) => self.engine.execute_step(&mut workflow, index, tx).await,
            WorkflowCommand::RunAll => self.engine.run_to_end(&mut workflow, tx).await,
            WorkflowCommand::Skip(index) => self.engine.skip_step(&mut workflow, index, tx).await,
            WorkflowCommand::Retry(index) => self.engine.retry_step(&mut workflow, index, tx).await,
        };
        entry.remember(&workflow);

        let message = match result {
            Ok(()) if workflow.progress().is_generation_complete() => Some(StatusMessage::success(
                format!("Generation complete for {}", entry.topic),
            )),
            Ok(()) => None,
            Err(e) if e.is_cancelled() => None,
            Err(e) => Some(StatusMessage::error(e.to_string())),
        };
        drop(workflow);
        if let Some(message) = message {
            self.status(message).await;
        }
    }

    async fn cancel_workflow(&self, workflow_id: Uuid) -> Result<()> {
        let entry = self.entry(workflow_id).await?;
        entry.cancel.cancel();

        let service = self.clone();
        tokio::spawn(async move {
            let mut workflow = entry.workflow.lock().await;
            // A running step acknowledges the cancel itself; this covers idle workflows.
            service.engine.cancel(&mut workflow, &service.events_tx).await;
            entry.remember(&workflow);
            drop(workflow);
            service
                .status(StatusMessage::warning(format!(
                    "Generation cancelled for {}",
                    entry.topic
                )))
                .await;
        });
        Ok(())
    }

    async fn start_quick_action(&self, action: QuickAction, config: GenerationConfig) -> Result<()> {
        let issues = validate_quick_action(&config);
        if !issues.is_empty() {
            return Err(WorkflowError::InvalidConfig(summarize(&issues)).into());
        }

        let workflow = self.engine.create_quick_action_workflow(action, config);
        self.engine.announce(&workflow, &self.events_tx).await;
        let entry = self.register(workflow).await;

        let service = self.clone();
        tokio::spawn(async move {
            let mut workflow = entry.workflow.lock().await;
            let outcome = service
                .engine
                .run_quick_action(&mut workflow, action, &service.events_tx)
                .await;
            entry.remember(&workflow);
            drop(workflow);
            let _ = service
                .events_tx
                .send(Event::QuickActionCompleted {
                    result: outcome.result,
                })
                .await;
            service.status(outcome.status).await;
        });
        Ok(())
    }

    fn start_enhancement(
        &self,
        imported_content: String,
        analysis: serde_json::Value,
        provider_id: String,
    ) {
        let service = self.clone();
        tokio::spawn(async move {
            let result = generate_enhancement_suggestions(
                service.engine.generators(),
                &imported_content,
                &analysis,
                &provider_id,
            )
            .await;
            match result {
                Ok(suggestions) => {
                    let _ = service
                        .events_tx
                        .send(Event::EnhancementSuggestions {
                            provider_id,
                            suggestions,
                        })
                        .await;
                }
                Err(e) => {
                    warn!(provider = %provider_id, error = %e, "enhancement suggestions failed");
                    service
                        .status(StatusMessage::error(format!(
                            "Enhancement suggestions failed: {e}"
                        )))
                        .await;
                }
            }
        });
    }

    async fn start_batch(
        &self,
        course_name: String,
        lessons: Vec<LessonSpec>,
        options: Option<BatchOptions>,
    ) -> Result<()> {
        if let Some((lesson, issues)) = lessons
            .iter()
            .map(|lesson| (lesson, validate_config(&lesson.config)))
            .find(|(_, issues)| !issues.is_empty())
        {
            return Err(anyhow!(
                "Lesson '{}' is invalid: {}",
                lesson.title,
                summarize(&issues)
            ));
        }

        let options = options.unwrap_or_else(|| self.batch_defaults.clone());
        let total_items = lessons.len();
        let batch_id = self
            .batches
            .create_batch(course_name.clone(), lessons, options)
            .await;
        let _ = self
            .events_tx
            .send(Event::BatchCreated {
                batch_id,
                course_name,
                total_items,
            })
            .await;

        let service = self.clone();
        tokio::spawn(async move {
            match service.batches.execute_batch(batch_id, &service.events_tx).await {
                Ok(result) => {
                    let message = batch_status(&result);
                    let _ = service
                        .events_tx
                        .send(Event::BatchCompleted { result })
                        .await;
                    service.status(message).await;
                }
                Err(e) => service.status(StatusMessage::error(e.to_string())).await,
            }
        });
        Ok(())
    }

    async fn status(&self, message: StatusMessage) {
        let _ = self.events_tx.send(Event::Status { message }).await;
    }
}

fn batch_status(result: &BatchResult) -> StatusMessage {
    let summary = format!(
        "{}: {} of {} lessons generated",
        result.course_name, result.successful_items, result.total_items
    );
    if result.failed_items == 0 && result.ran_to_completion() {
        StatusMessage::success(summary)
    } else if result.failed_items > 0 {
        StatusMessage::error(format!("{summary}, {} failed", result.failed_items))
    } else {
        StatusMessage::warning(format!("{summary}, batch stopped early"))
    }
}
