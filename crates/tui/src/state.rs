//! Front-end view of the workflows and batches the core reports.

use ck_core::progress::ProgressFeed;
use ck_protocol::{BatchProgress, BatchResult, GenerationProgress, StepStatus};
use uuid::Uuid;

use crate::widgets::status_bar::StatusBar;

/// Lines of step output kept per workflow.
pub const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone)]
pub struct WorkflowView {
    pub topic: String,
    pub progress: GenerationProgress,
    pub logs: Vec<String>,
}

impl WorkflowView {
    pub fn new(topic: String, progress: GenerationProgress) -> Self {
        Self {
            topic,
            progress,
            logs: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.progress.pipeline_id
    }

    /// Short status for the dashboard.
    pub fn status_label(&self) -> &'static str {
        let p = &self.progress;
        if p.cancelled {
            "Cancelled"
        } else if p.is_generation_complete() && p.has_errors() {
            "Errors"
        } else if p.is_generation_complete() {
            "Complete"
        } else if p.has_errors() {
            "Failed"
        } else if p.count_with_status(StepStatus::InProgress) > 0 {
            "Running"
        } else {
            "Ready"
        }
    }

    pub fn push_log(&mut self, line: String) {
        self.logs.push(line);
        if self.logs.len() > MAX_LOG_LINES {
            let excess = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..excess);
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchView {
    pub batch_id: Uuid,
    pub course_name: String,
    pub progress: BatchProgress,
    pub result: Option<BatchResult>,
}

impl BatchView {
    pub fn summary(&self) -> String {
        match &self.result {
            Some(result) => format!(
                "{}: {} succeeded, {} failed of {}",
                self.course_name, result.successful_items, result.failed_items, result.total_items
            ),
            None => {
                let mut line = format!(
                    "{}: {}/{} lessons ({}%)",
                    self.course_name,
                    self.progress.completed_items,
                    self.progress.total_items,
                    self.progress.progress_percent
                );
                if let Some(lesson) = &self.progress.current_lesson {
                    line.push_str(&format!(" · {lesson}"));
                }
                line
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub workflows: Vec<WorkflowView>,
    pub batches: Vec<BatchView>,
    pub feed: ProgressFeed,
    pub status: StatusBar,
    pub selected: usize,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_workflow(&self) -> Option<&WorkflowView> {
        self.workflows.get(self.selected)
    }

    pub fn workflow_mut(&mut self, id: Uuid) -> Option<&mut WorkflowView> {
        self.workflows.iter_mut().find(|w| w.id() == id)
    }

    /// Inserts or replaces the view for `progress.pipeline_id`.
    pub fn upsert(&mut self, topic: String, progress: GenerationProgress) {
        match self.workflow_mut(progress.pipeline_id) {
            Some(view) => {
                view.topic = topic;
                view.progress = progress;
            }
            None => self.workflows.push(WorkflowView::new(topic, progress)),
        }
    }

    /// Removes a workflow from the view. The core keeps it.
    pub fn close(&mut self, id: Uuid) {
        self.workflows.retain(|w| w.id() != id);
        self.feed.forget(id);
        self.selected = self.selected.min(self.workflows.len().saturating_sub(1));
    }

    pub fn batch_mut(&mut self, batch_id: Uuid) -> Option<&mut BatchView> {
        self.batches.iter_mut().find(|b| b.batch_id == batch_id)
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.workflows.len() {
            self.selected += 1;
        }
    }
}
