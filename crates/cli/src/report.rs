//! Human-readable output.
//!
//! `Reporter` drains the engine's event channel and prints step transitions
//! to stderr as they happen. Final summaries go to stdout.

use std::collections::HashMap;

use ck_protocol::{
    BatchResult, Event, GeneratedArtifact, GenerationProgress, LessonOutcome, Severity, StepStatus,
};
use colored::Colorize;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub struct Reporter {
    /// Last status printed per (workflow, step id).
    seen: HashMap<(Uuid, String), StepStatus>,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    /// Prints events until the channel closes. With `quiet` they are only
    /// drained.
    pub fn spawn(mut rx: Receiver<Event>, quiet: bool) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut reporter = Reporter::new();
            while let Some(event) = rx.recv().await {
                if quiet {
                    continue;
                }
                for line in reporter.describe(&event) {
                    eprintln!("{line}");
                }
            }
        })
    }

    /// Lines to print for `event`. Snapshots only print steps whose status
    /// changed since the last one.
    pub fn describe(&mut self, event: &Event) -> Vec<String> {
        match event {
            Event::WorkflowCreated { topic, progress } => {
                self.remember(progress);
                vec![format!(
                    "{} {} ({} steps)",
                    "▶".bold(),
                    topic.bold(),
                    progress.total_steps
                )]
            }
            Event::ProgressUpdated { progress } => self.transitions(progress),
            Event::StepLog { line, .. } => vec![format!("    {}", line.dimmed())],
            Event::WorkflowCancelled { .. } => vec![format!("  {}", "cancelled".yellow())],
            Event::BatchProgress { progress } => {
                let mut line = format!(
                    "[{}/{}] {}%",
                    progress.completed_items, progress.total_items, progress.progress_percent
                );
                if let Some(lesson) = &progress.current_lesson {
                    line.push_str(&format!(" · {lesson}"));
                }
                vec![line.cyan().to_string()]
            }
            Event::Status { message } => vec![match message.severity {
                Severity::Info => message.message.normal().to_string(),
                Severity::Success => message.message.green().to_string(),
                Severity::Warning => message.message.yellow().to_string(),
                Severity::Error => message.message.red().to_string(),
            }],
            Event::QuickActionCompleted { .. }
            | Event::BatchCreated { .. }
            | Event::BatchCompleted { .. }
            | Event::EnhancementSuggestions { .. }
            | Event::DashboardState { .. } => Vec::new(),
        }
    }

    fn remember(&mut self, progress: &GenerationProgress) {
        for step in &progress.steps {
            self.seen
                .insert((progress.pipeline_id, step.id.clone()), step.status);
        }
    }

    fn transitions(&mut self, progress: &GenerationProgress) -> Vec<String> {
        let mut lines = Vec::new();
        for step in &progress.steps {
            let key = (progress.pipeline_id, step.id.clone());
            if self.seen.get(&key) == Some(&step.status) {
                continue;
            }
            self.seen.insert(key, step.status);
            let line = match step.status {
                StepStatus::InProgress => format!("  {} {}", "…".blue(), step.name),
                StepStatus::Completed if step.skipped => {
                    format!("  {} {} {}", "-".dimmed(), step.name, "(skipped)".dimmed())
                }
                StepStatus::Completed => format!("  {} {}", "✓".green(), step.name),
                StepStatus::Error => format!(
                    "  {} {}: {}",
                    "✗".red(),
                    step.name,
                    step.error_message.as_deref().unwrap_or("failed").red()
                ),
                StepStatus::Pending => format!("  {} {} {}", "↺".yellow(), step.name, "(retry)".dimmed()),
            };
            lines.push(line);
        }
        lines
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Headline for a finished or stopped workflow.
pub fn workflow_headline(progress: &GenerationProgress) -> String {
    if progress.cancelled {
        "Generation Cancelled".yellow().bold().to_string()
    } else if !progress.is_generation_complete() {
        format!(
            "Generation stopped at step {}/{}",
            progress.current_step, progress.total_steps
        )
        .red()
        .bold()
        .to_string()
    } else if progress.has_errors() {
        "Generation Completed with Errors".red().bold().to_string()
    } else {
        "Generation Complete!".green().bold().to_string()
    }
}

pub fn artifact_lines(artifacts: &[GeneratedArtifact]) -> Vec<String> {
    artifacts
        .iter()
        .map(|a| match &a.content_type {
            Some(kind) => format!("  • {} {}", a.title, format!("[{kind}]").dimmed()),
            None => format!("  • {}", a.title),
        })
        .collect()
}

pub fn batch_lines(result: &BatchResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .lessons
        .iter()
        .map(|lesson| match &lesson.outcome {
            LessonOutcome::Succeeded {
                attempts,
                artifacts,
            } => format!(
                "  {} {} ({} artifact(s), {} attempt(s))",
                "✓".green(),
                lesson.title,
                artifacts.len(),
                attempts
            ),
            LessonOutcome::Failed { attempts, error } => format!(
                "  {} {}: {} ({} attempt(s))",
                "✗".red(),
                lesson.title,
                error.red(),
                attempts
            ),
            LessonOutcome::Cancelled { .. } => {
                format!("  {} {} {}", "-".yellow(), lesson.title, "(cancelled)".yellow())
            }
            LessonOutcome::NotAttempted => {
                format!("  {} {} {}", "·".dimmed(), lesson.title, "(not attempted)".dimmed())
            }
        })
        .collect();

    let summary = format!(
        "{}: {} of {} lessons generated, {} failed in {:.1}s",
        result.course_name,
        result.successful_items,
        result.total_items,
        result.failed_items,
        result.total_elapsed_time
    );
    lines.push(if result.failed_items == 0 && result.ran_to_completion() {
        summary.green().bold().to_string()
    } else {
        summary.red().bold().to_string()
    });
    lines
}
