//! Step state machine for one generation pipeline.
//!
//! `ProgressTracker` is the only writer of a `GenerationProgress`. Every
//! mutation goes through a transition method that validates the current step
//! status first; a rejected transition leaves the state untouched, is logged
//! at `warn`, and is returned to the caller as a [`TransitionError`].

use chrono::{DateTime, Utc};
use ck_protocol::{GenerationProgress, GenerationStep, ProgressWeighting, StepDefinition, StepStatus};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{TransitionError, TransitionResult};
use super::weighting::{compute_overall, declared_total_secs, uses_duration_weights};
use crate::clock::SharedClock;

pub struct ProgressTracker {
    progress: GenerationProgress,
    weighting: ProgressWeighting,
    clock: SharedClock,
    /// Set once the pipeline is complete or cancelled; freezes elapsed time.
    finished_at: Option<DateTime<Utc>>,
}

impl ProgressTracker {
    /// Creates a tracker with every step pending.
    ///
    /// # Arguments
    ///
    /// * `pipeline_id` - Identifier carried by every snapshot
    /// * `steps` - Ordered step definitions
    /// * `weighting` - How step completion is aggregated
    /// * `clock` - Time source for step timings
    pub fn create_pipeline(
        pipeline_id: Uuid,
        steps: &[StepDefinition],
        weighting: ProgressWeighting,
        clock: SharedClock,
    ) -> Self {
        let steps = steps
            .iter()
            .map(|def| {
                GenerationStep::pending(def.id.clone(), def.name.clone())
                    .with_description(def.description.clone())
                    .with_estimate(def.estimated_duration_secs)
            })
            .collect::<Vec<_>>();

        Self {
            progress: GenerationProgress {
                pipeline_id,
                epoch: 0,
                current_step: 1,
                total_steps: steps.len(),
                overall_progress: 0.0,
                steps,
                start_time: None,
                elapsed_time: 0.0,
                remaining_time: 0.0,
                estimated_total_time: 0.0,
                cancelled: false,
            },
            weighting,
            clock,
            finished_at: None,
        }
    }

    /// Creates a tracker from plain step names. Each name doubles as the step id.
    pub fn from_names(names: &[&str], clock: SharedClock) -> Self {
        let defs = names
            .iter()
            .map(|name| StepDefinition::new(*name, *name))
            .collect::<Vec<_>>();
        Self::create_pipeline(Uuid::new_v4(), &defs, ProgressWeighting::default(), clock)
    }

    pub fn pipeline_id(&self) -> Uuid {
        self.progress.pipeline_id
    }

    pub fn epoch(&self) -> u32 {
        self.progress.epoch
    }

    pub fn is_cancelled(&self) -> bool {
        self.progress.cancelled
    }

    /// Raw state without refreshing the time fields.
    pub fn progress(&self) -> &GenerationProgress {
        &self.progress
    }

    /// A copy of the current state with elapsed/remaining time filled in.
    pub fn snapshot(&self) -> GenerationProgress {
        let mut snapshot = self.progress.clone();
        let Some(start) = snapshot.start_time else {
            return snapshot;
        };

        let end = self.finished_at.unwrap_or_else(|| self.clock.now());
        let elapsed = secs_between(start, end);
        snapshot.elapsed_time = elapsed;

        if snapshot.is_generation_complete() {
            snapshot.estimated_total_time = elapsed;
            snapshot.remaining_time = 0.0;
            return snapshot;
        }

        let estimated_total = if uses_duration_weights(&snapshot.steps, self.weighting) {
            declared_total_secs(&snapshot.steps).unwrap_or(0.0)
        } else if snapshot.overall_progress > 0.0 {
            elapsed / (snapshot.overall_progress / 100.0)
        } else {
            0.0
        };
        snapshot.estimated_total_time = estimated_total.max(elapsed);
        snapshot.remaining_time = (estimated_total - elapsed).max(0.0);
        snapshot
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.progress.steps.iter().position(|s| s.id == id)
    }

    pub fn step_id_at(&self, index: usize) -> TransitionResult<&str> {
        self.progress
            .steps
            .get(index)
            .map(|s| s.id.as_str())
            .ok_or(TransitionError::IndexOutOfRange {
                index,
                total: self.progress.total_steps,
            })
    }

    /// Checks that every step before `index` is completed (run or skipped).
    pub fn ensure_ready(&self, index: usize) -> TransitionResult<()> {
        if self.progress.cancelled {
            return Err(self.reject("run", TransitionError::Cancelled));
        }
        let step = self.step_id_at(index)?.to_string();
        if let Some(blocker) = self.progress.steps[..index]
            .iter()
            .find(|s| s.status != StepStatus::Completed)
        {
            return Err(self.reject(
                "run",
                TransitionError::OutOfOrder {
                    step,
                    blocked_by: blocker.id.clone(),
                },
            ));
        }
        Ok(())
    }

    /// `Pending → InProgress`.
    pub fn start_step(&mut self, id: &str) -> TransitionResult<()> {
        let index = self.checked(id, "start", &[StepStatus::Pending])?;
        let now = self.clock.now();
        let step = &mut self.progress.steps[index];
        step.status = StepStatus::InProgress;
        step.progress = 0;
        step.start_time = Some(now);
        step.end_time = None;
        step.error_message = None;
        if self.progress.start_time.is_none() {
            self.progress.start_time = Some(now);
        }
        debug!(step = %id, "step started");
        self.recompute();
        Ok(())
    }

    /// Sets step-level progress, clamped to `[0, 100]`. Only valid while the
    /// step is running.
    pub fn update_step_progress(&mut self, id: &str, percent: i32) -> TransitionResult<()> {
        let index = self.checked(id, "report progress", &[StepStatus::InProgress])?;
        self.progress.steps[index].progress = percent.clamp(0, 100) as u8;
        self.recompute();
        Ok(())
    }

    /// `InProgress → Completed`.
    pub fn complete_step(&mut self, id: &str) -> TransitionResult<()> {
        let index = self.checked(id, "complete", &[StepStatus::InProgress])?;
        let now = self.clock.now();
        let step = &mut self.progress.steps[index];
        step.status = StepStatus::Completed;
        step.progress = 100;
        step.end_time = Some(now);
        self.advance_past(index);
        self.recompute();
        Ok(())
    }

    /// `InProgress → Error`. Does not advance `current_step`.
    pub fn fail_step(&mut self, id: &str, message: impl Into<String>) -> TransitionResult<()> {
        let index = self.checked(id, "fail", &[StepStatus::InProgress])?;
        let now = self.clock.now();
        let step = &mut self.progress.steps[index];
        step.status = StepStatus::Error;
        step.end_time = Some(now);
        step.error_message = Some(message.into());
        self.recompute();
        Ok(())
    }

    /// `Error → Pending`, clearing timings and the error message.
    pub fn retry_step(&mut self, id: &str) -> TransitionResult<()> {
        let index = self.checked(id, "retry", &[StepStatus::Error])?;
        let step = &mut self.progress.steps[index];
        step.status = StepStatus::Pending;
        step.progress = 0;
        step.start_time = None;
        step.end_time = None;
        step.error_message = None;
        self.finished_at = None;
        self.recompute();
        Ok(())
    }

    /// `Pending → Completed` with the `skipped` flag set.
    pub fn skip_step(&mut self, id: &str) -> TransitionResult<()> {
        let index = self.checked(id, "skip", &[StepStatus::Pending])?;
        let now = self.clock.now();
        let step = &mut self.progress.steps[index];
        step.status = StepStatus::Completed;
        step.skipped = true;
        step.progress = 100;
        step.end_time = Some(now);
        self.advance_past(index);
        self.recompute();
        Ok(())
    }

    /// Marks the pipeline cancelled and moves to a new epoch.
    ///
    /// Step statuses are left as they are. Returns the new epoch, or `None`
    /// if the pipeline was already cancelled.
    pub fn cancel(&mut self) -> Option<u32> {
        if self.progress.cancelled {
            return None;
        }
        self.progress.cancelled = true;
        self.progress.epoch = self.progress.epoch.wrapping_add(1);
        self.finished_at.get_or_insert_with(|| self.clock.now());
        debug!(pipeline_id = %self.progress.pipeline_id, epoch = self.progress.epoch, "pipeline cancelled");
        Some(self.progress.epoch)
    }

    fn checked(
        &self,
        id: &str,
        action: &'static str,
        allowed: &[StepStatus],
    ) -> TransitionResult<usize> {
        if self.progress.cancelled {
            return Err(self.reject(action, TransitionError::Cancelled));
        }
        let index = self
            .index_of(id)
            .ok_or_else(|| self.reject(action, TransitionError::UnknownStep(id.to_string())))?;
        let status = self.progress.steps[index].status;
        if !allowed.contains(&status) {
            return Err(self.reject(
                action,
                TransitionError::InvalidTransition {
                    step: id.to_string(),
                    action,
                    status,
                },
            ));
        }
        Ok(index)
    }

    fn reject(&self, action: &str, err: TransitionError) -> TransitionError {
        warn!(
            pipeline_id = %self.progress.pipeline_id,
            action,
            error = %err,
            "rejected step transition"
        );
        err
    }

    /// Moves `current_step` to the first non-completed step after `index`,
    /// if `index` was the active step. Never moves backwards.
    fn advance_past(&mut self, index: usize) {
        if self.progress.current_step != index + 1 {
            return;
        }
        let total = self.progress.total_steps;
        let next = self.progress.steps[index + 1..]
            .iter()
            .position(|s| s.status != StepStatus::Completed)
            .map(|offset| index + 2 + offset)
            .unwrap_or(total);
        self.progress.current_step = next.max(self.progress.current_step).min(total.max(1));
    }

    fn recompute(&mut self) {
        let computed = compute_overall(&self.progress.steps, self.weighting);
        self.progress.overall_progress = self.progress.overall_progress.max(computed);
        if self.progress.is_generation_complete() {
            self.finished_at.get_or_insert_with(|| self.clock.now());
        }
    }
}

fn secs_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds().max(0) as f64) / 1000.0
}
