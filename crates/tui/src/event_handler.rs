//! Event handling for the TUI.
//!
//! - Core events update `AppState`, with every progress snapshot passing
//!   through the `ProgressFeed` first
//! - Keyboard events drive the composer, selection and indicator controls

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ck_core::progress::FeedDecision;
use ck_protocol::{BatchProgress, Event, Op, StatusMessage};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::state::{AppState, BatchView, WorkflowView};
use crate::widgets::progress_indicator::{control_for_key, Control, IndicatorActions};
use crate::widgets::{CommandComposer, EventStatus};

/// Applies an event from the core to the view state.
pub fn handle_core_event(state: &mut AppState, event: Event, now: Instant) {
    match event {
        Event::WorkflowCreated { topic, progress } => {
            state.feed.accept(&progress);
            state.upsert(topic, progress);
            state.selected = state.workflows.len().saturating_sub(1);
        }
        Event::ProgressUpdated { progress } => match state.feed.accept(&progress) {
            FeedDecision::Accepted => {
                if let Some(view) = state.workflow_mut(progress.pipeline_id) {
                    view.progress = progress;
                }
            }
            decision => {
                tracing::debug!(
                    workflow_id = %progress.pipeline_id,
                    epoch = progress.epoch,
                    ?decision,
                    "dropping progress snapshot"
                );
            }
        },
        Event::StepLog {
            workflow_id,
            epoch,
            step_id,
            line,
        } => {
            if !state.feed.is_current(workflow_id, epoch) {
                return;
            }
            if let Some(view) = state.workflow_mut(workflow_id) {
                view.push_log(format!("[{step_id}] {line}"));
            }
        }
        Event::WorkflowCancelled { workflow_id, epoch } => {
            state.feed.mark_cancelled(workflow_id, epoch);
            if let Some(view) = state.workflow_mut(workflow_id) {
                view.progress.cancelled = true;
                view.progress.epoch = epoch;
            }
        }
        Event::QuickActionCompleted { result } => {
            tracing::debug!(
                action = %result.action,
                success = result.success,
                artifacts = result.artifacts.len(),
                "quick action finished"
            );
        }
        Event::BatchCreated {
            batch_id,
            course_name,
            total_items,
        } => state.batches.push(BatchView {
            batch_id,
            course_name,
            progress: BatchProgress::new(batch_id, 0, total_items),
            result: None,
        }),
        Event::BatchProgress { progress } => {
            if let Some(batch) = state.batch_mut(progress.batch_id) {
                batch.progress = progress;
            }
        }
        Event::BatchCompleted { result } => {
            if let Some(batch) = state.batch_mut(result.batch_id) {
                batch.result = Some(result);
            }
        }
        Event::EnhancementSuggestions {
            provider_id,
            suggestions,
        } => {
            let count = suggestions.content.len()
                + suggestions.structural.len()
                + suggestions.pedagogical.len();
            state.status.show(
                StatusMessage::info(format!("{provider_id} suggested {count} enhancements")),
                now,
            );
        }
        Event::Status { message } => state.status.show(message, now),
        Event::DashboardState { workflows } => {
            for summary in workflows {
                if state.feed.accept(&summary.progress) == FeedDecision::Accepted {
                    state.upsert(summary.topic, summary.progress);
                }
            }
        }
    }
}

/// Handles a key press.
///
/// With an empty composer, `q`/Esc quit and the indicator's keys act on the
/// selected workflow. Returns `true` if the application should exit.
pub fn handle_keyboard_event(
    key_event: KeyEvent,
    composer: &mut CommandComposer,
    state: &mut AppState,
    actions: &IndicatorActions,
    op_tx: &UnboundedSender<Op>,
    now: Instant,
) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL)
    {
        return true;
    }

    if composer.is_empty() {
        if matches!(key_event.code, KeyCode::Char('q') | KeyCode::Esc) {
            return true;
        }
        let hit = state.selected_workflow().and_then(|view| {
            let offered = actions.offered_for(&view.progress);
            control_for_key(&view.progress, &offered, key_event.code)
                .map(|c| (view.id(), c))
                .or_else(|| dismiss_cancelled(view, actions, key_event.code))
        });
        if let Some((workflow_id, control)) = hit {
            apply_control(control, workflow_id, state, op_tx, now);
            return false;
        }
    }

    if composer.handle_key(key_event) == EventStatus::Consumed {
        return false;
    }

    match key_event.code {
        KeyCode::Esc => composer.clear(),
        KeyCode::Up => state.select_previous(),
        KeyCode::Down => state.select_next(),
        KeyCode::Enter => submit_command(composer, state, op_tx, now),
        _ => {}
    }
    false
}

/// A cancelled run never completes, so the indicator offers no Close. The
/// close key still dismisses it from the dashboard.
fn dismiss_cancelled(
    view: &WorkflowView,
    actions: &IndicatorActions,
    key: KeyCode,
) -> Option<(Uuid, Control)> {
    (view.progress.cancelled && actions.on_close == Some(key)).then(|| (view.id(), Control::Close))
}

fn apply_control(
    control: Control,
    workflow_id: Uuid,
    state: &mut AppState,
    op_tx: &UnboundedSender<Op>,
    now: Instant,
) {
    let op = match control {
        Control::Cancel => Op::CancelWorkflow { workflow_id },
        Control::Retry(index) => Op::RetryStep { workflow_id, index },
        Control::Close => {
            state.close(workflow_id);
            return;
        }
    };
    send(op, state, op_tx, now);
}

fn submit_command(
    composer: &mut CommandComposer,
    state: &mut AppState,
    op_tx: &UnboundedSender<Op>,
    now: Instant,
) {
    let selected = state.selected_workflow().map(|w| w.id());
    match composer.parse_command(selected) {
        Ok(Some(op)) => {
            send(op, state, op_tx, now);
            composer.clear();
        }
        Ok(None) => {}
        Err(message) => state.status.show(StatusMessage::error(message), now),
    }
}

fn send(op: Op, state: &mut AppState, op_tx: &UnboundedSender<Op>, now: Instant) {
    if op_tx.send(op).is_err() {
        state
            .status
            .show(StatusMessage::error("Generation service is not running"), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ck_core::clock::ManualClock;
    use ck_core::progress::ProgressTracker;
    use ck_protocol::Severity;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn created(state: &mut AppState, tracker: &ProgressTracker) {
        handle_core_event(
            state,
            Event::WorkflowCreated {
                topic: "Tides".to_string(),
                progress: tracker.snapshot(),
            },
            Instant::now(),
        );
    }

    struct Harness {
        state: AppState,
        composer: CommandComposer,
        actions: IndicatorActions,
        op_tx: UnboundedSender<Op>,
        op_rx: UnboundedReceiver<Op>,
    }

    impl Harness {
        fn new() -> Self {
            let (op_tx, op_rx) = unbounded_channel();
            Self {
                state: AppState::new(),
                composer: CommandComposer::new(),
                actions: IndicatorActions::with_default_keys(),
                op_tx,
                op_rx,
            }
        }

        fn key(&mut self, code: KeyCode) -> bool {
            handle_keyboard_event(
                press(code),
                &mut self.composer,
                &mut self.state,
                &self.actions,
                &self.op_tx,
                Instant::now(),
            )
        }

        fn type_str(&mut self, text: &str) {
            for c in text.chars() {
                self.key(KeyCode::Char(c));
            }
        }
    }

    #[test]
    fn test_stale_snapshot_after_cancel_is_dropped() {
        let mut tracker = ProgressTracker::from_names(&["A", "B"], ManualClock::starting_now());
        let mut state = AppState::new();
        created(&mut state, &tracker);

        tracker.start_step("A").unwrap();
        let before_cancel = tracker.snapshot();
        let epoch = tracker.cancel().unwrap();

        handle_core_event(
            &mut state,
            Event::WorkflowCancelled {
                workflow_id: tracker.pipeline_id(),
                epoch,
            },
            Instant::now(),
        );
        handle_core_event(
            &mut state,
            Event::ProgressUpdated {
                progress: before_cancel,
            },
            Instant::now(),
        );

        let view = &state.workflows[0];
        assert!(view.progress.cancelled);
        assert_eq!(view.status_label(), "Cancelled");
    }

    #[test]
    fn test_backwards_step_is_dropped() {
        let mut tracker = ProgressTracker::from_names(&["A", "B"], ManualClock::starting_now());
        let mut state = AppState::new();
        created(&mut state, &tracker);

        let early = tracker.snapshot();
        tracker.start_step("A").unwrap();
        tracker.complete_step("A").unwrap();
        let later = tracker.snapshot();

        for progress in [later, early] {
            handle_core_event(&mut state, Event::ProgressUpdated { progress }, Instant::now());
        }
        assert_eq!(state.workflows[0].progress.current_step, 2);
    }

    #[test]
    fn test_logs_from_old_epoch_are_ignored() {
        let mut tracker = ProgressTracker::from_names(&["A"], ManualClock::starting_now());
        let mut state = AppState::new();
        created(&mut state, &tracker);
        let id = tracker.pipeline_id();

        let log = |epoch: u32, line: &str| Event::StepLog {
            workflow_id: id,
            epoch,
            step_id: "A".to_string(),
            line: line.to_string(),
        };
        handle_core_event(&mut state, log(0, "first"), Instant::now());

        let epoch = tracker.cancel().unwrap();
        handle_core_event(
            &mut state,
            Event::WorkflowCancelled { workflow_id: id, epoch },
            Instant::now(),
        );
        handle_core_event(&mut state, log(0, "late"), Instant::now());

        assert_eq!(state.workflows[0].logs, vec!["[A] first".to_string()]);
    }

    #[test]
    fn test_batch_events_update_view() {
        let mut state = AppState::new();
        let batch_id = Uuid::new_v4();
        handle_core_event(
            &mut state,
            Event::BatchCreated {
                batch_id,
                course_name: "Geology".to_string(),
                total_items: 4,
            },
            Instant::now(),
        );
        handle_core_event(
            &mut state,
            Event::BatchProgress {
                progress: BatchProgress::new(batch_id, 1, 4),
            },
            Instant::now(),
        );

        assert_eq!(state.batches[0].progress.progress_percent, 25);
        assert!(state.batches[0].summary().starts_with("Geology: 1/4"));
    }

    #[test]
    fn test_enhancement_suggestions_show_a_toast() {
        let mut state = AppState::new();
        let suggestions = ck_protocol::EnhancementSuggestions {
            content: vec!["Add a diagram".to_string()],
            pedagogical: vec!["Add a warm-up".to_string()],
            ..Default::default()
        };
        handle_core_event(
            &mut state,
            Event::EnhancementSuggestions {
                provider_id: "anthropic".to_string(),
                suggestions,
            },
            Instant::now(),
        );
        assert_eq!(
            state.status.current().map(|m| m.message.as_str()),
            Some("anthropic suggested 2 enhancements")
        );
    }

    #[test]
    fn test_q_quits_only_with_empty_input() {
        let mut h = Harness::new();
        h.type_str("/new Aquifers");
        assert!(!h.key(KeyCode::Char('q')));
        assert!(h.composer.input().ends_with('q'));

        h.composer.clear();
        assert!(h.key(KeyCode::Char('q')));
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let mut h = Harness::new();
        h.type_str("/li");
        let quit = handle_keyboard_event(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut h.composer,
            &mut h.state,
            &h.actions,
            &h.op_tx,
            Instant::now(),
        );
        assert!(quit);
    }

    #[test]
    fn test_enter_sends_parsed_command() {
        let mut h = Harness::new();
        h.type_str("/new Rivers for Grade 4");
        h.key(KeyCode::Enter);

        match h.op_rx.try_recv() {
            Ok(Op::CreateWorkflow { config, .. }) => {
                assert_eq!(config.topic, "Rivers");
                assert_eq!(config.audience, "Grade 4");
            }
            other => panic!("expected CreateWorkflow, got {other:?}"),
        }
        assert!(h.composer.is_empty());
    }

    #[test]
    fn test_invalid_command_shows_error_and_keeps_input() {
        let mut h = Harness::new();
        h.type_str("/run");
        h.key(KeyCode::Enter);

        let message = h.state.status.current().unwrap();
        assert_eq!(message.severity, Severity::Error);
        assert_eq!(message.message, "No workflow selected");
        assert_eq!(h.composer.input(), "/run");
        assert!(h.op_rx.try_recv().is_err());
    }

    #[test]
    fn test_indicator_keys_act_on_selected_workflow() {
        let mut tracker = ProgressTracker::from_names(&["A", "B"], ManualClock::starting_now());
        let mut h = Harness::new();
        created(&mut h.state, &tracker);
        let id = tracker.pipeline_id();

        h.key(KeyCode::Char('c'));
        assert!(matches!(
            h.op_rx.try_recv(),
            Ok(Op::CancelWorkflow { workflow_id }) if workflow_id == id
        ));

        tracker.start_step("A").unwrap();
        tracker.fail_step("A", "quota exceeded").unwrap();
        h.state.workflows[0].progress = tracker.snapshot();
        h.key(KeyCode::Char('r'));
        assert!(matches!(
            h.op_rx.try_recv(),
            Ok(Op::RetryStep { workflow_id, index: 0 }) if workflow_id == id
        ));
    }

    #[test]
    fn test_close_removes_finished_workflow() {
        let mut tracker = ProgressTracker::from_names(&["A"], ManualClock::starting_now());
        let mut h = Harness::new();
        created(&mut h.state, &tracker);

        // Close is only offered once the run is over.
        h.key(KeyCode::Char('x'));
        assert_eq!(h.state.workflows.len(), 1);
        assert_eq!(h.composer.input(), "x");
        h.composer.clear();

        tracker.start_step("A").unwrap();
        tracker.complete_step("A").unwrap();
        h.state.workflows[0].progress = tracker.snapshot();
        h.key(KeyCode::Char('x'));
        assert!(h.state.workflows.is_empty());
    }

    #[test]
    fn test_cancelled_workflow_offers_no_cancel_or_retry_but_can_be_dismissed() {
        let mut tracker = ProgressTracker::from_names(&["A", "B"], ManualClock::starting_now());
        let mut h = Harness::new();
        created(&mut h.state, &tracker);

        tracker.start_step("A").unwrap();
        tracker.fail_step("A", "quota exceeded").unwrap();
        let epoch = tracker.cancel().unwrap();
        handle_core_event(
            &mut h.state,
            Event::WorkflowCancelled {
                workflow_id: tracker.pipeline_id(),
                epoch,
            },
            Instant::now(),
        );

        // Withdrawn keys fall through to the composer.
        for key in ['r', 'c'] {
            h.key(KeyCode::Char(key));
            assert!(h.op_rx.try_recv().is_err());
            assert_eq!(h.composer.input(), key.to_string());
            h.composer.clear();
        }

        h.key(KeyCode::Char('x'));
        assert!(h.state.workflows.is_empty());
    }

    #[test]
    fn test_closed_service_reports_error() {
        let (op_tx, op_rx) = unbounded_channel::<Op>();
        drop(op_rx);
        let mut state = AppState::new();
        let mut composer = CommandComposer::new();
        composer.insert_str("/list");
        handle_keyboard_event(
            press(KeyCode::Enter),
            &mut composer,
            &mut state,
            &IndicatorActions::with_default_keys(),
            &op_tx,
            Instant::now(),
        );
        assert_eq!(
            state.status.current().map(|m| m.message.as_str()),
            Some("Generation service is not running")
        );
    }
}
