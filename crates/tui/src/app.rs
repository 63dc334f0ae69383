//! TUI application state and event loop.
//!
//! `App` owns the view state and the widgets. Its loop multiplexes core
//! events, terminal input and a tick that drives the spinner and toast
//! expiry with `tokio::select!`.

use std::time::{Duration, Instant};

use anyhow::Result;
use ck_protocol::{Event, Op, StepStatus};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    widgets::Clear,
    Frame,
};
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedSender};
use tokio_stream::StreamExt;

use crate::event_handler;
use crate::state::AppState;
use crate::tui::{Tui, TuiEvent};
use crate::widgets::dashboard::render_dashboard;
use crate::widgets::{CommandComposer, DetailView};

const TICK: Duration = Duration::from_millis(100);
const PAGE_SIZE: usize = 10;

pub struct App {
    pub state: AppState,
    pub composer: CommandComposer,
    pub detail: DetailView,
    pub op_tx: UnboundedSender<Op>,
    pub event_rx: Receiver<Event>,
    pub should_exit: bool,
    spinner_frame: usize,
}

impl App {
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: Receiver<Event>) -> Self {
        Self {
            state: AppState::new(),
            composer: CommandComposer::new(),
            detail: DetailView::new(),
            op_tx,
            event_rx,
            should_exit: false,
            spinner_frame: 0,
        }
    }

    /// Runs until the user quits, then asks the service to shut down.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();
        let mut tick = tokio::time::interval(TICK);

        let _ = self.op_tx.send(Op::GetDashboardState);
        frames.schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_core_event(event, Instant::now());
                    frames.schedule_frame();
                }
                Some(tui_event) = tui_events.next() => {
                    self.handle_tui_event(tui, tui_event)?;
                }
                _ = tick.tick() => {
                    if self.on_tick(Instant::now()) {
                        frames.schedule_frame();
                    }
                }
            }
        }

        let _ = self.op_tx.send(Op::Shutdown);
        Ok(())
    }

    fn handle_core_event(&mut self, event: Event, now: Instant) {
        event_handler::handle_core_event(&mut self.state, event, now);
    }

    fn handle_tui_event(&mut self, tui: &mut Tui, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Key(key_event) => {
                self.handle_key_event(key_event, Instant::now());
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Paste(text) => {
                self.composer.insert_str(&text);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Draw => {
                tui.draw(|frame| self.render(frame))?;
            }
        }
        Ok(())
    }

    /// Advances the spinner and expires toasts. Returns true if a redraw
    /// is needed.
    fn on_tick(&mut self, now: Instant) -> bool {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        let expired = self.state.status.expire(now);
        let running = self
            .state
            .workflows
            .iter()
            .any(|w| w.progress.count_with_status(StepStatus::InProgress) > 0);
        expired || running
    }

    fn handle_key_event(&mut self, key_event: KeyEvent, now: Instant) {
        let log_len = self.state.selected_workflow().map_or(0, |w| w.logs.len());
        match key_event.code {
            KeyCode::PageUp => {
                self.detail.page_up(PAGE_SIZE);
                return;
            }
            KeyCode::PageDown => {
                self.detail.page_down(PAGE_SIZE, log_len);
                return;
            }
            _ => {}
        }

        let selected_before = self.state.selected_workflow().map(|w| w.id());
        self.should_exit = event_handler::handle_keyboard_event(
            key_event,
            &mut self.composer,
            &mut self.state,
            &self.detail.actions,
            &self.op_tx,
            now,
        );
        if self.state.selected_workflow().map(|w| w.id()) != selected_before {
            self.detail.scroll_to_top();
        }
    }

    fn render(&self, frame: &mut Frame) {
        let [dashboard_area, detail_area, status_area, composer_area] = Layout::vertical([
            Constraint::Percentage(35),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .areas(frame.area());

        render_dashboard(
            frame,
            dashboard_area,
            &self.state.workflows,
            &self.state.batches,
            self.state.selected,
        );
        self.detail.render(
            frame,
            detail_area,
            self.state.selected_workflow(),
            self.spinner_frame,
        );
        self.state.status.render(status_area, frame.buffer_mut());
        self.composer.render(composer_area, frame.buffer_mut());

        if self.composer.should_show_popup() {
            let popup = popup_area(composer_area, self.composer.suggestions().len());
            frame.render_widget(Clear, popup);
            self.composer.render_popup(popup, frame.buffer_mut());
        }
    }
}

/// Area just above the composer, tall enough for `rows` suggestions.
fn popup_area(composer: Rect, rows: usize) -> Rect {
    let height = (rows as u16 + 2).min(composer.y);
    Rect {
        x: composer.x,
        y: composer.y - height,
        width: composer.width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ck_core::clock::ManualClock;
    use ck_core::progress::ProgressTracker;
    use ck_protocol::StatusMessage;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::sync::mpsc::{channel, unbounded_channel, UnboundedReceiver};

    fn app() -> (App, UnboundedReceiver<Op>) {
        let (op_tx, op_rx) = unbounded_channel();
        let (_event_tx, event_rx) = channel(16);
        (App::new(op_tx, event_rx), op_rx)
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn add_workflow(app: &mut App, topic: &str) -> ProgressTracker {
        let tracker =
            ProgressTracker::from_names(&["Objectives", "Slides"], ManualClock::starting_now());
        app.handle_core_event(
            Event::WorkflowCreated {
                topic: topic.to_string(),
                progress: tracker.snapshot(),
            },
            Instant::now(),
        );
        tracker
    }

    #[test]
    fn test_app_renders_empty_screen() {
        let (app, _op_rx) = app();
        let text = screen(&app);

        assert!(text.contains("Dashboard"));
        assert!(text.contains("Detail"));
        assert!(text.contains("Command"));
        assert!(text.contains("Type / for commands"));
    }

    #[test]
    fn test_app_quit_on_q() {
        let (mut app, _op_rx) = app();
        assert!(!app.should_exit);
        app.handle_key_event(KeyEvent::from(KeyCode::Char('q')), Instant::now());
        assert!(app.should_exit);
    }

    #[test]
    fn test_created_workflow_is_selected_and_shown() {
        let (mut app, _op_rx) = app();
        add_workflow(&mut app, "Glaciers");
        add_workflow(&mut app, "Deserts");

        assert_eq!(app.state.workflows.len(), 2);
        assert_eq!(app.state.selected, 1);

        let text = screen(&app);
        assert!(text.contains("Deserts"));
        assert!(text.contains("Generating Content..."));
    }

    #[test]
    fn test_navigation_with_arrow_keys() {
        let (mut app, _op_rx) = app();
        for topic in ["A", "B", "C"] {
            add_workflow(&mut app, topic);
        }
        assert_eq!(app.state.selected, 2);

        app.handle_key_event(KeyEvent::from(KeyCode::Up), Instant::now());
        app.handle_key_event(KeyEvent::from(KeyCode::Up), Instant::now());
        app.handle_key_event(KeyEvent::from(KeyCode::Up), Instant::now());
        assert_eq!(app.state.selected, 0);

        app.handle_key_event(KeyEvent::from(KeyCode::Down), Instant::now());
        assert_eq!(app.state.selected, 1);
    }

    #[test]
    fn test_selection_change_resets_scroll() {
        let (mut app, _op_rx) = app();
        add_workflow(&mut app, "A");
        add_workflow(&mut app, "B");
        for i in 0..40 {
            app.state.workflows[1].push_log(format!("line {i}"));
        }

        app.handle_key_event(KeyEvent::from(KeyCode::PageDown), Instant::now());
        assert_eq!(app.detail.scroll_offset, PAGE_SIZE);

        app.handle_key_event(KeyEvent::from(KeyCode::Up), Instant::now());
        assert_eq!(app.detail.scroll_offset, 0);
    }

    #[test]
    fn test_slash_opens_suggestions() {
        let (mut app, _op_rx) = app();
        app.handle_key_event(KeyEvent::from(KeyCode::Char('/')), Instant::now());

        let text = screen(&app);
        assert!(text.contains("Suggestions"));
        assert!(text.contains("/retry <n>"));
    }

    #[test]
    fn test_tick_expires_toast_and_animates_running_steps() {
        let (mut app, _op_rx) = app();
        let start = Instant::now();
        app.state.status.show(StatusMessage::info("Saved"), start);

        assert!(!app.on_tick(start));
        assert!(app.on_tick(start + Duration::from_secs(10)));
        assert!(app.state.status.current().is_none());

        let mut tracker = add_workflow(&mut app, "Volcanoes");
        tracker.start_step("Objectives").unwrap();
        app.state.workflows[0].progress = tracker.snapshot();
        assert!(app.on_tick(Instant::now()));
    }

    #[test]
    fn test_popup_area_sits_above_composer() {
        let composer = Rect::new(0, 27, 100, 3);
        let popup = popup_area(composer, 8);
        assert_eq!(popup, Rect::new(0, 17, 100, 10));

        let cramped = popup_area(Rect::new(0, 2, 100, 3), 8);
        assert_eq!(cramped.y, 0);
        assert_eq!(cramped.height, 2);
    }
}
