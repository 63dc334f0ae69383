//! Detail view for the selected workflow.
//!
//! The top half is the workflow's progress indicator; the bottom half is the
//! step output, scrollable with PageUp/PageDown and a scrollbar showing the
//! position.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::state::WorkflowView;
use crate::widgets::progress_indicator::{IndicatorActions, ProgressIndicator};

/// Rows taken by the indicator besides its step lines: borders, gauge and
/// the controls line.
const INDICATOR_CHROME: u16 = 4;

pub struct DetailView {
    /// Lines scrolled from the top of the log.
    pub scroll_offset: usize,
    pub actions: IndicatorActions,
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            scroll_offset: 0,
            actions: IndicatorActions::with_default_keys(),
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        workflow: Option<&WorkflowView>,
        spinner_frame: usize,
    ) {
        let Some(workflow) = workflow else {
            let block = Block::default().borders(Borders::ALL).title("Detail");
            frame.render_widget(
                Paragraph::new("No workflow selected. Type /new <topic> to start one.")
                    .block(block),
                area,
            );
            return;
        };

        let indicator_height = workflow.progress.steps.len() as u16 + INDICATOR_CHROME;
        let [indicator_area, log_area] =
            Layout::vertical([Constraint::Length(indicator_height), Constraint::Min(3)])
                .areas(area);

        frame.render_widget(
            ProgressIndicator::new(
                &workflow.progress,
                self.actions.offered_for(&workflow.progress),
            )
            .spinner_frame(spinner_frame),
            indicator_area,
        );
        self.render_logs(frame, log_area, workflow);
    }

    fn render_logs(&self, frame: &mut Frame, area: Rect, workflow: &WorkflowView) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Output - {}", workflow.topic));

        let text = if workflow.logs.is_empty() {
            "No output yet.".to_string()
        } else {
            workflow.logs.join("\n")
        };

        let paragraph = Paragraph::new(text)
            .block(block)
            .scroll((self.scroll_offset as u16, 0));
        frame.render_widget(paragraph, area);

        let total_lines = workflow.logs.len();
        let visible_lines = area.height.saturating_sub(2) as usize;
        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(self.scroll_offset);

            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(page_size);
    }

    /// `max` is the largest offset, usually total lines minus visible lines.
    pub fn page_down(&mut self, page_size: usize, max: usize) {
        self.scroll_offset = (self.scroll_offset + page_size).min(max);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ck_core::clock::ManualClock;
    use ck_core::progress::ProgressTracker;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn workflow(logs: Vec<String>) -> WorkflowView {
        let mut tracker =
            ProgressTracker::from_names(&["Objectives", "Slides"], ManualClock::starting_now());
        tracker.start_step("Objectives").unwrap();
        let mut view = WorkflowView::new("Volcanoes".to_string(), tracker.snapshot());
        view.logs = logs;
        view
    }

    fn render(view: &DetailView, workflow: Option<&WorkflowView>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                view.render(frame, area, workflow, 0);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_without_selection() {
        let text = render(&DetailView::new(), None);
        assert!(text.contains("No workflow selected"));
    }

    #[test]
    fn test_render_shows_indicator_and_logs() {
        let wf = workflow(vec!["drafting objectives".to_string()]);
        let text = render(&DetailView::new(), Some(&wf));

        assert!(text.contains("Generating Content..."));
        assert!(text.contains("Objectives"));
        assert!(text.contains("Output - Volcanoes"));
        assert!(text.contains("drafting objectives"));
    }

    #[test]
    fn test_render_without_logs() {
        let wf = workflow(Vec::new());
        let text = render(&DetailView::new(), Some(&wf));
        assert!(text.contains("No output yet."));
    }

    #[test]
    fn test_paging_is_bounded() {
        let mut view = DetailView::new();
        view.page_down(10, 25);
        assert_eq!(view.scroll_offset, 10);
        view.page_down(10, 25);
        view.page_down(10, 25);
        assert_eq!(view.scroll_offset, 25);

        view.page_up(100);
        assert_eq!(view.scroll_offset, 0);

        view.page_down(5, 25);
        view.scroll_to_top();
        assert_eq!(view.scroll_offset, 0);
    }
}
