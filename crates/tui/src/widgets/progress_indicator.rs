//! Progress indicator for a single generation run.
//!
//! Rendering is a pure function of a `GenerationProgress` snapshot and the
//! actions the host offers. Which controls appear is exposed on its own
//! through [`visible_controls`], so hosts can resolve key presses without
//! rendering anything.

use ck_protocol::{GenerationProgress, GenerationStep, StepStatus};
use crossterm::event::KeyCode;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};

pub const TITLE_RUNNING: &str = "Generating Content...";
pub const TITLE_COMPLETE: &str = "Generation Complete!";
pub const TITLE_WITH_ERRORS: &str = "Generation Completed with Errors";

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Actions the host wires up, each bound to a key. `None` hides the control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorActions {
    pub on_cancel: Option<KeyCode>,
    pub on_retry: Option<KeyCode>,
    pub on_close: Option<KeyCode>,
}

impl IndicatorActions {
    /// `c` cancels, `r` retries, `x` closes.
    pub fn with_default_keys() -> Self {
        Self {
            on_cancel: Some(KeyCode::Char('c')),
            on_retry: Some(KeyCode::Char('r')),
            on_close: Some(KeyCode::Char('x')),
        }
    }

    /// Actions a host still offers for `progress`. A cancelled run accepts no
    /// further steps, so cancel and retry are withdrawn.
    pub fn offered_for(self, progress: &GenerationProgress) -> Self {
        if progress.cancelled {
            Self {
                on_cancel: None,
                on_retry: None,
                ..self
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Cancel,
    /// Retry the failed step at this 0-based index.
    Retry(usize),
    /// Dismiss the indicator. Labelled "View Results" when every step succeeded.
    Close,
}

/// Controls the indicator shows for `progress`.
///
/// - `Retry` for each step in `Error`, if a retry action is wired up
/// - `Cancel` until generation is complete
/// - `Close` once generation is complete
pub fn visible_controls(progress: &GenerationProgress, actions: &IndicatorActions) -> Vec<Control> {
    let finished = progress.is_generation_complete();
    let mut controls = Vec::new();

    if actions.on_retry.is_some() {
        controls.extend(
            progress
                .steps
                .iter()
                .enumerate()
                .filter(|(_, step)| step.status == StepStatus::Error)
                .map(|(index, _)| Control::Retry(index)),
        );
    }
    if !finished && actions.on_cancel.is_some() {
        controls.push(Control::Cancel);
    }
    if finished && actions.on_close.is_some() {
        controls.push(Control::Close);
    }
    controls
}

/// Resolves a key press to a visible control. A retry key retries the first
/// failed step.
pub fn control_for_key(
    progress: &GenerationProgress,
    actions: &IndicatorActions,
    key: KeyCode,
) -> Option<Control> {
    visible_controls(progress, actions)
        .into_iter()
        .find(|control| {
            let binding = match control {
                Control::Cancel => actions.on_cancel,
                Control::Retry(_) => actions.on_retry,
                Control::Close => actions.on_close,
            };
            binding == Some(key)
        })
}

pub fn title(progress: &GenerationProgress) -> &'static str {
    if !progress.is_generation_complete() {
        TITLE_RUNNING
    } else if progress.has_errors() {
        TITLE_WITH_ERRORS
    } else {
        TITLE_COMPLETE
    }
}

pub fn status_color(status: StepStatus) -> Color {
    match status {
        StepStatus::Completed => Color::Green,
        StepStatus::InProgress => Color::Blue,
        StepStatus::Error => Color::Red,
        StepStatus::Pending => Color::DarkGray,
    }
}

fn status_symbol(status: StepStatus, spinner_frame: usize) -> &'static str {
    match status {
        StepStatus::Completed => "✓",
        StepStatus::InProgress => SPINNER[spinner_frame % SPINNER.len()],
        StepStatus::Error => "✗",
        StepStatus::Pending => "○",
    }
}

fn key_label(key: KeyCode) -> String {
    match key {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}").to_lowercase(),
    }
}

/// Formats seconds as `45s`, `3m 05s` or `1h 02m`.
pub fn format_secs(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    match total {
        0..=59 => format!("{total}s"),
        60..=3599 => format!("{}m {:02}s", total / 60, total % 60),
        _ => format!("{}h {:02}m", total / 3600, (total % 3600) / 60),
    }
}

pub struct ProgressIndicator<'a> {
    progress: &'a GenerationProgress,
    actions: IndicatorActions,
    spinner_frame: usize,
}

impl<'a> ProgressIndicator<'a> {
    pub fn new(progress: &'a GenerationProgress, actions: IndicatorActions) -> Self {
        Self {
            progress,
            actions,
            spinner_frame: 0,
        }
    }

    pub fn spinner_frame(mut self, frame: usize) -> Self {
        self.spinner_frame = frame;
        self
    }

    fn gauge_label(&self) -> String {
        let p = self.progress;
        let mut label = format!(
            "{:.0}% · step {}/{}",
            p.overall_progress, p.current_step, p.total_steps
        );
        if p.elapsed_time > 0.0 {
            label.push_str(&format!(" · {} elapsed", format_secs(p.elapsed_time)));
        }
        if !p.is_generation_complete() && !p.cancelled && p.remaining_time > 0.0 {
            label.push_str(&format!(" · ~{} left", format_secs(p.remaining_time)));
        }
        label
    }

    fn step_line(&self, index: usize, step: &GenerationStep, controls: &[Control]) -> Line<'static> {
        let color = status_color(step.status);
        let mut spans = vec![
            Span::styled(
                format!("{} ", status_symbol(step.status, self.spinner_frame)),
                Style::default().fg(color),
            ),
            Span::styled(step.name.clone(), Style::default().fg(color)),
        ];

        match step.status {
            StepStatus::InProgress => {
                spans.push(Span::styled(
                    format!("  {}%", step.progress),
                    Style::default().fg(color),
                ));
            }
            StepStatus::Error => {
                if let Some(message) = &step.error_message {
                    spans.push(Span::styled(
                        format!("  {message}"),
                        Style::default().fg(color),
                    ));
                }
            }
            StepStatus::Completed | StepStatus::Pending => {}
        }

        if step.skipped {
            spans.push(Span::styled(
                "  [skipped]",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ));
        }
        if controls.contains(&Control::Retry(index)) {
            if let Some(key) = self.actions.on_retry {
                spans.push(Span::styled(
                    format!("  [{}] Retry", key_label(key)),
                    Style::default().fg(Color::Yellow),
                ));
            }
        }
        Line::from(spans)
    }

    fn controls_line(&self, controls: &[Control]) -> Line<'static> {
        let mut spans = Vec::new();
        if self.progress.cancelled {
            spans.push(Span::styled(
                "[cancelled]",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        for control in controls {
            let (key, label) = match control {
                Control::Cancel => (self.actions.on_cancel, "Cancel"),
                Control::Close if !self.progress.has_errors() => {
                    (self.actions.on_close, "View Results")
                }
                Control::Close => (self.actions.on_close, "Close"),
                Control::Retry(_) => continue,
            };
            if let Some(key) = key {
                if !spans.is_empty() {
                    spans.push(Span::raw("  "));
                }
                spans.push(Span::styled(
                    format!("[{}] {label}", key_label(key)),
                    Style::default().fg(Color::Yellow),
                ));
            }
        }
        Line::from(spans)
    }
}

impl Widget for ProgressIndicator<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = title(self.progress);
        let border_color = match title {
            _ if self.progress.cancelled => Color::DarkGray,
            TITLE_COMPLETE => Color::Green,
            TITLE_WITH_ERRORS => Color::Red,
            _ => Color::Blue,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        block.render(area, buf);

        let [gauge_area, steps_area, controls_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio((self.progress.overall_progress / 100.0).clamp(0.0, 1.0))
            .label(self.gauge_label())
            .render(gauge_area, buf);

        let controls = visible_controls(self.progress, &self.actions);
        let lines: Vec<Line> = self
            .progress
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.step_line(index, step, &controls))
            .collect();
        Paragraph::new(lines).render(steps_area, buf);
        Paragraph::new(self.controls_line(&controls)).render(controls_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use uuid::Uuid;

    fn progress(statuses: &[StepStatus]) -> GenerationProgress {
        let steps: Vec<GenerationStep> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut step = GenerationStep::pending(format!("s{i}"), format!("Step {i}"));
                step.status = *status;
                if *status == StepStatus::Completed {
                    step.progress = 100;
                }
                step
            })
            .collect();
        let done = steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        GenerationProgress {
            pipeline_id: Uuid::new_v4(),
            epoch: 0,
            current_step: (done + 1).min(steps.len()),
            total_steps: steps.len(),
            overall_progress: 100.0 * done as f64 / steps.len() as f64,
            steps,
            start_time: None,
            elapsed_time: 0.0,
            remaining_time: 0.0,
            estimated_total_time: 0.0,
            cancelled: false,
        }
    }

    fn render(progress: &GenerationProgress, actions: IndicatorActions) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(70, 12)).unwrap();
        terminal
            .draw(|frame| {
                frame.render_widget(ProgressIndicator::new(progress, actions), frame.area());
            })
            .unwrap();
        terminal
    }

    fn rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer.cell((x, y)).map_or(" ", |c| c.symbol()))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_titles_follow_state() {
        use StepStatus::*;
        assert_eq!(title(&progress(&[Completed, InProgress])), TITLE_RUNNING);
        assert_eq!(title(&progress(&[Completed, Completed])), TITLE_COMPLETE);
        assert_eq!(title(&progress(&[Completed, Error])), TITLE_WITH_ERRORS);
    }

    #[test]
    fn test_cancelled_run_keeps_its_title_and_shows_a_badge() {
        use StepStatus::*;
        let mut p = progress(&[Completed, InProgress, Pending]);
        p.cancelled = true;
        assert_eq!(title(&p), TITLE_RUNNING);

        let offered = IndicatorActions::with_default_keys().offered_for(&p);
        assert_eq!(offered.on_cancel, None);
        assert_eq!(offered.on_retry, None);
        assert!(visible_controls(&p, &offered).is_empty());

        let text = rows(&render(&p, offered)).join("\n");
        assert!(text.contains(TITLE_RUNNING));
        assert!(text.contains("[cancelled]"));
        assert!(!text.contains("[c] Cancel"));
        assert!(!text.contains("Close"));
    }

    #[test]
    fn test_offered_actions_unchanged_while_running() {
        use StepStatus::*;
        let actions = IndicatorActions::with_default_keys();
        assert_eq!(actions.offered_for(&progress(&[InProgress])), actions);
    }

    #[test]
    fn test_retry_only_on_error_rows() {
        use StepStatus::*;
        let p = progress(&[Completed, Error, Pending]);
        let actions = IndicatorActions::with_default_keys();
        assert_eq!(
            visible_controls(&p, &actions),
            vec![Control::Retry(1), Control::Cancel]
        );

        let no_retry = IndicatorActions {
            on_retry: None,
            ..actions
        };
        assert_eq!(visible_controls(&p, &no_retry), vec![Control::Cancel]);
    }

    #[test]
    fn test_cancel_while_running_close_when_done() {
        use StepStatus::*;
        let actions = IndicatorActions::with_default_keys();
        assert_eq!(
            visible_controls(&progress(&[InProgress, Pending]), &actions),
            vec![Control::Cancel]
        );
        assert_eq!(
            visible_controls(&progress(&[Completed, Completed]), &actions),
            vec![Control::Close]
        );
        assert!(visible_controls(&progress(&[Completed]), &IndicatorActions::default()).is_empty());
    }

    #[test]
    fn test_key_resolves_to_control() {
        use StepStatus::*;
        let p = progress(&[Error, Error]);
        let actions = IndicatorActions::with_default_keys();
        assert_eq!(
            control_for_key(&p, &actions, KeyCode::Char('r')),
            Some(Control::Retry(0))
        );
        assert_eq!(
            control_for_key(&p, &actions, KeyCode::Char('x')),
            Some(Control::Close)
        );
        assert_eq!(control_for_key(&p, &actions, KeyCode::Char('c')), None);
    }

    #[test]
    fn test_renders_rows_and_controls() {
        use StepStatus::*;
        let mut p = progress(&[Completed, Error, Pending]);
        p.steps[0].skipped = true;
        p.steps[1].error_message = Some("quota exceeded".to_string());

        let terminal = render(&p, IndicatorActions::with_default_keys());
        let text = rows(&terminal).join("\n");

        assert!(text.contains(TITLE_RUNNING));
        assert!(text.contains("[skipped]"));
        assert!(text.contains("quota exceeded"));
        assert!(text.contains("[r] Retry"));
        assert!(text.contains("[c] Cancel"));
        assert!(!text.contains("View Results"));
    }

    #[test]
    fn test_complete_shows_view_results() {
        use StepStatus::*;
        let terminal = render(
            &progress(&[Completed, Completed]),
            IndicatorActions::with_default_keys(),
        );
        let text = rows(&terminal).join("\n");
        assert!(text.contains(TITLE_COMPLETE));
        assert!(text.contains("[x] View Results"));
        assert!(!text.contains("Cancel"));
    }

    #[test]
    fn test_rows_are_colored_by_status() {
        use StepStatus::*;
        let terminal = render(
            &progress(&[Completed, Error, Pending]),
            IndicatorActions::default(),
        );
        let buffer = terminal.backend().buffer();
        let rows = rows(&terminal);

        for (name, color) in [
            ("Step 0", Color::Green),
            ("Step 1", Color::Red),
            ("Step 2", Color::DarkGray),
        ] {
            let y = rows.iter().position(|r| r.contains(name)).unwrap() as u16;
            let x = rows[y as usize]
                .chars()
                .position(|c| c == 'S')
                .unwrap() as u16;
            assert_eq!(buffer.cell((x, y)).unwrap().fg, color, "{name}");
        }
    }

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(42.4), "42s");
        assert_eq!(format_secs(185.0), "3m 05s");
        assert_eq!(format_secs(3720.0), "1h 02m");
        assert_eq!(format_secs(-3.0), "0s");
    }
}
