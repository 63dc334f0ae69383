//! Command composer widget with slash command autocomplete.
//!
//! This widget provides a text input field for entering commands, with
//! autocomplete suggestions when the user types a slash command. Parsed
//! commands become `Op`s; lesson parameters are validated before they leave
//! the composer.

use ck_core::validation::{summarize, validate_config, validate_quick_action};
use ck_protocol::{ContentType, GenerationConfig, Op, QuickAction, QuizType};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use uuid::Uuid;

use super::EventStatus;

/// Audience used when `/new` or `/quick` does not name one.
pub const DEFAULT_AUDIENCE: &str = "General audience";

/// Available slash commands with their descriptions.
const COMMANDS: &[(&str, &str)] = &[
    ("/new <topic> [for <audience>]", "Create a lesson workflow"),
    ("/run", "Run the remaining steps"),
    ("/step <n>", "Run step n"),
    ("/skip <n>", "Skip step n"),
    ("/retry <n>", "Reset failed step n"),
    ("/cancel", "Cancel the selected workflow"),
    ("/quick <action> <topic>", "slides_only, assessment_suite, ..."),
    ("/list", "Refresh the dashboard"),
];

#[derive(Debug, Clone, Default)]
pub struct CommandComposer {
    input: String,
    /// Cursor position in characters.
    cursor_pos: usize,
    show_popup: bool,
    /// Selected index in the autocomplete list
    selected_index: usize,
}

impl CommandComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn should_show_popup(&self) -> bool {
        self.show_popup
    }

    /// Commands matching the typed prefix.
    pub fn suggestions(&self) -> Vec<(&'static str, &'static str)> {
        if !self.input.starts_with('/') {
            return Vec::new();
        }

        let filter = self.input.trim();
        if filter == "/" {
            return COMMANDS.to_vec();
        }

        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(filter))
            .copied()
            .collect()
    }

    pub fn selected_suggestion(&self) -> Option<(&'static str, &'static str)> {
        self.suggestions().get(self.selected_index).copied()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_pos)
            .map_or(self.input.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor_pos += 1;
        self.update_popup_state();
    }

    /// Inserts pasted text, dropping line breaks.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.insert_char(c);
        }
    }

    /// Backspace.
    pub fn delete_char(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_index();
            self.input.remove(at);
            self.update_popup_state();
        }
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
        self.show_popup = false;
        self.selected_index = 0;
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            self.cursor_pos += 1;
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.suggestions().len() {
            self.selected_index += 1;
        }
    }

    /// Replaces the input with the selected command name (Tab key).
    pub fn complete_with_selection(&mut self) {
        if let Some((cmd, _)) = self.selected_suggestion() {
            let cmd_name = cmd.split_whitespace().next().unwrap_or(cmd);
            self.input = format!("{cmd_name} ");
            self.cursor_pos = self.input.chars().count();
            self.show_popup = false;
            self.selected_index = 0;
        }
    }

    fn update_popup_state(&mut self) {
        self.show_popup = self.input.starts_with('/') && !self.input.contains(' ');

        let suggestions = self.suggestions();
        if self.selected_index >= suggestions.len() {
            self.selected_index = suggestions.len().saturating_sub(1);
        }
    }

    /// Editing keys. Enter, Esc and anything the composer does not own are
    /// left to the caller.
    pub fn handle_key(&mut self, key: KeyEvent) -> EventStatus {
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Tab if self.show_popup => self.complete_with_selection(),
            KeyCode::Up if self.show_popup => self.move_selection_up(),
            KeyCode::Down if self.show_popup => self.move_selection_down(),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Command (q to quit)");

        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(format!("> {}", self.input))
            .style(Style::default().fg(Color::Yellow))
            .render(inner, buf);
    }

    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if !self.show_popup {
            return;
        }

        let suggestions = self.suggestions();
        if suggestions.is_empty() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Suggestions")
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(area);
        block.render(area, buf);

        for (i, (cmd, desc)) in suggestions.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.y + inner.height {
                break;
            }

            let style = if i == self.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("{cmd:<32}"), style),
                Span::styled(desc.to_string(), style.fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }

    /// Parses the input into an `Op`.
    ///
    /// Workflow commands act on `selected`; step numbers are 1-based.
    /// Returns `Ok(None)` for blank input and `Err` with a message for the
    /// status bar otherwise.
    pub fn parse_command(&self, selected: Option<Uuid>) -> Result<Option<Op>, String> {
        let input = self.input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        if !input.starts_with('/') {
            return Err("Invalid command. Commands must start with '/'".to_string());
        }

        let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();
        let workflow = || selected.ok_or_else(|| "No workflow selected".to_string());

        let op = match cmd {
            "/new" => Op::CreateWorkflow {
                config: new_lesson_config(rest)?,
                template: None,
            },
            "/run" => Op::RunWorkflow {
                workflow_id: workflow()?,
            },
            "/step" => Op::ExecuteStep {
                workflow_id: workflow()?,
                index: step_index(rest)?,
            },
            "/skip" => Op::SkipStep {
                workflow_id: workflow()?,
                index: step_index(rest)?,
            },
            "/retry" => Op::RetryStep {
                workflow_id: workflow()?,
                index: step_index(rest)?,
            },
            "/cancel" => Op::CancelWorkflow {
                workflow_id: workflow()?,
            },
            "/quick" => {
                let (action, topic) = rest.split_once(' ').ok_or("Usage: /quick <action> <topic>")?;
                let action: QuickAction = action.parse()?;
                let config = GenerationConfig::new(topic.trim(), DEFAULT_AUDIENCE);
                let issues = validate_quick_action(&config);
                if !issues.is_empty() {
                    return Err(summarize(&issues));
                }
                Op::ExecuteQuickAction { action, config }
            }
            "/list" => Op::GetDashboardState,
            _ => return Err(format!("Unknown command: {cmd}")),
        };
        Ok(Some(op))
    }
}

/// Builds the config for `/new <topic> [for <audience>]`.
fn new_lesson_config(args: &str) -> Result<GenerationConfig, String> {
    let (topic, audience) = match args.rsplit_once(" for ") {
        Some((topic, audience)) => (topic.trim(), audience.trim()),
        None => (args, DEFAULT_AUDIENCE),
    };
    let mut config = GenerationConfig::new(topic, audience).with_content_types(vec![
        ContentType::Slides,
        ContentType::Worksheet,
        ContentType::Quiz,
    ]);
    config.quiz_types = vec![QuizType::MultipleChoice];

    let issues = validate_config(&config);
    if issues.is_empty() {
        Ok(config)
    } else {
        Err(summarize(&issues))
    }
}

/// Converts a 1-based step number to an index.
fn step_index(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("Invalid step number '{arg}'")),
    }
}
