//! One-line status toast.
//!
//! Shows the latest `StatusMessage` colored by severity. Messages with a
//! duration disappear once it has passed; errors stay until replaced or
//! dismissed.

use std::time::{Duration, Instant};

use ck_protocol::{Severity, StatusMessage};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: StatusMessage,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: StatusMessage, shown_at: Instant) -> Self {
        Self { message, shown_at }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.message.duration_ms.is_some_and(|ms| {
            now.saturating_duration_since(self.shown_at) >= Duration::from_millis(u64::from(ms))
        })
    }
}

#[derive(Debug, Default)]
pub struct StatusBar {
    toast: Option<Toast>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: StatusMessage, now: Instant) {
        self.toast = Some(Toast::new(message, now));
    }

    pub fn dismiss(&mut self) {
        self.toast = None;
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.toast.as_ref().map(|t| &t.message)
    }

    /// Drops an expired toast. Returns true if the bar changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let Some(toast) = &self.toast else {
            Paragraph::new(Line::from(Span::styled(
                "Type / for commands · ↑/↓ select · q quit",
                Style::default().fg(Color::DarkGray),
            )))
            .render(area, buf);
            return;
        };

        let (label, color) = severity_style(toast.message.severity);
        let line = Line::from(vec![
            Span::styled(
                format!(" {label} "),
                Style::default()
                    .fg(Color::Black)
                    .bg(color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(toast.message.message.clone(), Style::default().fg(color)),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}

fn severity_style(severity: Severity) -> (&'static str, Color) {
    match severity {
        Severity::Info => ("INFO", Color::Cyan),
        Severity::Success => ("OK", Color::Green),
        Severity::Warning => ("WARN", Color::Yellow),
        Severity::Error => ("ERROR", Color::Red),
    }
}
