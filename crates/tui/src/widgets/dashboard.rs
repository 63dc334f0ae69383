//! Dashboard widget listing every workflow in a table.
//!
//! Each row shows the workflow's short ID, topic, status, current step and
//! overall progress. Running batches get one summary line each below the
//! table.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::state::{BatchView, WorkflowView};

/// Most batch lines shown under the table.
const MAX_BATCH_LINES: usize = 3;

/// Renders the workflow table, plus batch summaries when there are any.
pub fn render_dashboard(
    frame: &mut Frame,
    area: Rect,
    workflows: &[WorkflowView],
    batches: &[BatchView],
    selected: usize,
) {
    let batch_lines = batches.len().min(MAX_BATCH_LINES);
    let (table_area, batch_area) = if batch_lines == 0 {
        (area, None)
    } else {
        let [table, rest] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(batch_lines as u16 + 2),
        ])
        .areas(area);
        (table, Some(rest))
    };

    let rows: Vec<Row> = workflows
        .iter()
        .map(|w| {
            let label = w.status_label();
            Row::new(vec![
                Cell::from(format_uuid(&w.id())),
                Cell::from(w.topic.clone()),
                Cell::from(label).style(Style::default().fg(status_color(label))),
                Cell::from(format!(
                    "{}/{}",
                    w.progress.current_step, w.progress.total_steps
                )),
                Cell::from(format!("{:.0}%", w.progress.overall_progress)),
            ])
        })
        .collect();

    let header = Row::new(vec![
        Cell::from("ID"),
        Cell::from("Topic"),
        Cell::from("Status"),
        Cell::from("Step"),
        Cell::from("Done"),
    ])
    .style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Cyan),
    );

    let widths = [
        Constraint::Length(8),
        Constraint::Percentage(50),
        Constraint::Length(10),
        Constraint::Length(6),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Dashboard - Workflows")
                .style(Style::default().fg(Color::White)),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut table_state = TableState::default();
    if !workflows.is_empty() {
        table_state.select(Some(selected));
    }
    frame.render_stateful_widget(table, table_area, &mut table_state);

    if let Some(batch_area) = batch_area {
        let lines: Vec<Line> = batches
            .iter()
            .rev()
            .take(MAX_BATCH_LINES)
            .map(|b| Line::from(b.summary()))
            .collect();
        let block = Block::default().borders(Borders::ALL).title("Batches");
        frame.render_widget(Paragraph::new(lines).block(block), batch_area);
    }
}

fn status_color(label: &str) -> Color {
    match label {
        "Running" => Color::Green,
        "Complete" => Color::Cyan,
        "Failed" | "Errors" => Color::Red,
        "Cancelled" => Color::DarkGray,
        _ => Color::Yellow,
    }
}

/// First 8 characters of a UUID.
pub fn format_uuid(uuid: &uuid::Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
