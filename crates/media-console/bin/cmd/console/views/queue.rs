use crate::cmd::console::state::Focus;
use crate::cmd::console::widgets::formatters::{progress_cell, status_style, truncate_message};
use media_console::QueueItem;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::Text,
    widgets::{Block, Cell, HighlightSpacing, Row, Table, TableState},
    Frame,
};

/// Renders the queue table
pub(crate) fn render_queue_panel(
    queue: &[QueueItem],
    area: Rect,
    frame: &mut Frame,
    table_state: &mut TableState,
    show_logs: bool,
    focus: Focus,
) {
    let available_width = area.width.saturating_sub(10) as usize;
    let title_width = (available_width * 35 / 100).max(16);

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let header = Row::new(vec![
        Cell::from("ID"),
        Cell::from("Title"),
        Cell::from("Status"),
        Cell::from("Stage"),
        Cell::from("Progress"),
    ])
    .style(header_style)
    .height(1);

    let dimmed = show_logs && focus != Focus::Queue;

    let rows: Vec<Row> = queue
        .iter()
        .map(|item| {
            let status_text = if item.error_message.is_some() {
                format!("⚠ {}", item.status)
            } else {
                item.status.to_string()
            };
            let stage = item
                .progress
                .as_ref()
                .and_then(|p| p.stage.clone())
                .unwrap_or_default();
            let percent = item
                .progress
                .as_ref()
                .filter(|_| item.status.is_active())
                .map(|p| p.percent);

            let row = Row::new(vec![
                Cell::from(item.id.to_string()),
                Cell::from(truncate_message(&item.display_title(), title_width)),
                Cell::from(status_text).style(status_style(&item.status)),
                Cell::from(stage),
                progress_cell(percent, 10),
            ]);

            if dimmed {
                row.style(Style::default().fg(Color::DarkGray))
            } else {
                row
            }
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(38),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
        Constraint::Min(18),
    ];

    let selected_row_style = Style::default()
        .add_modifier(Modifier::REVERSED)
        .bg(Color::DarkGray);

    let position = table_state.selected().map_or(0, |i| i + 1);
    let title = format!(" Queue [{}/{}] ", position, queue.len());

    let table_block = if dimmed {
        Block::bordered()
            .title(title)
            .border_set(border::PLAIN)
            .style(Style::default().fg(Color::DarkGray))
    } else {
        Block::bordered().title(title).border_set(border::THICK)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(table_block)
        .column_spacing(1)
        .row_highlight_style(selected_row_style)
        .highlight_symbol(Text::from(">"))
        .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(table, area, table_state);
}
