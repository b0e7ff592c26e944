use media_console::{LogTracker, Snapshot};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Stylize,
    symbols::border,
    text::Line,
    widgets::{Block, Paragraph, TableState},
    Frame,
};

use crate::cmd::console::state::{DaemonLogPanel, Focus};
use crate::cmd::console::widgets::formatters::truncate_left;

use super::inspect::render_item_popup;
use super::logs::{render_logs_panel, render_logs_placeholder};
use super::queue::render_queue_panel;

/// Renders the main content area including queue table, logs panels, and error states
#[allow(clippy::too_many_arguments)]
pub(crate) fn render_main_view(
    frame: &mut Frame,
    area: Rect,
    snapshot: &Snapshot,
    daemon_url: &str,
    table_state: &mut TableState,
    focus: Focus,
    show_logs: bool,
    tracker: &LogTracker,
    paused: bool,
    log_scroll: usize,
    daemon_log: Option<&DaemonLogPanel>,
) {
    let (body_area, daemon_log_area) = match daemon_log {
        Some(_) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(area);
            (chunks[0], Some(chunks[1]))
        }
        None => (area, None),
    };

    if let (Some(panel), Some(panel_area)) = (daemon_log, daemon_log_area) {
        let path = panel.path.display().to_string();
        let title = format!(
            "Daemon log: {}",
            truncate_left(&path, panel_area.width.saturating_sub(18) as usize)
        );
        let lines: Vec<&str> = panel.lines.iter().map(String::as_str).collect();
        render_logs_panel(
            &lines,
            &title,
            panel.error.clone(),
            panel_area,
            frame,
            false,
            0,
        );
    }

    if snapshot.queue.is_empty() {
        let text = if let (Some(err), None) = (&snapshot.last_error, &snapshot.status) {
            vec![
                Line::from(""),
                Line::from("Error").red().bold().centered(),
                Line::from(""),
                Line::from(err.to_string()).red().centered(),
                Line::from(""),
                Line::from(format!(
                    "Make sure the daemon is running and reachable at {}",
                    daemon_url
                ))
                .yellow()
                .centered(),
            ]
        } else if snapshot.last_updated.is_none() {
            vec![
                Line::from(""),
                Line::from("Connecting to daemon...").dark_gray().centered(),
            ]
        } else {
            vec![
                Line::from(""),
                Line::from("Queue is empty").yellow().centered(),
                Line::from(""),
                Line::from("Items appear here once the daemon picks up new media").centered(),
            ]
        };

        let block = Block::bordered().border_set(border::THICK);
        frame.render_widget(Paragraph::new(text).block(block), body_area);
        return;
    }

    // Split the area if logs are being shown
    let (table_area, logs_area) = if show_logs {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(body_area);
        (chunks[0], Some(chunks[1]))
    } else {
        (body_area, None)
    };

    render_queue_panel(
        &snapshot.queue,
        table_area,
        frame,
        table_state,
        show_logs,
        focus,
    );

    let selected = table_state
        .selected()
        .and_then(|i| snapshot.queue.get(i));

    if let Some(logs_area) = logs_area {
        let title = selected
            .map(|item| format!("#{} {}", item.id, item.display_title()))
            .unwrap_or_else(|| "Unknown".to_string());

        let tracking_selected = selected.is_some_and(|item| tracker.tracked_item() == Some(item.id));
        if tracking_selected && !tracker.lines().is_empty() {
            let lines: Vec<&str> = tracker.lines().iter().collect();
            render_logs_panel(
                &lines,
                &title,
                tracker.last_error().map(ToString::to_string),
                logs_area,
                frame,
                focus == Focus::Logs,
                log_scroll,
            );
        } else {
            let message = if paused {
                "(refresh paused)"
            } else if tracking_selected && tracker.last_error().is_some() {
                "(cannot fetch logs)"
            } else if tracking_selected && tracker.next_sequence() > 0 {
                "(no log events)"
            } else {
                "(loading)"
            };
            render_logs_placeholder(&title, message, logs_area, frame);
        }
    }

    if focus == Focus::Inspect {
        if let Some(item) = selected {
            render_item_popup(item, area, frame);
        }
    }
}
