use chrono::Utc;
use media_console::Snapshot;
use ratatui::{
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::cmd::console::widgets::formatters::{format_time_ago, format_uptime, truncate_message};

/// Renders the daemon status header
pub(crate) fn render_status_bar(frame: &mut Frame, area: Rect, snapshot: &Snapshot, daemon_url: &str) {
    let now = Utc::now();

    let connection: Span = if snapshot.is_offline() {
        format!("○ offline ({} failed polls)", snapshot.consecutive_failures)
            .red()
            .bold()
    } else if snapshot.last_error.is_some() {
        "◐ retrying".yellow().bold()
    } else if snapshot.last_success.is_some() {
        "● online".green().bold()
    } else {
        "… connecting".dark_gray()
    };

    let refreshed = snapshot
        .last_success
        .map(|at| format!("updated {}", format_time_ago(at, now)))
        .unwrap_or_else(|| "never updated".to_string());

    let mut daemon_line = vec![connection, "  ".into(), daemon_url.cyan(), "  ".into()];
    match &snapshot.status {
        Some(status) => {
            daemon_line.push(if status.running {
                "daemon running".green()
            } else {
                "daemon stopped".yellow()
            });
            if let Some(pid) = status.pid {
                daemon_line.push(format!(" pid {}", pid).into());
            }
            if let Some(started) = status.started_at {
                daemon_line.push(format!(" up {}", format_uptime(started, now)).into());
            }
            if let Some(version) = &status.version {
                daemon_line.push(format!(" v{}", version).dark_gray());
            }
        }
        None => daemon_line.push("no status yet".dark_gray()),
    }
    daemon_line.push(format!("  {}", refreshed).dark_gray());

    let workflow_line = match &snapshot.status {
        Some(status) => {
            let workflow = &status.workflow;
            let mut spans: Vec<Span> = vec!["workflow ".into()];
            match (&workflow.current_item, workflow.running) {
                (Some(item), true) => {
                    spans.push(item.clone().bold());
                    if let Some(stage) = &workflow.current_stage {
                        spans.push(format!(" [{}]", stage).cyan());
                    }
                }
                _ => spans.push("idle".dark_gray()),
            }
            if !workflow.queue_stats.is_empty() {
                let stats = workflow
                    .queue_stats
                    .iter()
                    .map(|(status, count)| format!("{} {}", count, status))
                    .collect::<Vec<_>>()
                    .join(", ");
                spans.push(format!("  | {}", stats).into());
            }
            Line::from(spans)
        }
        None => Line::from(""),
    };

    let error_line = match (&snapshot.last_error, snapshot.status.as_ref()) {
        (Some(err), _) => Line::from(vec![
            format!("{} error: ", err.kind()).red().bold(),
            truncate_message(&err.to_string(), area.width.saturating_sub(20) as usize).red(),
        ]),
        (None, Some(status)) => match &status.workflow.last_error {
            Some(msg) => Line::from(vec![
                "last workflow error: ".yellow(),
                truncate_message(msg, area.width.saturating_sub(24) as usize).into(),
            ]),
            None => Line::from(""),
        },
        (None, None) => Line::from(""),
    };

    let block = Block::bordered()
        .title(" Media Console ".bold())
        .border_set(border::THICK);

    let paragraph = Paragraph::new(vec![Line::from(daemon_line), workflow_line, error_line])
        .block(block);
    frame.render_widget(paragraph, area);
}
