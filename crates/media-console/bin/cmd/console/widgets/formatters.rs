use chrono::{DateTime, Utc};
use media_console::ItemStatus;
use ratatui::{
    style::{Color, Style},
    widgets::Cell,
};

pub(crate) fn truncate_left(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let tail: String = s.chars().skip(len - keep).collect();
        format!("...{}", tail)
    }
}

pub(crate) fn truncate_message(msg: &str, max_len: usize) -> String {
    if msg.chars().count() <= max_len {
        msg.to_string()
    } else {
        let truncated: String = msg.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

pub(crate) fn status_style(status: &ItemStatus) -> Style {
    let color = match status {
        ItemStatus::Completed => Color::Green,
        ItemStatus::Failed => Color::Red,
        ItemStatus::Review => Color::Magenta,
        ItemStatus::Pending => Color::Gray,
        ItemStatus::Other(_) => Color::DarkGray,
        _ => Color::Cyan,
    };
    Style::default().fg(color)
}

/// Progress bar cell such as `[#####-----]  50%`.
pub(crate) fn progress_cell(percent: Option<f64>, width: usize) -> Cell<'static> {
    let Some(percent) = percent else {
        return Cell::from("");
    };
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let bar = format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled)),
        percent
    );

    let color = if percent >= 100.0 {
        Color::Green
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::Cyan
    };

    Cell::from(bar).style(Style::default().fg(color))
}

/// Formats the time since `at` as "now", "1s ago", "3m ago", "2h ago".
pub(crate) fn format_time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);

    if secs < 1 {
        "now".to_string()
    } else if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

/// Formats an uptime as `1h02m` or `4m10s`.
pub(crate) fn format_uptime(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - since).num_seconds().max(0);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h{:02}m", hours, minutes)
    } else {
        format!("{}m{:02}s", minutes, seconds)
    }
}
