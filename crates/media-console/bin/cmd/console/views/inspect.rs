use media_console::QueueItem;
use ratatui::{
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::cmd::console::widgets::formatters::status_style;

/// Renders a centered popup with every known detail of a queue item
pub(crate) fn render_item_popup(item: &QueueItem, area: Rect, frame: &mut Frame) {
    // Center the popup at 70% of screen size
    let popup_width = (area.width as f32 * 0.7) as u16;
    let popup_height = (area.height as f32 * 0.7) as u16;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(format!(" Item #{} ", item.id))
        .border_set(border::DOUBLE);

    let field = |name: &str, value: String| {
        Line::from(vec![format!("{:<10}", name).yellow().bold(), value.into()])
    };

    let mut lines = vec![
        field("Title", item.display_title()),
        Line::from(vec![
            format!("{:<10}", "Status").yellow().bold(),
            Span::styled(item.status.to_string(), status_style(&item.status)),
        ]),
    ];
    if let Some(path) = &item.source_path {
        lines.push(field("Source", path.clone()));
    }
    if let Some(progress) = &item.progress {
        if let Some(stage) = &progress.stage {
            lines.push(field("Stage", stage.clone()));
        }
        lines.push(field("Progress", format!("{:.1}%", progress.percent)));
        if let Some(message) = &progress.message {
            lines.push(field("Message", message.clone()));
        }
    }
    if let Some(updated) = item.updated_at {
        lines.push(field("Updated", updated.to_rfc3339()));
    }
    if let Some(error) = &item.error_message {
        lines.push(Line::from(""));
        lines.push(Line::from("Error").red().bold());
        lines.push(Line::from(error.clone()).red());
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
