use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Paragraph},
    Frame,
};

/// Renders a placeholder when no logs are available
pub(crate) fn render_logs_placeholder(title: &str, message: &str, area: Rect, frame: &mut Frame) {
    let block = Block::bordered()
        .title(format!(" {} ", title))
        .border_set(border::THICK);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let message_width = message.len() as u16;
    let x = inner_area.x + (inner_area.width.saturating_sub(message_width)) / 2;
    let y = inner_area.y + inner_area.height / 2;

    if x < inner_area.x + inner_area.width && y < inner_area.y + inner_area.height {
        frame
            .buffer_mut()
            .set_string(x, y, message, Style::default().fg(Color::DarkGray));
    }
}

/// Renders buffered log lines, newest at the bottom.
///
/// `scroll` counts lines up from the newest one; 0 follows the tail.
pub(crate) fn render_logs_panel(
    lines: &[&str],
    title: &str,
    error: Option<String>,
    area: Rect,
    frame: &mut Frame,
    is_focused: bool,
    scroll: usize,
) {
    let border_set = if is_focused {
        border::THICK
    } else {
        border::PLAIN
    };

    let mut block = Block::bordered()
        .title(format!(" {} ", title))
        .border_set(border_set)
        .style(if is_focused {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        });
    if let Some(error) = error {
        block = block.title_bottom(Line::from(format!(" ⚠ {} ", error)).red());
    }
    if scroll > 0 {
        block = block.title_top(Line::from(format!(" ↑{} ", scroll)).right_aligned());
    }

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let height = inner_area.height as usize;
    let end = lines.len().saturating_sub(scroll);
    let start = end.saturating_sub(height);

    let text: Vec<Line> = lines[start..end]
        .iter()
        .map(|line| {
            let styled = Line::from(*line);
            if line.contains(" ERROR ") {
                styled.red()
            } else if line.contains(" WARN ") {
                styled.yellow()
            } else {
                styled
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(text), inner_area);
}
