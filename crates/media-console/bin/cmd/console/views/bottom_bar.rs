use ratatui::{
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::cmd::console::state::Focus;

/// Renders the bottom controls bar showing context-aware keybindings
pub(crate) fn render_bottom_bar(
    frame: &mut Frame,
    area: Rect,
    focus: Focus,
    paused: bool,
    has_daemon_log: bool,
) {
    let mut spans: Vec<Span> = vec![
        " Quit ".into(),
        "<q> ".blue().bold(),
        " | Navigate ".into(),
        "<←↑↓→/hjkl> ".blue().bold(),
    ];

    match focus {
        Focus::Queue => spans.extend([
            " | Logs ".into(),
            "<o> ".blue().bold(),
            " | Details ".into(),
            "<i> ".blue().bold(),
        ]),
        Focus::Logs => spans.extend([
            " | Close Logs ".into(),
            "<o> ".blue().bold(),
            " | Details ".into(),
            "<i> ".blue().bold(),
        ]),
        Focus::Inspect => spans.extend([" | Close ".into(), "<i/h> ".blue().bold()]),
    }

    spans.push(if paused {
        " | Resume ".into()
    } else {
        " | Pause ".into()
    });
    spans.push("<p> ".blue().bold());

    if has_daemon_log {
        spans.push(" | Daemon Log ".into());
        spans.push("<d> ".blue().bold());
    }

    if paused {
        spans.push(" ⏸ PAUSED ".yellow().bold());
    }

    let block = Block::bordered()
        .title(" Controls ")
        .border_set(border::PLAIN);

    let paragraph = Paragraph::new(Line::from(spans)).block(block).left_aligned();

    frame.render_widget(paragraph, area);
}
