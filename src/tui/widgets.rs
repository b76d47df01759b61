// SPDX-License-Identifier: MIT

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Formats seconds as `m:ss` or `h:mm:ss`.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

pub fn get_help_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "TickerTV - Help",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Channels:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from("  g/Enter   - Open channel guide"),
        Line::from("  ↑/k       - Previous channel"),
        Line::from("  ↓/j       - Next channel"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Guide (while open):",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ↑/↓       - Highlight channel"),
        Line::from("  Enter     - Tune to highlighted channel"),
        Line::from("  Esc/g     - Close without changing channel"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Playback:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Space     - Play/pause"),
        Line::from("  ←/→       - Seek backward/forward"),
        Line::from("  n         - Skip to next video"),
        Line::from("  -/+       - Volume down/up"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "General:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ?/F1      - Toggle this help"),
        Line::from("  q         - Quit"),
        Line::from("  Ctrl+C    - Force quit"),
        Line::from(""),
        Line::from("Press Esc, ? or F1 to close this help"),
    ]
}

pub fn create_help_widget() -> Paragraph<'static> {
    Paragraph::new(get_help_lines())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" Help "),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(59.9), "0:59");
        assert_eq!(format_clock(83.0), "1:23");
        assert_eq!(format_clock(3723.0), "1:02:03");
        assert_eq!(format_clock(-5.0), "0:00");
    }
}
