// SPDX-License-Identifier: MIT

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};

use super::app::App;
use super::widgets::{centered_rect, create_help_widget, format_clock};
use crate::provider::TrustTier;
use crate::session::SessionState;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Now playing
            Constraint::Length(3), // Progress
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, app, chunks[0]);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(50), Constraint::Length(38)])
        .split(chunks[1]);
    draw_now_playing(frame, app, content[0]);
    draw_activity_panel(frame, app, content[1]);

    draw_progress(frame, app, chunks[2]);
    draw_footer(frame, app, chunks[3]);

    if app.guide.is_open() {
        draw_guide_overlay(frame, app, size);
    }

    if app.show_help {
        draw_help_overlay(frame, size);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        "TickerTV",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(channel) = app.session.current_channel() {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!("CH {}", channel.channel_number),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(
            "  {} · {}",
            channel.ticker, channel.company_name
        )));
    }

    if let Some(stock) = &app.stock {
        let (color, arrow) = if stock.is_up() {
            (Color::Green, "▲")
        } else {
            (Color::Red, "▼")
        };
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!(
                "{} {:.2} {} {:+.2} ({:+.2}%)",
                stock.ticker, stock.current_price, arrow, stock.change, stock.percent_change
            ),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );

    frame.render_widget(header, area);
}

fn draw_now_playing(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Now Playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.session.current_channel().is_none() {
        let msg = Paragraph::new("Press g to open the channel guide")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(msg, inner);
        return;
    }

    let Some(video) = app.session.current_video() else {
        // Tuned channel with an empty queue stays on a placeholder screen.
        let msg = Paragraph::new("No videos on this channel")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(msg, inner);
        return;
    };

    let snapshot = app.session.snapshot();
    let mut lines = vec![
        Line::from(Span::styled(
            video.title.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                trust_tier_label(video.trust_tier),
                Style::default().fg(trust_tier_color(video.trust_tier)),
            ),
            Span::raw("  ·  "),
            Span::styled(
                video.channel_title.clone().unwrap_or_default(),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(Span::styled(
            format!(
                "Video {}/{}{}",
                snapshot.queue_position + 1,
                snapshot.queue_len,
                video
                    .published_at
                    .as_deref()
                    .map(|ts| format!("  ·  {}", ts.split('T').next().unwrap_or(ts)))
                    .unwrap_or_default()
            ),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    for chunk in video.description.lines().take(6) {
        lines.push(Line::from(Span::styled(
            chunk.to_string(),
            Style::default().fg(Color::Gray),
        )));
    }

    if let Some(status) = &app.status_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let body = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(body, inner);
}

fn draw_activity_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Activity ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.logs.is_empty() {
        return;
    }

    let visible = inner.height as usize;
    let start = app.logs.len().saturating_sub(visible);
    let lines: Vec<Line> = app.logs[start..]
        .iter()
        .map(|(when, msg)| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", when.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(msg.clone(), Style::default().fg(Color::Gray)),
            ])
        })
        .collect();

    let logs = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(logs, inner);
}

fn draw_progress(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.session.snapshot();

    let label = match snapshot.state {
        SessionState::Idle => "—".to_string(),
        SessionState::Loading => "Loading…".to_string(),
        SessionState::Playing | SessionState::Paused => {
            let pause_mark = if snapshot.state == SessionState::Paused {
                "⏸ "
            } else {
                ""
            };
            format!(
                "{}{} / {}  ·  Vol {}%",
                pause_mark,
                format_clock(snapshot.elapsed_seconds),
                format_clock(snapshot.duration_seconds),
                snapshot.volume,
            )
        }
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio((snapshot.progress_percent / 100.0).clamp(0.0, 1.0))
        .label(label);

    frame.render_widget(gauge, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let text = if app.controls_visible() {
        "g guide · ↑↓ channel · Space play/pause · ←→ seek · n next · -/+ volume · ? help · q quit"
    } else {
        "? help"
    };

    let footer = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(footer, area);
}

fn draw_guide_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup);

    let playing = app.playing_index();
    let items: Vec<ListItem> = app
        .channels
        .iter()
        .enumerate()
        .map(|(i, channel)| {
            let marker = if Some(i) == playing { "●" } else { " " };
            let text = format!(
                " {} {:>3}  {:<6} {}",
                marker, channel.channel_number, channel.ticker, channel.company_name
            );
            let style = if i == app.guide.selected() {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Channel Guide (Enter to tune, Esc to close) "),
    );

    frame.render_widget(list, popup);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 80, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(create_help_widget(), popup);
}

fn trust_tier_label(tier: TrustTier) -> &'static str {
    match tier {
        TrustTier::OfficialCompany => "Official Company",
        TrustTier::ProfessionalNews => "Professional News",
        TrustTier::VettedExpert => "Vetted Expert",
        TrustTier::Community => "Community",
    }
}

fn trust_tier_color(tier: TrustTier) -> Color {
    match tier {
        TrustTier::OfficialCompany => Color::Green,
        TrustTier::ProfessionalNews => Color::Cyan,
        TrustTier::VettedExpert => Color::Yellow,
        TrustTier::Community => Color::Gray,
    }
}
