// Header rendering module
//
// Top panel: active session and its status, graph totals, and either the
// error banner or a transient notice.

use crate::app::AppState;
use crate::theme::{session_status_color, BLOOD_RED, BONE_WHITE, NEON_PURPLE, PUMPKIN_ORANGE};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

/// Graph totals as shown in the header
pub fn stats_text(app: &AppState) -> String {
    let stats = app.graph.stats();
    format!(
        "[nodes: {}] [edges: {}] [flows: {}] [errors: {}]",
        stats.nodes, stats.edges, stats.flows, stats.errors
    )
}

fn session_line(app: &AppState) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " podflow ",
        Style::default()
            .fg(NEON_PURPLE)
            .add_modifier(Modifier::BOLD),
    )];

    match app.active() {
        Some(session) => {
            spans.push(Span::styled(
                session.display_name(),
                Style::default().fg(BONE_WHITE),
            ));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("[{}]", session.status),
                Style::default()
                    .fg(session_status_color(session.status))
                    .add_modifier(Modifier::BOLD),
            ));
            if app.session_list.len() > 1 {
                spans.push(Span::styled(
                    format!("  ({} sessions, Tab to switch)", app.session_list.len()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        None => spans.push(Span::styled(
            "no session",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    }

    Line::from(spans)
}

/// Error banner takes precedence over notices
fn message_line(app: &AppState) -> Line<'static> {
    if let Some(error) = &app.error_banner {
        return Line::from(vec![
            Span::styled(
                format!(" ✖ {}", error),
                Style::default().fg(BLOOD_RED).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" (x to dismiss)", Style::default().fg(Color::DarkGray)),
        ]);
    }

    match app.notice() {
        Some(notice) => Line::from(Span::styled(
            format!(" {}", notice),
            Style::default().fg(PUMPKIN_ORANGE),
        )),
        None => Line::from(""),
    }
}

pub fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let lines = vec![
        session_line(app),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(stats_text(app), Style::default().fg(BONE_WHITE)),
        ]),
        message_line(app),
    ];

    let header = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(NEON_PURPLE)),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}
