// Status Bar rendering module
//
// Renders the bottom status bar with keyboard shortcuts and toggle indicators.

use crate::app::AppState;
use crate::theme::{BONE_WHITE, NEON_PURPLE, PUMPKIN_ORANGE, TOXIC_GREEN};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

struct Hint {
    priority: u8,
    key: &'static str,
    desc: &'static str,
    color: Color,
}

const HINTS: &[Hint] = &[
    Hint {
        priority: 1,
        key: "Q:",
        desc: "Quit | ",
        color: Color::Red,
    },
    Hint {
        priority: 1,
        key: "Drag:",
        desc: "Move/Pan | ",
        color: NEON_PURPLE,
    },
    Hint {
        priority: 1,
        key: "+/-:",
        desc: "Zoom | ",
        color: NEON_PURPLE,
    },
    Hint {
        priority: 2,
        key: "↑↓ Space:",
        desc: "Namespaces | ",
        color: NEON_PURPLE,
    },
    Hint {
        priority: 2,
        key: "Tab:",
        desc: "Session | ",
        color: NEON_PURPLE,
    },
    Hint {
        priority: 2,
        key: "P:",
        desc: "Pause | ",
        color: NEON_PURPLE,
    },
    Hint {
        priority: 3,
        key: "[/]:",
        desc: "Speed | ",
        color: NEON_PURPLE,
    },
    Hint {
        priority: 3,
        key: "S:",
        desc: "Stop | ",
        color: NEON_PURPLE,
    },
    Hint {
        priority: 3,
        key: "0:",
        desc: "Reset zoom | ",
        color: NEON_PURPLE,
    },
];

/// Hints that fit in `available_width`, highest priority first
fn visible_hints(available_width: usize) -> Vec<&'static Hint> {
    let mut visible = Vec::new();
    let mut current_length = 4;

    for priority in 1..=3 {
        for hint in HINTS.iter().filter(|h| h.priority == priority) {
            let hint_length = hint.key.width() + hint.desc.width();
            if current_length + hint_length <= available_width {
                visible.push(hint);
                current_length += hint_length;
            }
        }
    }

    visible
}

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let available_width = usize::from(area.width.saturating_sub(4));

    let mut spans = vec![Span::styled(" ◉ ", Style::default().fg(NEON_PURPLE))];
    for hint in visible_hints(available_width) {
        spans.push(Span::styled(
            hint.key,
            Style::default().fg(hint.color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(hint.desc));
    }

    // Always shown
    spans.push(Span::raw(" "));
    spans.extend(build_toggle_indicators(app));

    let status_bar = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(NEON_PURPLE)),
        )
        .alignment(Alignment::Left);

    f.render_widget(status_bar, area);
}

fn toggle_spans(key: &'static str, enabled: bool) -> [Span<'static>; 3] {
    let (state, color) = if enabled {
        ("ON", TOXIC_GREEN)
    } else {
        ("OFF", BONE_WHITE)
    };
    [
        Span::styled(format!("[{}:", key), Style::default().fg(BONE_WHITE)),
        Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled("] ", Style::default().fg(BONE_WHITE)),
    ]
}

/// Build toggle status indicator spans for the status bar
/// Shows [L:ON/OFF] [P:ON/OFF] [E:ON/OFF], plus a marker while particle
/// animation is reduced because frames are slow
pub fn build_toggle_indicators(app: &AppState) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    spans.extend(toggle_spans("L", app.settings.labels_enabled));
    spans.extend(toggle_spans("P", app.settings.paused));
    spans.extend(toggle_spans("E", app.settings.highlight_errors));

    if app.animation_reduced {
        spans.push(Span::styled(
            "[slow: reduced]",
            Style::default()
                .fg(PUMPKIN_ORANGE)
                .add_modifier(Modifier::BOLD),
        ));
    }

    spans
}
