// Namespace filter rendering module
//
// Scrollable list of observed namespaces with their selection state. An
// empty selection shows every namespace.

use crate::app::AppState;
use crate::theme::{BONE_WHITE, DEEP_INDIGO, PUMPKIN_ORANGE, TOXIC_GREEN};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

/// Panel title: selection count, or that everything is shown
pub fn namespace_title(selected: usize) -> String {
    if selected == 0 {
        "━ Namespaces (all) ".to_string()
    } else {
        format!("━ Namespaces ({} selected) ", selected)
    }
}

pub fn render_namespaces(f: &mut Frame, area: Rect, app: &mut AppState) {
    let entries = app.namespace_entries();

    let items: Vec<ListItem> = if entries.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            " (no namespaces observed yet)",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )))]
    } else {
        entries
            .iter()
            .map(|namespace| {
                let selected = app.namespace_filter.contains(namespace);
                let (mark, color) = if selected {
                    ("[x] ", TOXIC_GREEN)
                } else {
                    ("[ ] ", BONE_WHITE)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, Style::default().fg(color)),
                    Span::styled(namespace.clone(), Style::default().fg(color)),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(vec![
                    Span::styled(
                        namespace_title(app.namespace_filter.len()),
                        Style::default()
                            .fg(PUMPKIN_ORANGE)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("━━━━", Style::default().fg(PUMPKIN_ORANGE)),
                ])
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(PUMPKIN_ORANGE)),
        )
        .highlight_style(Style::default().bg(DEEP_INDIGO));

    f.render_stateful_widget(list, area, &mut app.namespace_list_state);
}
