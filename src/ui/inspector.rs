// Node inspector rendering module
//
// Detail panel for the node under the pointer: identity, kind, member pods
// and the edges touching it. With nothing hovered it shows an overview of
// the active session instead.

use crate::app::config::DEFAULT_REFRESH_MS;
use crate::app::AppState;
use crate::theme::{get_refresh_color, kind_color, BLOOD_RED, BONE_WHITE, NEON_PURPLE, PUMPKIN_ORANGE};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

/// Member pods listed before summarising the rest
const MAX_LISTED_MEMBERS: usize = 4;

/// Edges listed before summarising the rest
const MAX_LISTED_EDGES: usize = 6;

// ============================================================================
// Inspector View Model
// ============================================================================

/// One edge touching the inspected node, from that node's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSummary {
    /// True when the inspected node is the edge's `to` end
    pub inbound: bool,
    /// Label of the node at the other end
    pub peer: String,
    pub occurrences: u64,
    pub errors: u64,
    /// Wire name of the event type that created the edge
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectorView {
    /// First label line of the inspected node, or the session name
    pub title: String,
    pub kind: Option<&'static str>,
    pub kind_color: Color,
    pub namespace: Option<String>,
    pub members: Vec<String>,
    pub member_count: Option<usize>,
    pub edges: Vec<EdgeSummary>,
    /// Edges beyond MAX_LISTED_EDGES
    pub hidden_edges: usize,
    pub has_selection: bool,
    pub refresh_ms: u64,
    pub stats_line: String,
}

impl Default for InspectorView {
    fn default() -> Self {
        Self {
            title: "No session".to_string(),
            kind: None,
            kind_color: BONE_WHITE,
            namespace: None,
            members: Vec::new(),
            member_count: None,
            edges: Vec::new(),
            hidden_edges: 0,
            has_selection: false,
            refresh_ms: DEFAULT_REFRESH_MS,
            stats_line: String::new(),
        }
    }
}

/// Build InspectorView from AppState
pub fn build_inspector_view(app: &AppState) -> InspectorView {
    let stats = app.graph.stats();
    let mut view = InspectorView {
        refresh_ms: app.refresh_config.refresh_ms,
        stats_line: format!(
            "{} nodes  {} edges  {} flows  {} errors",
            stats.nodes, stats.edges, stats.flows, stats.errors
        ),
        ..Default::default()
    };

    let Some(node) = app.inspected_node() else {
        if let Some(session) = app.active() {
            view.title = session.display_name();
            view.namespace = session.namespace.clone();
        }
        return view;
    };

    let mut label_lines = node.label.lines();
    view.title = label_lines.next().unwrap_or(&node.id).to_string();
    view.namespace = label_lines.next().map(str::to_string);
    view.kind = Some(node.kind.name());
    view.kind_color = kind_color(node.kind);
    view.member_count = node.member_count();
    view.members = node.members.iter().cloned().collect();
    view.has_selection = true;

    let mut edges: Vec<EdgeSummary> = app
        .graph
        .edges_touching(&node.id)
        .filter(|edge| app.graph.is_edge_visible(edge))
        .map(|edge| {
            let inbound = edge.id.to == node.id;
            let peer_id = if inbound { &edge.id.from } else { &edge.id.to };
            let peer = app
                .graph
                .node(peer_id)
                .and_then(|peer| peer.label.lines().next())
                .unwrap_or(peer_id)
                .to_string();
            EdgeSummary {
                inbound,
                peer,
                occurrences: edge.occurrences,
                errors: edge.error_occurrences,
                event_type: edge.event_type.as_str().to_string(),
            }
        })
        .collect();
    edges.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then_with(|| a.peer.cmp(&b.peer)));
    view.hidden_edges = edges.len().saturating_sub(MAX_LISTED_EDGES);
    edges.truncate(MAX_LISTED_EDGES);
    view.edges = edges;

    view
}

pub fn render_inspector(f: &mut Frame, area: Rect, app: &AppState) {
    let view = build_inspector_view(app);

    let recently_changed = app.refresh_config.recently_changed();
    let refresh_color = get_refresh_color(view.refresh_ms, DEFAULT_REFRESH_MS, recently_changed);
    let refresh_style = if recently_changed {
        Style::default()
            .fg(refresh_color)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(refresh_color)
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  TARGET: "),
            Span::styled(
                view.title.clone(),
                Style::default()
                    .fg(PUMPKIN_ORANGE)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    if let Some(kind) = view.kind {
        lines.push(Line::from(vec![
            Span::raw("  KIND: "),
            Span::styled(kind, Style::default().fg(view.kind_color)),
        ]));
    }
    if let Some(namespace) = &view.namespace {
        lines.push(Line::from(vec![
            Span::raw("  NAMESPACE: "),
            Span::styled(namespace.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }

    if let Some(count) = view.member_count {
        lines.push(Line::from(vec![
            Span::raw("  PODS: "),
            Span::styled(count.to_string(), Style::default().fg(Color::Cyan)),
        ]));
        for member in view.members.iter().take(MAX_LISTED_MEMBERS) {
            lines.push(Line::from(Span::styled(
                format!("    {}", member),
                Style::default().fg(Color::DarkGray),
            )));
        }
        if count > MAX_LISTED_MEMBERS {
            lines.push(Line::from(Span::styled(
                format!("    ... and {} more", count - MAX_LISTED_MEMBERS),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    if view.has_selection {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  FLOWS:",
            Style::default().fg(NEON_PURPLE),
        )));
        for edge in &view.edges {
            let arrow = if edge.inbound { "←" } else { "→" };
            let mut spans = vec![
                Span::raw(format!("   {} ", arrow)),
                Span::styled(edge.peer.clone(), Style::default().fg(BONE_WHITE)),
                Span::styled(
                    format!(" ×{}", edge.occurrences),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!(" {}", edge.event_type),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if edge.errors > 0 {
                spans.push(Span::styled(
                    format!(" ({} err)", edge.errors),
                    Style::default().fg(BLOOD_RED),
                ));
            }
            lines.push(Line::from(spans));
        }
        if view.hidden_edges > 0 {
            lines.push(Line::from(Span::styled(
                format!("    ... and {} more", view.hidden_edges),
                Style::default().fg(Color::DarkGray),
            )));
        }
    } else {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", view.stats_line),
            Style::default().fg(BONE_WHITE),
        )));
        lines.push(Line::from(Span::styled(
            "  Hover a node to inspect it",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("  ⚡ Refresh: "),
        Span::styled(format!("{}ms", view.refresh_ms), refresh_style),
    ]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled(
                "━ Inspector ━",
                Style::default()
                    .fg(NEON_PURPLE)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(NEON_PURPLE)),
    );

    f.render_widget(paragraph, area);
}
