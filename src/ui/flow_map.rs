// Flow map rendering module
//
// Draws the graph on a Braille canvas: edges with travelling particles,
// nodes as circles sized by kind, and optional labels. Everything is first
// projected into a view model (forward viewport transform, then a y flip
// because the canvas origin is bottom-left) so geometry can be tested
// without a terminal.

use crate::app::{AppState, UNITS_PER_COLUMN, UNITS_PER_ROW};
use crate::graph::{Edge, Node};
use crate::theme::{edge_color, kind_color, BONE_WHITE, NEON_PURPLE};
use crate::viewport::Point;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Points},
        Block, BorderType, Borders,
    },
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Extra radius of the ring drawn around the hovered or dragged node
const HIGHLIGHT_RING: f64 = 1.5;

/// Shown when no session feeds the map
const NO_SESSION_MESSAGE: &str = "No capture session (start with --source <file>)";

/// Shown while the active session has produced nothing yet
const WAITING_MESSAGE: &str = "Waiting for flow events...";
const FILTERED_MESSAGE: &str = "No flows in the selected namespaces";

#[derive(Debug, Clone, PartialEq)]
pub struct NodeGlyph {
    pub id: String,
    /// Canvas coordinates (y up)
    pub center: Point,
    /// Zoomed radius
    pub radius: f64,
    pub color: Color,
    pub highlighted: bool,
    /// Empty when labels are off
    pub label_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGlyph {
    pub from: Point,
    pub to: Point,
    pub color: Color,
    pub particles: Vec<Point>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowMapView {
    pub width: f64,
    pub height: f64,
    pub edges: Vec<EdgeGlyph>,
    pub nodes: Vec<NodeGlyph>,
    pub empty_message: Option<&'static str>,
}

/// Position of a particle `progress` of the way along an edge
pub fn particle_position(start: Point, end: Point, progress: f64) -> Point {
    start.lerp(end, progress)
}

/// `"{n} flows"`, with the error count appended when there are errors
pub fn edge_label(edge: &Edge) -> String {
    if edge.has_errors() {
        format!(
            "{} flows ({} errors)",
            edge.occurrences, edge.error_occurrences
        )
    } else {
        format!("{} flows", edge.occurrences)
    }
}

/// Node label lines; grouped workloads get a pod count line
pub fn node_label_lines(node: &Node) -> Vec<String> {
    let mut lines: Vec<String> = node.label.lines().map(str::to_string).collect();
    if node.is_group() {
        if let Some(count) = node.member_count() {
            lines.push(format!("({} pods)", count));
        }
    }
    lines
}

/// Project the graph through the viewport into canvas coordinates
pub fn build_flow_map_view(app: &AppState) -> FlowMapView {
    let width = f64::from(app.map_area.width) * UNITS_PER_COLUMN;
    let height = f64::from(app.map_area.height) * UNITS_PER_ROW;
    let center = app.surface_center();
    let zoom = app.viewport.zoom();
    let labels_enabled = app.settings.labels_enabled;

    let project = |p: Point| {
        let screen = app.viewport.canvas_to_screen(p, center);
        Point::new(screen.x, height - screen.y)
    };

    let particles_per_edge = app.particles_per_edge();
    let edges = app
        .graph
        .visible_edges()
        .filter_map(|edge| {
            let from = project(app.graph.node(&edge.id.from)?.position);
            let to = project(app.graph.node(&edge.id.to)?.position);
            let particles = app
                .animation
                .particles(&edge.id)
                .iter()
                .take(particles_per_edge)
                .map(|&progress| particle_position(from, to, progress))
                .collect();
            Some(EdgeGlyph {
                from,
                to,
                color: edge_color(
                    &edge.event_type,
                    edge.has_errors(),
                    app.settings.highlight_errors,
                ),
                particles,
                label: labels_enabled.then(|| edge_label(edge)),
            })
        })
        .collect();

    let focused = app.interaction.dragged().or(app.interaction.hovered());
    let nodes = app
        .graph
        .visible_nodes()
        .map(|node| NodeGlyph {
            id: node.id.clone(),
            center: project(node.position),
            radius: node.radius() * zoom,
            color: kind_color(node.kind),
            highlighted: focused == Some(node.id.as_str()),
            label_lines: if labels_enabled {
                node_label_lines(node)
            } else {
                Vec::new()
            },
        })
        .collect();

    let empty_message = if app.active_session.is_none() {
        Some(NO_SESSION_MESSAGE)
    } else if app.graph.is_empty() {
        Some(WAITING_MESSAGE)
    } else if app.graph.visible_nodes().next().is_none() {
        Some(FILTERED_MESSAGE)
    } else {
        None
    };

    FlowMapView {
        width,
        height,
        edges,
        nodes,
        empty_message,
    }
}

/// x at which `text` must start to appear centered on `center_x`
fn centered_x(text: &str, center_x: f64) -> f64 {
    center_x - text.width() as f64 * UNITS_PER_COLUMN / 2.0
}

fn paint(ctx: &mut Context, view: &FlowMapView) {
    for edge in &view.edges {
        ctx.draw(&CanvasLine {
            x1: edge.from.x,
            y1: edge.from.y,
            x2: edge.to.x,
            y2: edge.to.y,
            color: edge.color,
        });
    }

    ctx.layer();

    for edge in &view.edges {
        let coords: Vec<(f64, f64)> = edge.particles.iter().map(|p| (p.x, p.y)).collect();
        ctx.draw(&Points {
            coords: &coords,
            color: BONE_WHITE,
        });
    }

    for node in &view.nodes {
        ctx.draw(&Circle {
            x: node.center.x,
            y: node.center.y,
            radius: node.radius,
            color: node.color,
        });
        if node.highlighted {
            ctx.draw(&Circle {
                x: node.center.x,
                y: node.center.y,
                radius: node.radius + HIGHLIGHT_RING,
                color: BONE_WHITE,
            });
        }
    }

    ctx.layer();

    for edge in &view.edges {
        if let Some(label) = &edge.label {
            let mid = edge.from.lerp(edge.to, 0.5);
            ctx.print(
                centered_x(label, mid.x),
                mid.y,
                Span::styled(label.clone(), Style::default().fg(edge.color)),
            );
        }
    }

    for node in &view.nodes {
        let style = if node.highlighted {
            Style::default().fg(node.color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(node.color)
        };
        for (i, line) in node.label_lines.iter().enumerate() {
            let y = node.center.y - node.radius - (i as f64 + 1.0) * UNITS_PER_ROW;
            ctx.print(
                centered_x(line, node.center.x),
                y,
                Span::styled(line.clone(), style),
            );
        }
    }

    if let Some(message) = view.empty_message {
        ctx.print(
            centered_x(message, view.width / 2.0),
            view.height / 2.0,
            Span::styled(
                message,
                Style::default().fg(BONE_WHITE).add_modifier(Modifier::ITALIC),
            ),
        );
    }
}

pub fn render_flow_map(f: &mut Frame, area: Rect, app: &AppState) {
    let view = build_flow_map_view(app);

    let title = format!(
        "━ Flow Map ━ zoom {:.1}x {}",
        app.viewport.zoom(),
        if app.settings.paused { "(paused) " } else { "" }
    );

    let width = view.width;
    let height = view.height;
    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(NEON_PURPLE))
                .title(Span::styled(
                    title,
                    Style::default()
                        .fg(NEON_PURPLE)
                        .add_modifier(Modifier::BOLD),
                )),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(move |ctx| paint(ctx, &view));

    f.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::animation::PARTICLES_PER_EDGE;
    use crate::app::AppState;
    use crate::flow::{Destination, DestinationRef, EventType, FlowEvent, Owner, StreamMessage};
    use crate::graph::{EdgeId, NamespaceFilter};
    use crate::session::CaptureSessions;
    use crate::theme::{BLOOD_RED, TOXIC_GREEN};

    const T0: u64 = 1_700_000_000_000;
    const API: &str = "workload:shop/Deployment/api";
    const DB: &str = "dst:db.shop.svc:5432";

    fn event(pod: &str, error_code: i64) -> FlowEvent {
        FlowEvent {
            event_type: EventType::Connect,
            source_pod: pod.to_string(),
            source_namespace: "shop".to_string(),
            source_address: "10.0.0.1".to_string(),
            source_port: 4000,
            source_owner: Some(Owner {
                kind: "Deployment".to_string(),
                name: "api".to_string(),
            }),
            destination: Destination {
                address: "10.0.0.2".to_string(),
                port: 5432,
                reference: Some(DestinationRef {
                    kind: "svc".to_string(),
                    name: Some("db".to_string()),
                    namespace: "shop".to_string(),
                }),
            },
            error_code,
        }
    }

    /// App with an active (fake) session, a 200x100 surface and one edge
    fn app_with_edge(events: Vec<FlowEvent>) -> AppState {
        let mut app = AppState::new(Box::new(CaptureSessions::new()), false, 50);
        app.set_map_area(Rect::new(1, 1, 100, 25));
        app.active_session = Some("session".to_string());
        app.apply_messages(events.into_iter().map(StreamMessage::Flow).collect(), T0);
        app.graph.set_node_position(API, Point::new(50.0, 30.0));
        app.graph.set_node_position(DB, Point::new(150.0, 70.0));
        app.animation.tick(&app.graph, true);
        app
    }

    fn node<'a>(view: &'a FlowMapView, id: &str) -> &'a NodeGlyph {
        view.nodes.iter().find(|n| n.id == id).expect("node glyph")
    }

    #[test]
    fn test_geometry_flips_y() {
        let app = app_with_edge(vec![event("api-1", 0)]);
        let view = build_flow_map_view(&app);

        assert_eq!(view.width, 200.0);
        assert_eq!(view.height, 100.0);
        assert_eq!(node(&view, API).center, Point::new(50.0, 70.0));
        assert_eq!(node(&view, DB).center, Point::new(150.0, 30.0));

        let edge = &view.edges[0];
        assert_eq!(edge.from, Point::new(50.0, 70.0));
        assert_eq!(edge.to, Point::new(150.0, 30.0));
        assert!(view.empty_message.is_none());
    }

    #[test]
    fn test_zoom_scales_positions_and_radius() {
        let mut app = app_with_edge(vec![event("api-1", 0)]);
        app.viewport.zoom_by(1.0);
        let view = build_flow_map_view(&app);

        // (50, 30) scaled 2x about (100, 50) is (0, 10); flipped y = 90
        let api = node(&view, API);
        assert_eq!(api.center, Point::new(0.0, 90.0));
        assert_eq!(api.radius, 10.0);
        assert_eq!(node(&view, DB).radius, 8.0);
    }

    #[test]
    fn test_particles_follow_animation() {
        let mut app = app_with_edge(vec![event("api-1", 0)]);
        let view = build_flow_map_view(&app);
        let edge = &view.edges[0];
        assert_eq!(edge.particles.len(), PARTICLES_PER_EDGE);
        assert_eq!(edge.particles[0], edge.from);

        app.animation_reduced = true;
        assert_eq!(build_flow_map_view(&app).edges[0].particles.len(), 1);

        let id = EdgeId::new(API, DB);
        assert_eq!(app.animation.particles(&id).len(), PARTICLES_PER_EDGE);
    }

    #[test]
    fn test_labels() {
        let mut app = app_with_edge(vec![event("api-1", 0), event("api-2", 111), event("api-1", 0)]);
        let view = build_flow_map_view(&app);

        assert_eq!(view.edges[0].label.as_deref(), Some("3 flows (1 errors)"));
        assert_eq!(view.edges[0].color, BLOOD_RED);
        assert_eq!(
            node(&view, API).label_lines,
            vec!["api Deployment".to_string(), "shop".to_string(), "(2 pods)".to_string()]
        );
        assert_eq!(node(&view, DB).label_lines, vec!["db.shop.svc:5432".to_string()]);

        app.settings.labels_enabled = false;
        let view = build_flow_map_view(&app);
        assert!(view.edges[0].label.is_none());
        assert!(view.nodes.iter().all(|n| n.label_lines.is_empty()));
    }

    #[test]
    fn test_single_pod_has_no_count_line() {
        let app = app_with_edge(vec![event("api-1", 0)]);
        let view = build_flow_map_view(&app);
        assert_eq!(node(&view, API).label_lines.len(), 2);
        assert_eq!(view.edges[0].label.as_deref(), Some("1 flows"));
        assert_eq!(view.edges[0].color, TOXIC_GREEN);
    }

    #[test]
    fn test_filtered_namespace_is_not_drawn() {
        let mut app = app_with_edge(vec![event("api-1", 0)]);
        app.namespace_filter.insert("ops".to_string());
        app.graph.set_view_filter(app.namespace_filter.clone());

        let view = build_flow_map_view(&app);
        assert!(view.nodes.is_empty());
        assert!(view.edges.is_empty());
        assert_eq!(view.empty_message, Some(FILTERED_MESSAGE));

        app.graph.set_view_filter(NamespaceFilter::new());
        assert_eq!(build_flow_map_view(&app).nodes.len(), 2);
    }

    #[test]
    fn test_hover_highlight() {
        let mut app = app_with_edge(vec![event("api-1", 0)]);
        // Cell (25, 8) is screen point (49, 30), inside API's radius
        app.pointer_move(25, 8);
        let view = build_flow_map_view(&app);
        assert!(node(&view, API).highlighted);
        assert!(!node(&view, DB).highlighted);
    }

    #[test]
    fn test_empty_messages() {
        let mut app = AppState::new(Box::new(CaptureSessions::new()), false, 50);
        app.set_map_area(Rect::new(0, 0, 40, 10));
        assert_eq!(build_flow_map_view(&app).empty_message, Some(NO_SESSION_MESSAGE));

        app.active_session = Some("session".to_string());
        assert_eq!(build_flow_map_view(&app).empty_message, Some(WAITING_MESSAGE));
    }

    #[test]
    fn test_particle_position() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(10.0, 20.0);
        assert_eq!(particle_position(start, end, 0.0), start);
        assert_eq!(particle_position(start, end, 1.0), end);
        assert_eq!(particle_position(start, end, 0.5), Point::new(5.0, 10.0));
    }

    #[test]
    fn test_centered_x() {
        assert_eq!(centered_x("abcd", 10.0), 6.0);
        assert_eq!(centered_x("", 10.0), 10.0);
    }
}
