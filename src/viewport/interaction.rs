// Pointer interaction
//
// Turns pointer and wheel input into node drags, canvas pans and zoom
// changes. Every transition is a synchronous reaction to one input event.

use super::{Point, ViewportTransform, WHEEL_ZOOM_STEP};
use crate::graph::GraphModel;

/// What the pointer is currently doing
#[derive(Debug, Clone, PartialEq)]
pub enum PointerState {
    Idle,
    /// `offset` is the grab point relative to the node position, in canvas space
    DraggingNode { node_id: String, offset: Point },
    /// `pan_start` is the screen point minus the pan at press time
    Panning { pan_start: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    /// Away from the user: zoom in
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionController {
    state: PointerState,
    hovered: Option<String>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            state: PointerState::Idle,
            hovered: None,
        }
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Node under the pointer while idle
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Node currently being dragged, if any
    pub fn dragged(&self) -> Option<&str> {
        match &self.state {
            PointerState::DraggingNode { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    /// Press: grab the node under the pointer, or start panning
    pub fn pointer_down(
        &mut self,
        screen: Point,
        center: Point,
        graph: &GraphModel,
        viewport: &ViewportTransform,
    ) {
        if self.state != PointerState::Idle {
            return;
        }

        let canvas = viewport.screen_to_canvas(screen, center);
        self.state = match graph.node_at(canvas) {
            Some(node) => PointerState::DraggingNode {
                node_id: node.id.clone(),
                offset: canvas - node.position,
            },
            None => PointerState::Panning {
                pan_start: screen - viewport.pan(),
            },
        };
    }

    /// Move: drag the grabbed node, pan the canvas, or track hover
    pub fn pointer_move(
        &mut self,
        screen: Point,
        center: Point,
        graph: &mut GraphModel,
        viewport: &mut ViewportTransform,
    ) {
        match &self.state {
            PointerState::Idle => {
                let canvas = viewport.screen_to_canvas(screen, center);
                self.hovered = graph.node_at(canvas).map(|node| node.id.clone());
            }
            PointerState::DraggingNode { node_id, offset } => {
                let position = viewport.screen_to_canvas(screen, center) - *offset;
                // The node may have vanished under a session switch mid-drag
                if !graph.set_node_position(node_id, position) {
                    self.state = PointerState::Idle;
                }
            }
            PointerState::Panning { pan_start } => {
                viewport.set_pan(screen - *pan_start);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.state = PointerState::Idle;
    }

    /// Pointer left the surface: end any gesture and drop hover
    pub fn pointer_leave(&mut self) {
        self.state = PointerState::Idle;
        self.hovered = None;
    }

    /// Zoom one wheel notch; works in any state
    pub fn wheel(&mut self, direction: WheelDirection, viewport: &mut ViewportTransform) {
        match direction {
            WheelDirection::Up => viewport.zoom_by(WHEEL_ZOOM_STEP),
            WheelDirection::Down => viewport.zoom_by(-WHEEL_ZOOM_STEP),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Destination, DestinationRef, EventType, FlowEvent, Owner};
    use crate::graph::NamespaceFilter;

    const CENTER: Point = Point::new(100.0, 50.0);
    const SOURCE: &str = "workload:ns/Deployment/a";
    const DESTINATION: &str = "dst:b.ns.svc:80";

    fn graph_with_two_nodes() -> GraphModel {
        let mut graph = GraphModel::new();
        graph.resize(200.0, 100.0);
        let event = FlowEvent {
            event_type: EventType::Connect,
            source_pod: "a-1".to_string(),
            source_namespace: "ns".to_string(),
            source_address: "10.0.0.1".to_string(),
            source_port: 4000,
            source_owner: Some(Owner {
                kind: "Deployment".to_string(),
                name: "a".to_string(),
            }),
            destination: Destination {
                address: "10.0.0.2".to_string(),
                port: 80,
                reference: Some(DestinationRef {
                    kind: "svc".to_string(),
                    name: Some("b".to_string()),
                    namespace: "ns".to_string(),
                }),
            },
            error_code: 0,
        };
        graph.ingest(&[event], 0, &NamespaceFilter::new());
        graph.set_node_position(SOURCE, Point::new(40.0, 50.0));
        graph.set_node_position(DESTINATION, Point::new(160.0, 50.0));
        graph
    }

    fn position(graph: &GraphModel, id: &str) -> Option<Point> {
        graph.node(id).map(|n| n.position)
    }

    #[test]
    fn test_drag_node_keeps_grab_offset() {
        let mut graph = graph_with_two_nodes();
        let mut viewport = ViewportTransform::new();
        let mut controller = InteractionController::new();

        controller.pointer_down(Point::new(42.0, 51.0), CENTER, &graph, &viewport);
        assert_eq!(
            controller.state(),
            &PointerState::DraggingNode {
                node_id: SOURCE.to_string(),
                offset: Point::new(2.0, 1.0),
            }
        );
        assert_eq!(controller.dragged(), Some(SOURCE));

        controller.pointer_move(Point::new(62.0, 71.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(position(&graph, SOURCE), Some(Point::new(60.0, 70.0)));
        assert_eq!(viewport.pan(), Point::default());

        controller.pointer_up();
        assert_eq!(controller.state(), &PointerState::Idle);

        // Released nodes stay put
        controller.pointer_move(Point::new(0.0, 0.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(position(&graph, SOURCE), Some(Point::new(60.0, 70.0)));
    }

    #[test]
    fn test_drag_under_zoom_and_pan() {
        let mut graph = graph_with_two_nodes();
        let mut viewport = ViewportTransform::new();
        viewport.zoom_by(1.0);
        viewport.set_pan(Point::new(10.0, 0.0));
        let mut controller = InteractionController::new();

        // Source at canvas (40, 50) draws at ((40-100)*2+100+10, 50) = (-10, 50)
        let on_screen = viewport.canvas_to_screen(Point::new(40.0, 50.0), CENTER);
        assert_eq!(on_screen, Point::new(-10.0, 50.0));

        controller.pointer_down(on_screen, CENTER, &graph, &viewport);
        assert_eq!(controller.dragged(), Some(SOURCE));

        // 20 screen units right is 10 canvas units at 2x
        controller.pointer_move(Point::new(10.0, 50.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(position(&graph, SOURCE), Some(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_pan_on_empty_space() {
        let mut graph = graph_with_two_nodes();
        let mut viewport = ViewportTransform::new();
        viewport.set_pan(Point::new(5.0, 5.0));
        let mut controller = InteractionController::new();

        controller.pointer_down(Point::new(100.0, 20.0), CENTER, &graph, &viewport);
        assert_eq!(
            controller.state(),
            &PointerState::Panning {
                pan_start: Point::new(95.0, 15.0),
            }
        );

        controller.pointer_move(Point::new(130.0, 10.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(viewport.pan(), Point::new(35.0, -5.0));
        assert_eq!(position(&graph, SOURCE), Some(Point::new(40.0, 50.0)));

        controller.pointer_leave();
        assert_eq!(controller.state(), &PointerState::Idle);
        controller.pointer_move(Point::new(0.0, 0.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(viewport.pan(), Point::new(35.0, -5.0));
    }

    #[test]
    fn test_wheel_in_any_state() {
        let graph = graph_with_two_nodes();
        let mut viewport = ViewportTransform::new();
        let mut controller = InteractionController::new();

        controller.wheel(WheelDirection::Up, &mut viewport);
        assert!((viewport.zoom() - 1.1).abs() < 1e-9);

        controller.pointer_down(Point::new(100.0, 20.0), CENTER, &graph, &viewport);
        controller.wheel(WheelDirection::Down, &mut viewport);
        controller.wheel(WheelDirection::Down, &mut viewport);
        assert!((viewport.zoom() - 0.9).abs() < 1e-9);
        assert!(matches!(controller.state(), PointerState::Panning { .. }));
    }

    #[test]
    fn test_hover_tracking() {
        let mut graph = graph_with_two_nodes();
        let mut viewport = ViewportTransform::new();
        let mut controller = InteractionController::new();

        controller.pointer_move(Point::new(161.0, 50.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(controller.hovered(), Some(DESTINATION));

        controller.pointer_move(Point::new(100.0, 50.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(controller.hovered(), None);

        controller.pointer_move(Point::new(40.0, 50.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(controller.hovered(), Some(SOURCE));
        controller.pointer_leave();
        assert_eq!(controller.hovered(), None);
    }

    #[test]
    fn test_drag_of_removed_node_returns_to_idle() {
        let mut graph = graph_with_two_nodes();
        let mut viewport = ViewportTransform::new();
        let mut controller = InteractionController::new();

        controller.pointer_down(Point::new(40.0, 50.0), CENTER, &graph, &viewport);
        graph.reset();
        controller.pointer_move(Point::new(60.0, 50.0), CENTER, &mut graph, &mut viewport);
        assert_eq!(controller.state(), &PointerState::Idle);
    }

    #[test]
    fn test_second_press_is_ignored_mid_gesture() {
        let graph = graph_with_two_nodes();
        let viewport = ViewportTransform::new();
        let mut controller = InteractionController::new();

        controller.pointer_down(Point::new(100.0, 20.0), CENTER, &graph, &viewport);
        controller.pointer_down(Point::new(40.0, 50.0), CENTER, &graph, &viewport);
        assert!(matches!(controller.state(), PointerState::Panning { .. }));

        controller.reset();
        assert_eq!(controller, InteractionController::new());
    }
}
