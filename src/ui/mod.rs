// UI rendering module
//
// The main draw() function lays out and renders every panel. Panels read
// AppState; only the flow map feeds back into it (its inner area becomes the
// drawing surface used for layout and pointer mapping).

mod flow_map;
mod header;
mod inspector;
mod namespaces;
mod status_bar;

use crate::app::AppState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    Frame,
};

use flow_map::render_flow_map;
use header::render_header;
use inspector::render_inspector;
use namespaces::render_namespaces;
use status_bar::render_status_bar;

/// Area of the flow map panel for a terminal of the given size, borders included
pub fn flow_map_area(size: Rect) -> Rect {
    let chunks = main_chunks(size);
    body_chunks(chunks[1])[0]
}

fn main_chunks(size: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(3), // Status bar
        ])
        .split(size)
}

fn body_chunks(body: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(65), // Flow map
            Constraint::Percentage(35), // Right panels
        ])
        .split(body)
}

/// Main UI drawing function
pub fn draw(f: &mut Frame, app: &mut AppState) {
    let chunks = main_chunks(f.area());

    render_header(f, chunks[0], app);

    let body = body_chunks(chunks[1]);

    // Drawable surface is the map panel without its border
    let map_inner = body[0].inner(Margin::new(1, 1));
    if map_inner != app.map_area {
        app.set_map_area(map_inner);
    }
    render_flow_map(f, body[0], app);

    // Right side: Inspector + Namespaces
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(60), // Inspector
            Constraint::Percentage(40), // Namespaces
        ])
        .split(body[1]);

    render_inspector(f, right[0], app);
    render_namespaces(f, right[1], app);

    render_status_bar(f, chunks[2], app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{flow, test_app};
    use crate::flow::StreamMessage;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_draw_sets_map_area() {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).expect("test terminal");
        let mut app = test_app();
        app.apply_messages(vec![StreamMessage::Flow(flow("shop", "api", "db"))], 1);

        terminal
            .draw(|f| draw(f, &mut app))
            .expect("draw frame");

        let expected = flow_map_area(Rect::new(0, 0, 120, 40)).inner(Margin::new(1, 1));
        assert_eq!(app.map_area, expected);
        assert_eq!(
            app.graph.surface().map(|s| s.width),
            Some(f64::from(expected.width) * 2.0)
        );

        let buffer = terminal.backend().buffer();
        let rendered: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(rendered.contains("Flow Map"));
        assert!(rendered.contains("Inspector"));
        assert!(rendered.contains("Namespaces"));
    }

    #[test]
    fn test_flow_map_area_fits_terminal() {
        let area = flow_map_area(Rect::new(0, 0, 100, 30));
        assert_eq!(area.y, 4);
        assert_eq!(area.height, 23);
        assert_eq!(area.width, 65);
    }
}
