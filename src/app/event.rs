// Keyboard and mouse event handling
//
// Translates terminal input into AppState operations. Mouse input inside
// the flow map drives the interaction controller; anything outside it ends
// the current gesture.

use super::AppState;
use crate::viewport::interaction::WheelDirection;
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};

/// Handle keyboard events and update application state
///
/// Returns `true` if the application should continue running,
/// `false` if it should exit.
///
/// # Key Bindings
/// - `q`, `Q` - Quit
/// - `Esc` - Dismiss the error banner, or quit when none is shown
/// - `x` - Dismiss the error banner
/// - `l` - Toggle labels
/// - `p` - Pause / resume particles
/// - `e` - Highlight edges with errors
/// - `+`, `=` / `-`, `_` - Zoom in / out
/// - `0` - Reset zoom
/// - `[` / `]` - Slower / faster UI refresh
/// - `Up` / `Down` - Move the namespace cursor
/// - `Space` - Toggle the namespace under the cursor
/// - `c` - Clear the namespace filter
/// - `Tab` - Next session
/// - `s` - Stop the active session
pub fn handle_key_event(app: &mut AppState, key: KeyCode) -> bool {
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            app.running = false;
        }
        KeyCode::Esc => {
            if app.error_banner.is_some() {
                app.dismiss_banner();
            } else {
                app.running = false;
            }
        }
        KeyCode::Char('x') | KeyCode::Char('X') => app.dismiss_banner(),
        KeyCode::Char('l') | KeyCode::Char('L') => {
            app.settings.labels_enabled = !app.settings.labels_enabled;
        }
        KeyCode::Char('p') | KeyCode::Char('P') => {
            app.settings.paused = !app.settings.paused;
            if !app.settings.paused {
                app.reset_animation_reduction();
            }
        }
        KeyCode::Char('e') | KeyCode::Char('E') => {
            app.settings.highlight_errors = !app.settings.highlight_errors;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => app.viewport.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.viewport.zoom_out(),
        KeyCode::Char('0') => app.viewport.reset_zoom(),
        KeyCode::Char('[') => app.decrease_refresh_rate(),
        KeyCode::Char(']') => app.increase_refresh_rate(),
        KeyCode::Up => app.select_previous_namespace(),
        KeyCode::Down => app.select_next_namespace(),
        KeyCode::Char(' ') => app.toggle_selected_namespace(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.clear_namespace_filter(),
        KeyCode::Tab => app.next_session(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.stop_active_session(),
        _ => {}
    }
    app.running
}

/// Handle mouse events over the flow map
pub fn handle_mouse_event(app: &mut AppState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            app.pointer_move(mouse.column, mouse.row)
        }
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(),
        MouseEventKind::ScrollUp if app.screen_point(mouse.column, mouse.row).is_some() => {
            app.wheel(WheelDirection::Up)
        }
        MouseEventKind::ScrollDown if app.screen_point(mouse.column, mouse.row).is_some() => {
            app.wheel(WheelDirection::Down)
        }
        _ => {}
    }
}
