// Default theme functions
//
// Color rules for the flow map and the status panels.

use ratatui::style::Color;

use super::{
    BLOOD_RED, BONE_WHITE, GRAVE_SHADOW, NEON_PURPLE, PUMPKIN_ORANGE, SERVICE_BLUE, TOXIC_GREEN,
};
use crate::flow::classify::NodeKind;
use crate::flow::EventType;
use crate::session::SessionStatus;

/// How far dimmed edges blend towards the background
const DIM_RATIO: f32 = 0.7;

/// Fill color for a node kind
pub fn kind_color(kind: NodeKind) -> Color {
    match kind {
        NodeKind::Workload => TOXIC_GREEN,
        NodeKind::Service => SERVICE_BLUE,
        NodeKind::External => PUMPKIN_ORANGE,
    }
}

/// Edge color: red with errors, otherwise by the event type that created it
///
/// With `highlight_errors`, edges without errors are dimmed so failing
/// flows stand out.
pub fn edge_color(event_type: &EventType, has_errors: bool, highlight_errors: bool) -> Color {
    if has_errors {
        return BLOOD_RED;
    }

    let base = match event_type {
        EventType::Accept => NEON_PURPLE,
        _ => TOXIC_GREEN,
    };

    if highlight_errors {
        dim(base)
    } else {
        base
    }
}

/// Blend an RGB color towards the background
pub fn dim(color: Color) -> Color {
    match (color, GRAVE_SHADOW) {
        (Color::Rgb(r, g, b), Color::Rgb(sr, sg, sb)) => {
            interpolate_color((r, g, b), (sr, sg, sb), DIM_RATIO)
        }
        _ => color,
    }
}

/// Color for a session status label
pub fn session_status_color(status: SessionStatus) -> Color {
    match status {
        SessionStatus::Running => TOXIC_GREEN,
        SessionStatus::Completed => BONE_WHITE,
    }
}

/// Interpolate between two RGB colors based on a ratio (0.0 ~ 1.0)
///
/// # Arguments
/// * `color1` - Starting color as (r, g, b) tuple
/// * `color2` - Ending color as (r, g, b) tuple
/// * `ratio` - Interpolation ratio (0.0 = color1, 1.0 = color2)
pub fn interpolate_color(color1: (u8, u8, u8), color2: (u8, u8, u8), ratio: f32) -> Color {
    let ratio = ratio.clamp(0.0, 1.0);
    let r = (color1.0 as f32 + (color2.0 as f32 - color1.0 as f32) * ratio) as u8;
    let g = (color1.1 as f32 + (color2.1 as f32 - color1.1 as f32) * ratio) as u8;
    let b = (color1.2 as f32 + (color2.2 as f32 - color1.2 as f32) * ratio) as u8;
    Color::Rgb(r, g, b)
}

/// Get color for refresh interval based on its value relative to default
///
/// Color coding:
/// - Green (TOXIC_GREEN): default or slower
/// - Orange (PUMPKIN_ORANGE): faster than default
/// - Red (BLOOD_RED): more than twice as fast as default
///
/// If recently_changed is true, returns a brighter version of the color
pub fn get_refresh_color(interval_ms: u64, default_ms: u64, recently_changed: bool) -> Color {
    let base_color = if interval_ms >= default_ms {
        TOXIC_GREEN
    } else {
        let ratio = (default_ms - interval_ms) as f32 / default_ms as f32;
        if ratio > 0.5 {
            BLOOD_RED
        } else {
            PUMPKIN_ORANGE
        }
    };

    if recently_changed {
        match base_color {
            Color::Rgb(r, g, b) => {
                // Increase brightness by 20%
                let r = ((r as f32 * 1.2).min(255.0)) as u8;
                let g = ((g as f32 * 1.2).min(255.0)) as u8;
                let b = ((b as f32 * 1.2).min(255.0)) as u8;
                Color::Rgb(r, g, b)
            }
            _ => base_color,
        }
    } else {
        base_color
    }
}
