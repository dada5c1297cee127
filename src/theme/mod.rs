// Theme module - Color constants and theme re-exports
//
// Core palette shared by every panel, plus the color rules for node kinds,
// edges and refresh-rate feedback in `default`.

pub mod default;

use ratatui::style::Color;

/// Primary accent color - borders, titles, accepted flows
/// RGB: (187, 154, 247)
pub const NEON_PURPLE: Color = Color::Rgb(187, 154, 247);

/// External endpoints, warnings
/// RGB: (255, 158, 100)
pub const PUMPKIN_ORANGE: Color = Color::Rgb(255, 158, 100);

/// Errors: failing edges, the error banner
/// RGB: (247, 118, 142)
pub const BLOOD_RED: Color = Color::Rgb(247, 118, 142);

/// Workloads, initiated flows, ON indicators
/// RGB: (158, 206, 106)
pub const TOXIC_GREEN: Color = Color::Rgb(158, 206, 106);

/// Services
/// RGB: (122, 162, 247)
pub const SERVICE_BLUE: Color = Color::Rgb(122, 162, 247);

/// General text, hover highlight
/// RGB: (169, 177, 214)
pub const BONE_WHITE: Color = Color::Rgb(169, 177, 214);

/// Background tone that dimmed edges fade towards
/// RGB: (36, 40, 59)
pub const GRAVE_SHADOW: Color = Color::Rgb(36, 40, 59);

/// Selected list row background
/// RGB: (47, 51, 77)
pub const DEEP_INDIGO: Color = Color::Rgb(47, 51, 77);

pub use default::*;
