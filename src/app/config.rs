// Application configuration types
//
// Runtime toggles for the flow map and the UI refresh interval, plus the
// timing constants the app shell works with. Model tuning constants live
// with the module that owns them (graph, viewport, animation).

use std::time::{Duration, Instant};

// ============================================================================
// Constants
// ============================================================================

/// Minimum refresh interval in milliseconds
pub const MIN_REFRESH_MS: u64 = 20;

/// Maximum refresh interval in milliseconds
pub const MAX_REFRESH_MS: u64 = 2000;

/// Refresh interval adjustment step in milliseconds
pub const REFRESH_STEP: u64 = 20;

/// Default UI tick; particles advance once per tick
pub const DEFAULT_REFRESH_MS: u64 = 50;

/// Duration to highlight recently changed refresh intervals
pub const CHANGE_HIGHLIGHT_DURATION: Duration = Duration::from_millis(500);

/// How long a session notice stays in the header
pub const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Frame time threshold for auto-reducing animation complexity (100ms)
/// If frame time consistently exceeds this, particle count is reduced
pub const FRAME_TIME_THRESHOLD_MS: u128 = 100;

/// Number of consecutive slow frames before triggering complexity reduction
pub const SLOW_FRAME_COUNT_THRESHOLD: u32 = 5;

// ============================================================================
// Configuration Structs
// ============================================================================

/// Visual settings for the flow map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMapSettings {
    /// Show node and edge labels (toggle with 'l' key)
    pub labels_enabled: bool,

    /// Freeze particle animation (toggle with 'p' key)
    pub paused: bool,

    /// Dim edges without errors (toggle with 'e' key)
    pub highlight_errors: bool,
}

impl Default for FlowMapSettings {
    fn default() -> Self {
        Self {
            labels_enabled: true,
            paused: false,
            highlight_errors: false,
        }
    }
}

/// UI refresh interval
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Refresh interval in milliseconds (20-2000ms)
    pub refresh_ms: u64,

    /// Timestamp of last interval change (for visual feedback)
    pub last_change: Option<Instant>,
}

impl RefreshConfig {
    /// Create a new RefreshConfig with default values
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_REFRESH_MS)
    }

    /// Start from a user-supplied interval, clamped to the allowed range
    pub fn with_interval(refresh_ms: u64) -> Self {
        Self {
            refresh_ms: refresh_ms.clamp(MIN_REFRESH_MS, MAX_REFRESH_MS),
            last_change: None,
        }
    }

    /// Get UI refresh interval as Duration
    pub fn ui_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    /// Whether the interval changed recently enough to highlight it
    pub fn recently_changed(&self) -> bool {
        self.last_change
            .is_some_and(|changed| changed.elapsed() < CHANGE_HIGHLIGHT_DURATION)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_interval_clamped() {
        assert_eq!(RefreshConfig::with_interval(1).refresh_ms, MIN_REFRESH_MS);
        assert_eq!(RefreshConfig::with_interval(60_000).refresh_ms, MAX_REFRESH_MS);
        assert_eq!(RefreshConfig::with_interval(120).ui_interval(), Duration::from_millis(120));
        assert!(!RefreshConfig::new().recently_changed());
    }
}
