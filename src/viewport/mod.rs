// Viewport transform
//
// Maps between canvas space (where node positions live) and screen space
// (where pointer input arrives). Drawing applies pan, then scales about the
// surface center; screen_to_canvas is the exact inverse.

pub mod interaction;

use std::ops::{Add, Sub};

/// Smallest allowed zoom factor
pub const MIN_ZOOM: f64 = 0.5;

/// Largest allowed zoom factor
pub const MAX_ZOOM: f64 = 2.0;

/// Zoom change per mouse wheel notch
pub const WHEEL_ZOOM_STEP: f64 = 0.1;

/// Zoom change per zoom in/out key press
pub const BUTTON_ZOOM_STEP: f64 = 0.2;

/// A 2D point or offset in surface units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point at parameter `t` along the segment from `self` to `other`
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Zoom and pan state
///
/// Fields are private so every mutation goes through the clamping setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    zoom: f64,
    pan: Point,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::default(),
        }
    }
}

impl ViewportTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    /// Add `delta` to the zoom factor, clamped to [MIN_ZOOM, MAX_ZOOM]
    ///
    /// Non-finite deltas are ignored.
    pub fn zoom_by(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(BUTTON_ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-BUTTON_ZOOM_STEP);
    }

    /// Back to 1:1 zoom; pan is left alone
    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    /// Pan is unconstrained
    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    /// Forward transform used for drawing: scale about `center`, then pan
    pub fn canvas_to_screen(&self, canvas: Point, center: Point) -> Point {
        Point::new(
            (canvas.x - center.x) * self.zoom + center.x + self.pan.x,
            (canvas.y - center.y) * self.zoom + center.y + self.pan.y,
        )
    }

    /// Inverse transform used for pointer input: remove pan, then unscale
    pub fn screen_to_canvas(&self, screen: Point, center: Point) -> Point {
        let unpanned = screen - self.pan;
        Point::new(
            (unpanned.x - center.x) / self.zoom + center.x,
            (unpanned.y - center.y) / self.zoom + center.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-6;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_identity_transform() {
        let viewport = ViewportTransform::new();
        let center = Point::new(100.0, 60.0);
        let p = Point::new(12.5, -3.0);
        assert_close(viewport.canvas_to_screen(p, center), p);
        assert_close(viewport.screen_to_canvas(p, center), p);
    }

    #[test]
    fn test_zoom_pivots_on_center() {
        let mut viewport = ViewportTransform::new();
        viewport.zoom_by(1.0);
        let center = Point::new(100.0, 60.0);

        // The center itself does not move under zoom
        assert_close(viewport.canvas_to_screen(center, center), center);
        // A point 10 units right of center lands 20 units right at 2x
        assert_close(
            viewport.canvas_to_screen(Point::new(110.0, 60.0), center),
            Point::new(120.0, 60.0),
        );
    }

    #[test]
    fn test_pan_is_applied_after_zoom() {
        let mut viewport = ViewportTransform::new();
        viewport.zoom_by(-0.5);
        viewport.set_pan(Point::new(7.0, -4.0));
        let center = Point::new(50.0, 50.0);

        let screen = viewport.canvas_to_screen(Point::new(70.0, 50.0), center);
        assert_close(screen, Point::new(60.0 + 7.0, 50.0 - 4.0));
    }

    #[test]
    fn test_zoom_clamps() {
        let mut viewport = ViewportTransform::new();
        for _ in 0..30 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom(), MAX_ZOOM);

        for _ in 0..30 {
            viewport.zoom_by(-WHEEL_ZOOM_STEP);
        }
        assert_eq!(viewport.zoom(), MIN_ZOOM);

        viewport.zoom_by(f64::NAN);
        assert_eq!(viewport.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_reset_zoom_keeps_pan() {
        let mut viewport = ViewportTransform::new();
        viewport.zoom_out();
        viewport.set_pan(Point::new(3.0, 4.0));
        viewport.reset_zoom();
        assert_eq!(viewport.zoom(), 1.0);
        assert_eq!(viewport.pan(), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_point_helpers() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(1.5, 2.0));
        assert_eq!(b - a, b);
        assert_eq!(a + b, b);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// screen_to_canvas undoes canvas_to_screen for every zoom, pan and point
        #[test]
        fn prop_inverse_transform(
            zoom_delta in -0.5f64..1.0f64,
            pan_x in -1000.0f64..1000.0,
            pan_y in -1000.0f64..1000.0,
            x in -500.0f64..500.0,
            y in -500.0f64..500.0,
            cx in 0.0f64..400.0,
            cy in 0.0f64..400.0,
        ) {
            let mut viewport = ViewportTransform::new();
            viewport.zoom_by(zoom_delta);
            viewport.set_pan(Point::new(pan_x, pan_y));
            let center = Point::new(cx, cy);
            let point = Point::new(x, y);

            let round_trip = viewport.screen_to_canvas(viewport.canvas_to_screen(point, center), center);
            prop_assert!((round_trip.x - x).abs() < EPSILON);
            prop_assert!((round_trip.y - y).abs() < EPSILON);
        }

        /// Any sequence of zoom deltas leaves zoom inside its bounds
        #[test]
        fn prop_zoom_always_clamped(deltas in proptest::collection::vec(-3.0f64..3.0, 0..40)) {
            let mut viewport = ViewportTransform::new();
            for delta in deltas {
                viewport.zoom_by(delta);
                prop_assert!(viewport.zoom() >= MIN_ZOOM && viewport.zoom() <= MAX_ZOOM);
            }
        }
    }
}
