//! Viewport transform: screen ↔ world conversion, zoom and pan.
//!
//! Two steps separate a pointer event from the document. [`CanvasMetrics`]
//! maps client (CSS) coordinates onto the canvas backing store, undoing the
//! canvas' on-screen origin and any client-to-backing-store scale. [`Camera`]
//! then removes pan and zoom to reach world coordinates, which are the pixel
//! coordinates of the backglass image.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{FIT_PADDING_PX, MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in floating-point world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Normalized rectangle spanned by two corner points, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.x + self.width && pt.y >= self.y && pt.y <= self.y + self.height
    }

    /// Whether two rectangles overlap (touching edges count).
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }
}

/// Placement and size of the canvas element on screen.
///
/// `left` / `top` / `css_*` come from the element's bounding client rect;
/// `backing_*` are the canvas' `width` / `height` attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMetrics {
    pub left: f64,
    pub top: f64,
    pub css_width: f64,
    pub css_height: f64,
    pub backing_width: f64,
    pub backing_height: f64,
}

impl Default for CanvasMetrics {
    fn default() -> Self {
        Self { left: 0.0, top: 0.0, css_width: 0.0, css_height: 0.0, backing_width: 0.0, backing_height: 0.0 }
    }
}

impl CanvasMetrics {
    /// Metrics for a canvas at the client origin whose backing store matches its CSS size.
    #[must_use]
    pub fn sized(width: f64, height: f64) -> Self {
        Self { left: 0.0, top: 0.0, css_width: width, css_height: height, backing_width: width, backing_height: height }
    }

    /// Backing-store pixels per CSS pixel, per axis. Falls back to 1 for an unsized canvas.
    #[must_use]
    pub fn scale(&self) -> (f64, f64) {
        let sx = if self.css_width > 0.0 { self.backing_width / self.css_width } else { 1.0 };
        let sy = if self.css_height > 0.0 { self.backing_height / self.css_height } else { 1.0 };
        (sx, sy)
    }

    /// Convert a client-space point to canvas backing-store pixels.
    #[must_use]
    pub fn client_to_canvas(&self, client: Point) -> Point {
        let (sx, sy) = self.scale();
        Point { x: (client.x - self.left) * sx, y: (client.y - self.top) * sy }
    }

    /// Convert canvas backing-store pixels to a client-space point.
    #[must_use]
    pub fn canvas_to_client(&self, canvas: Point) -> Point {
        let (sx, sy) = self.scale();
        Point { x: canvas.x / sx + self.left, y: canvas.y / sy + self.top }
    }

    /// Client-space centre of the canvas.
    #[must_use]
    pub fn client_center(&self) -> Point {
        Point::new(self.left + self.css_width * 0.5, self.top + self.css_height * 0.5)
    }
}

/// Pan/zoom state of the editor canvas.
///
/// `pan_x` / `pan_y` are in backing-store pixels.
/// `zoom` is a scale factor (1.0 = one image pixel per canvas pixel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a canvas-space point (backing-store pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a world-space point to canvas coordinates (backing-store pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Set the zoom factor, clamped to the allowed range. Pan is left unchanged.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Multiply the zoom by `factor` while keeping the world point under
    /// `anchor` (canvas space) fixed on screen.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
        let world = self.screen_to_world(anchor);
        let new_zoom = clamp_zoom(self.zoom * factor);
        self.pan_x = anchor.x - world.x * new_zoom;
        self.pan_y = anchor.y - world.y * new_zoom;
        self.zoom = new_zoom;
    }

    /// Fit a `content_w` × `content_h` world rectangle at the origin into a
    /// viewport of `viewport_w` × `viewport_h` canvas pixels, centred.
    ///
    /// Returns `false` without touching the camera when either size is empty.
    pub fn fit(&mut self, content_w: f64, content_h: f64, viewport_w: f64, viewport_h: f64) -> bool {
        if viewport_w <= 0.0 || viewport_h <= 0.0 || content_w <= 0.0 || content_h <= 0.0 {
            return false;
        }
        let scale_x = (viewport_w - FIT_PADDING_PX) / content_w;
        let scale_y = (viewport_h - FIT_PADDING_PX) / content_h;
        self.zoom = clamp_zoom(scale_x.min(scale_y));
        self.pan_x = (viewport_w - content_w * self.zoom) / 2.0;
        self.pan_y = (viewport_h - content_h * self.zoom) / 2.0;
        true
    }
}

/// Clamp a zoom factor to `[MIN_ZOOM, MAX_ZOOM]`; non-finite input maps to 1.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() { zoom.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 }
}
