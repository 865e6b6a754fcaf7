// tutorchat Engine — Panel geometry
// Plain coordinate types for the floating chat panel. All values are CSS
// pixels in viewport coordinates (origin top-left).

use crate::atoms::constants::{
    PANEL_MAX_HEIGHT_RATIO, PANEL_MAX_WIDTH_RATIO, PANEL_MIN_HEIGHT, PANEL_MIN_WIDTH,
};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
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

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(left, top),
            size: Size::new(width, height),
        }
    }

    pub fn left(&self) -> f64 {
        self.origin.x
    }

    pub fn top(&self) -> f64 {
        self.origin.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// True when the whole rectangle lies inside the viewport.
    pub fn within(&self, viewport: Viewport) -> bool {
        self.left() >= 0.0
            && self.top() >= 0.0
            && self.right() <= viewport.width
            && self.bottom() <= viewport.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Allowed panel size range for a given viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min: Size,
    pub max: Size,
}

impl SizeBounds {
    /// Bounds from explicit minimums and viewport ratios.
    pub fn for_viewport(viewport: Viewport, min: Size, max_width_ratio: f64, max_height_ratio: f64) -> Self {
        Self {
            min,
            max: Size::new(viewport.width * max_width_ratio, viewport.height * max_height_ratio),
        }
    }

    /// Bounds with the standard panel constants (320×400 up to 90%×85%).
    pub fn standard(viewport: Viewport) -> Self {
        Self::for_viewport(
            viewport,
            Size::new(PANEL_MIN_WIDTH, PANEL_MIN_HEIGHT),
            PANEL_MAX_WIDTH_RATIO,
            PANEL_MAX_HEIGHT_RATIO,
        )
    }

    // The minimum wins when the viewport is too small for the range.
    pub fn clamp_width(&self, width: f64) -> f64 {
        width.min(self.max.width).max(self.min.width)
    }

    pub fn clamp_height(&self, height: f64) -> f64 {
        height.min(self.max.height).max(self.min.height)
    }

    pub fn clamp(&self, size: Size) -> Size {
        Size::new(self.clamp_width(size.width), self.clamp_height(size.height))
    }
}

/// Clamp a 1-D extent into `[min, min(max, room)]`, letting `min` win.
pub(crate) fn clamp_extent(value: f64, min: f64, max: f64, room: f64) -> f64 {
    value.min(max).min(room).max(min)
}

/// Clamp a top-left corner so a panel of `size` stays inside the viewport.
/// A panel larger than the viewport is pinned to 0.
pub fn clamp_origin(origin: Point, size: Size, viewport: Viewport) -> Point {
    Point::new(
        origin.x.min(viewport.width - size.width).max(0.0),
        origin.y.min(viewport.height - size.height).max(0.0),
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────
