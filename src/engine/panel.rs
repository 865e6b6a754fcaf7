// tutorchat Engine — Window Manipulation Controller
//
// Drives the floating chat panel from pointer events: dragging the header
// moves it, dragging one of eight peripheral handles resizes it. All
// interaction state lives on the controller; the caller forwards pointer
// events and applies `style()` to the panel element.
//
// State machine:
//   Idle     : no operation active (initial and terminal)
//   Moving   : pointer went down on the header
//   Resizing : pointer went down on a handle
// Pointer-up always returns to Idle. A pointer-down while an operation is
// active is ignored.

use crate::atoms::constants::{
    PANEL_DEFAULT_BOTTOM, PANEL_DEFAULT_HEIGHT, PANEL_DEFAULT_RIGHT, PANEL_DEFAULT_WIDTH,
    PANEL_MAX_HEIGHT_RATIO, PANEL_MAX_WIDTH_RATIO, PANEL_MIN_HEIGHT, PANEL_MIN_WIDTH,
};
use crate::engine::geometry::{clamp_extent, clamp_origin, Point, Rect, Size, SizeBounds, Viewport};
use log::debug;
use serde::{Deserialize, Serialize};

// ── Config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub min_width: f64,
    pub min_height: f64,
    /// Maximum width as a fraction of the viewport width.
    pub max_width_ratio: f64,
    /// Maximum height as a fraction of the viewport height.
    pub max_height_ratio: f64,
    /// Initial size.
    pub width: f64,
    pub height: f64,
    /// Initial distance from the viewport's right and bottom edges.
    pub right: f64,
    pub bottom: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            min_width: PANEL_MIN_WIDTH,
            min_height: PANEL_MIN_HEIGHT,
            max_width_ratio: PANEL_MAX_WIDTH_RATIO,
            max_height_ratio: PANEL_MAX_HEIGHT_RATIO,
            width: PANEL_DEFAULT_WIDTH,
            height: PANEL_DEFAULT_HEIGHT,
            right: PANEL_DEFAULT_RIGHT,
            bottom: PANEL_DEFAULT_BOTTOM,
        }
    }
}

impl PanelConfig {
    pub fn bounds(&self, viewport: Viewport) -> SizeBounds {
        SizeBounds::for_viewport(
            viewport,
            Size::new(self.min_width, self.min_height),
            self.max_width_ratio,
            self.max_height_ratio,
        )
    }
}

// ── Handles & targets ──────────────────────────────────────────────────

/// One of the eight resize regions around the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handle {
    Right,
    Bottom,
    Left,
    Top,
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

/// Which side of an axis a handle drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Left or top: the origin moves, the far edge stays put.
    Near,
    /// Right or bottom: the origin stays put.
    Far,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::BottomRight,
        Handle::Right,
        Handle::Bottom,
        Handle::Left,
        Handle::Top,
        Handle::BottomLeft,
        Handle::TopRight,
        Handle::TopLeft,
    ];

    /// Horizontal and vertical edge driven by this handle. Corners drive both.
    pub fn edges(self) -> (Option<Edge>, Option<Edge>) {
        match self {
            Handle::Right => (Some(Edge::Far), None),
            Handle::Left => (Some(Edge::Near), None),
            Handle::Bottom => (None, Some(Edge::Far)),
            Handle::Top => (None, Some(Edge::Near)),
            Handle::BottomRight => (Some(Edge::Far), Some(Edge::Far)),
            Handle::BottomLeft => (Some(Edge::Near), Some(Edge::Far)),
            Handle::TopRight => (Some(Edge::Far), Some(Edge::Near)),
            Handle::TopLeft => (Some(Edge::Near), Some(Edge::Near)),
        }
    }

    /// CSS class of the handle element.
    pub fn css_class(self) -> &'static str {
        match self {
            Handle::BottomRight => "corner-br",
            Handle::Right => "right",
            Handle::Bottom => "bottom",
            Handle::Left => "left",
            Handle::Top => "top",
            Handle::BottomLeft => "corner-bl",
            Handle::TopRight => "corner-tr",
            Handle::TopLeft => "corner-tl",
        }
    }

    /// CSS cursor shown over the handle.
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::Left | Handle::Right => "ew-resize",
            Handle::Top | Handle::Bottom => "ns-resize",
            Handle::BottomRight | Handle::TopLeft => "nwse-resize",
            Handle::BottomLeft | Handle::TopRight => "nesw-resize",
        }
    }
}

/// Where a pointer-down landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Header,
    /// The close control embedded in the header; never starts a drag.
    CloseButton,
    Handle(Handle),
    Body,
}

// ── State ──────────────────────────────────────────────────────────────

/// Positioning scheme of the panel. Converts to `Absolute` on the first
/// drag or resize and never goes back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelLayout {
    Anchored { right: f64, bottom: f64 },
    Absolute,
}

/// Current pointer operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Moving {
        /// Pointer position relative to the panel's top-left corner.
        offset: Point,
    },
    Resizing {
        handle: Handle,
        start_pointer: Point,
        start_rect: Rect,
    },
}

impl DragState {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    #[inline]
    pub fn is_move(&self) -> bool {
        matches!(self, DragState::Moving { .. })
    }

    #[inline]
    pub fn is_resize(&self) -> bool {
        matches!(self, DragState::Resizing { .. })
    }

    pub fn handle(&self) -> Option<Handle> {
        match self {
            DragState::Resizing { handle, .. } => Some(*handle),
            _ => None,
        }
    }
}

// ── Inline style ───────────────────────────────────────────────────────

/// Inline style properties the controller owns on the panel element.
/// `None` means "leave to the stylesheet"; `auto` sides are emitted
/// explicitly once the layout is absolute so stale anchors are overridden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineStyle {
    pub position: &'static str,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub width: f64,
    pub height: f64,
    pub transition_none: bool,
}

impl InlineStyle {
    pub fn to_css(&self) -> String {
        let placement = match (self.left, self.top) {
            (Some(left), Some(top)) => {
                format!(" left: {}; top: {}; right: auto; bottom: auto;", px(left), px(top))
            }
            _ => {
                let right = self.right.map(|r| format!(" right: {};", px(r))).unwrap_or_default();
                let bottom = self.bottom.map(|b| format!(" bottom: {};", px(b))).unwrap_or_default();
                right + &bottom
            }
        };
        let transition = if self.transition_none { " transition: none;" } else { "" };
        format!(
            "position: {};{placement} width: {}; height: {};{transition}",
            self.position,
            px(self.width),
            px(self.height)
        )
    }
}

fn px(v: f64) -> String {
    format!("{}px", (v * 100.0).round() / 100.0)
}

/// Everything a renderer needs to present the panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub style: InlineStyle,
    pub hidden: bool,
    /// The floating launcher button shows exactly when the panel is hidden.
    pub launcher_visible: bool,
}

// ── Controller ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PanelController {
    config: PanelConfig,
    viewport: Viewport,
    bounds: SizeBounds,
    rect: Rect,
    layout: PanelLayout,
    drag: DragState,
    hidden: bool,
}

impl PanelController {
    /// A panel in its initial corner-anchored layout.
    pub fn new(config: PanelConfig, viewport: Viewport) -> Self {
        let bounds = config.bounds(viewport);
        let size = bounds.clamp(Size::new(config.width, config.height));
        let layout = PanelLayout::Anchored {
            right: config.right,
            bottom: config.bottom,
        };
        let rect = anchored_rect(config.right, config.bottom, size, viewport);
        PanelController {
            config,
            viewport,
            bounds,
            rect,
            layout,
            drag: DragState::Idle,
            hidden: false,
        }
    }

    /// A panel already converted to absolute positioning at `rect`
    /// (clamped into the viewport).
    pub fn at(config: PanelConfig, viewport: Viewport, rect: Rect) -> Self {
        let bounds = config.bounds(viewport);
        let size = bounds.clamp(rect.size);
        let origin = clamp_origin(rect.origin, size, viewport);
        PanelController {
            config,
            viewport,
            bounds,
            rect: Rect { origin, size },
            layout: PanelLayout::Absolute,
            drag: DragState::Idle,
            hidden: false,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_move()
    }

    pub fn active_handle(&self) -> Option<Handle> {
        self.drag.handle()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    // ── Pointer handlers ───────────────────────────────────────────────

    /// Begin a move or resize. Returns false (and changes nothing) when the
    /// target does not start an operation, an operation is already active,
    /// or the point is not finite.
    pub fn pointer_down(&mut self, target: PointerTarget, pointer: Point) -> bool {
        if !self.drag.is_idle() || !pointer.is_finite() || self.hidden {
            return false;
        }
        let next = match target {
            PointerTarget::Header => DragState::Moving {
                offset: pointer - self.rect.origin,
            },
            PointerTarget::Handle(handle) => DragState::Resizing {
                handle,
                start_pointer: pointer,
                start_rect: self.rect,
            },
            PointerTarget::CloseButton | PointerTarget::Body => return false,
        };
        if let PanelLayout::Anchored { .. } = self.layout {
            debug!("[panel] Converting anchored layout to absolute at {:?}", self.rect.origin);
            self.layout = PanelLayout::Absolute;
        }
        debug!("[panel] pointer down: {:?}", next);
        self.drag = next;
        true
    }

    /// Apply a pointer move to the active operation. Returns false when
    /// idle or when the point is not finite.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        if !pointer.is_finite() {
            return false;
        }
        match self.drag {
            DragState::Idle => false,
            DragState::Moving { offset } => {
                self.rect.origin = clamp_origin(pointer - offset, self.rect.size, self.viewport);
                true
            }
            DragState::Resizing {
                handle,
                start_pointer,
                start_rect,
            } => {
                self.rect = self.resized(handle, start_rect, pointer - start_pointer);
                true
            }
        }
    }

    /// End the active operation. Returns false when already idle.
    pub fn pointer_up(&mut self) -> bool {
        if self.drag.is_idle() {
            return false;
        }
        debug!("[panel] pointer up, rect now {:?}", self.rect);
        self.drag = DragState::Idle;
        true
    }

    // ── Viewport & visibility ──────────────────────────────────────────

    /// Recompute bounds for a new viewport and re-clamp the geometry.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.bounds = self.config.bounds(viewport);
        let size = self.bounds.clamp(self.rect.size);
        self.rect = match self.layout {
            PanelLayout::Anchored { right, bottom } => anchored_rect(right, bottom, size, viewport),
            PanelLayout::Absolute => Rect {
                origin: clamp_origin(self.rect.origin, size, viewport),
                size,
            },
        };
    }

    /// Show or hide the panel. Hiding cancels any active operation.
    pub fn toggle_visibility(&mut self) -> bool {
        self.hidden = !self.hidden;
        if self.hidden {
            self.drag = DragState::Idle;
        }
        self.hidden
    }

    // ── Output ─────────────────────────────────────────────────────────

    pub fn style(&self) -> InlineStyle {
        let (left, top, right, bottom) = match self.layout {
            PanelLayout::Anchored { right, bottom } => (None, None, Some(right), Some(bottom)),
            PanelLayout::Absolute => (Some(self.rect.left()), Some(self.rect.top()), None, None),
        };
        InlineStyle {
            position: "fixed",
            left,
            top,
            right,
            bottom,
            width: self.rect.width(),
            height: self.rect.height(),
            transition_none: !self.drag.is_idle(),
        }
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            style: self.style(),
            hidden: self.hidden,
            launcher_visible: self.hidden,
        }
    }

    // ── Resize math ────────────────────────────────────────────────────

    fn resized(&self, handle: Handle, start: Rect, delta: Point) -> Rect {
        let (x_edge, y_edge) = handle.edges();
        let (left, width) = match x_edge {
            Some(edge) => resize_axis(
                edge,
                start.left(),
                start.width(),
                delta.x,
                self.bounds.min.width,
                self.bounds.max.width,
                self.viewport.width,
            ),
            None => (start.left(), start.width()),
        };
        let (top, height) = match y_edge {
            Some(edge) => resize_axis(
                edge,
                start.top(),
                start.height(),
                delta.y,
                self.bounds.min.height,
                self.bounds.max.height,
                self.viewport.height,
            ),
            None => (start.top(), start.height()),
        };
        let size = Size::new(width, height);
        Rect {
            origin: clamp_origin(Point::new(left, top), size, self.viewport),
            size,
        }
    }
}

/// One axis of a resize. Near edges shift the origin by the clamped size
/// change so the far edge stays fixed; both are limited by the room between
/// the fixed edge and the viewport boundary.
fn resize_axis(edge: Edge, start_pos: f64, start_len: f64, delta: f64, min: f64, max: f64, viewport_len: f64) -> (f64, f64) {
    match edge {
        Edge::Far => {
            let len = clamp_extent(start_len + delta, min, max, viewport_len - start_pos);
            (start_pos, len)
        }
        Edge::Near => {
            let far = start_pos + start_len;
            let len = clamp_extent(start_len - delta, min, max, far);
            (far - len, len)
        }
    }
}

fn anchored_rect(right: f64, bottom: f64, size: Size, viewport: Viewport) -> Rect {
    let origin = Point::new(
        viewport.width - right - size.width,
        viewport.height - bottom - size.height,
    );
    Rect {
        origin: clamp_origin(origin, size, viewport),
        size,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
