use crate::foundation::core::{Affine, Point, Vec2};

/// Smallest allowed zoom.
pub const MIN_SCALE: f64 = 0.25;
/// Largest allowed zoom.
pub const MAX_SCALE: f64 = 4.0;
/// Multiplicative zoom step per wheel event.
pub const ZOOM_FACTOR: f64 = 1.1;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Interactive zoom/pan state layered over the composited collage.
pub struct ViewState {
    /// Uniform zoom, always within `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f64,
    /// Pan offset in viewport pixels.
    pub translation: Vec2,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewState {
    /// `{ scale: 1, translation: (0, 0) }`.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translation: Vec2::ZERO,
    };

    /// `translate(tx, ty) * scale(s)` with the origin at the top-left corner.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translation) * Affine::scale(self.scale)
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Pointer and wheel input, in viewport-relative pixels.
pub enum ViewportEvent {
    /// Wheel step; positive `delta_y` zooms out.
    Wheel { delta_y: f64, cursor: Point },
    /// Starts a drag session.
    PointerDown(Point),
    /// Pans by the delta since the previous pointer position, while dragging.
    PointerMove(Point),
    /// Ends the drag session.
    PointerUp,
    /// Ends the drag session.
    PointerLeave,
}

/// Sole owner and writer of [`ViewState`].
#[derive(Clone, Debug, Default)]
pub struct ViewportEngine {
    state: ViewState,
    drag_anchor: Option<Point>,
}

impl ViewportEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Apply one input event and return the resulting state.
    pub fn handle(&mut self, event: ViewportEvent) -> ViewState {
        match event {
            ViewportEvent::Wheel { delta_y, cursor } => self.on_wheel(delta_y, cursor),
            ViewportEvent::PointerDown(p) => self.pointer_down(p),
            ViewportEvent::PointerMove(p) => self.pointer_move(p),
            ViewportEvent::PointerUp => self.pointer_up(),
            ViewportEvent::PointerLeave => self.pointer_leave(),
        }
        self.state
    }

    /// Zoom one step around `cursor`, keeping the point under the cursor fixed.
    pub fn on_wheel(&mut self, delta_y: f64, cursor: Point) {
        if !delta_y.is_finite() || !cursor.x.is_finite() || !cursor.y.is_finite() {
            tracing::debug!(delta_y, ?cursor, "ignoring non-finite wheel input");
            return;
        }

        let old = self.state.scale;
        let raw = if delta_y > 0.0 {
            old / ZOOM_FACTOR
        } else {
            old * ZOOM_FACTOR
        };
        let new_scale = raw.clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / old;

        let t = self.state.translation;
        self.state = ViewState {
            scale: new_scale,
            translation: Vec2::new(
                cursor.x - (cursor.x - t.x) * ratio,
                cursor.y - (cursor.y - t.y) * ratio,
            ),
        };
    }

    /// Pan by `delta`, independent of the current scale.
    pub fn on_drag_update(&mut self, delta: Vec2) {
        if !delta.x.is_finite() || !delta.y.is_finite() {
            tracing::debug!(?delta, "ignoring non-finite drag delta");
            return;
        }
        self.state.translation += delta;
    }

    pub fn pointer_down(&mut self, at: Point) {
        self.drag_anchor = Some(at);
    }

    pub fn pointer_move(&mut self, at: Point) {
        let Some(last) = self.drag_anchor else {
            return;
        };
        self.drag_anchor = Some(at);
        self.on_drag_update(at - last);
    }

    pub fn pointer_up(&mut self) {
        self.drag_anchor = None;
    }

    pub fn pointer_leave(&mut self) {
        self.drag_anchor = None;
    }

    /// Back to identity; any drag in progress is dropped.
    pub fn reset(&mut self) {
        self.state = ViewState::IDENTITY;
        self.drag_anchor = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/engine.rs"]
mod tests;
