//! # Resize Interaction
//!
//! A drag on a resize handle is a small state machine: `Idle` until a
//! permitted handle is pressed, `Dragging` while the pointer moves, back to
//! `Idle` on release. Every move recomputes the widget's frame from the
//! gesture's origin, never from the previous frame, so rounding never
//! accumulates and a release at the starting point restores the start box.
//!
//! The frame for a pointer offset `(dx, dy)`:
//!
//! 1. Trailing edges grow with the pointer: `e` adds `dx` to the width, `s`
//!    adds `dy` to the height
//! 2. Free widgets can also move their leading edges: `w` takes `dx` off the
//!    width and adds it to `left`, `n` does the same with the height and `top`
//! 3. With the aspect modifier, `e`/`w` derive the height from the width,
//!    `n`/`s` the width from the height, and corners follow whichever axis
//!    changed more; leading offsets are re-derived so the opposite edge stays
//! 4. Clamp to the size bounds, then re-derive the leading offsets again.
//!    A ratio-locked frame is clamped along the widths that keep both
//!    dimensions in bounds at that ratio; only when no such width exists are
//!    the axes clamped independently

use serde::{Deserialize, Serialize};

use crate::document::{NodeId, Surface};
use crate::geometry::{current_box, Rect, SizeBounds};
use crate::model::PositionMode;

/// A handle direction, named after the edge or corner it drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    N,
    E,
    S,
    W,
    Ne,
    Se,
    Sw,
    Nw,
}

impl Direction {
    /// Every direction, in the order handles are created.
    pub const ALL: [Direction; 8] = [
        Direction::E,
        Direction::S,
        Direction::Se,
        Direction::W,
        Direction::N,
        Direction::Ne,
        Direction::Sw,
        Direction::Nw,
    ];

    /// The directions that only move trailing edges.
    pub const TRAILING: [Direction; 3] = [Direction::E, Direction::S, Direction::Se];

    /// Handles a widget in `mode` gets.
    pub fn for_mode(mode: PositionMode) -> &'static [Direction] {
        match mode {
            PositionMode::Free => &Self::ALL,
            PositionMode::Flow => &Self::TRAILING,
        }
    }

    pub fn permitted(self, mode: PositionMode) -> bool {
        Self::for_mode(mode).contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::N => "n",
            Direction::E => "e",
            Direction::S => "s",
            Direction::W => "w",
            Direction::Ne => "ne",
            Direction::Se => "se",
            Direction::Sw => "sw",
            Direction::Nw => "nw",
        }
    }

    pub fn cursor(self) -> &'static str {
        match self {
            Direction::E | Direction::W => "ew-resize",
            Direction::N | Direction::S => "ns-resize",
            Direction::Se | Direction::Nw => "nwse-resize",
            Direction::Ne | Direction::Sw => "nesw-resize",
        }
    }

    pub fn east(self) -> bool {
        matches!(self, Direction::E | Direction::Ne | Direction::Se)
    }

    pub fn west(self) -> bool {
        matches!(self, Direction::W | Direction::Nw | Direction::Sw)
    }

    pub fn north(self) -> bool {
        matches!(self, Direction::N | Direction::Ne | Direction::Nw)
    }

    pub fn south(self) -> bool {
        matches!(self, Direction::S | Direction::Se | Direction::Sw)
    }

    /// The point on `rect` the handle sits on.
    pub fn anchor(self, rect: &Rect) -> (f64, f64) {
        let (cx, cy) = (rect.center_x(), rect.center_y());
        match self {
            Direction::E => (rect.right(), cy),
            Direction::S => (cx, rect.bottom()),
            Direction::Se => (rect.right(), rect.bottom()),
            Direction::W => (rect.x, cy),
            Direction::N => (cx, rect.y),
            Direction::Ne => (rect.right(), rect.y),
            Direction::Sw => (rect.x, rect.bottom()),
            Direction::Nw => (rect.x, rect.y),
        }
    }
}

/// A pointer sample in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    /// The aspect-ratio modifier (shift) is held.
    #[serde(default)]
    pub preserve_ratio: bool,
}

impl Pointer {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            preserve_ratio: false,
        }
    }

    pub fn with_ratio(mut self) -> Self {
        self.preserve_ratio = true;
        self
    }
}

/// A widget's size and offsets during a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

/// Whether a point lands in the legacy bottom-right hit region of a widget.
pub fn corner_hit(rect: &Rect, x: f64, y: f64, size: f64) -> bool {
    x >= rect.right() - size && x <= rect.right() && y >= rect.bottom() - size && y <= rect.bottom()
}

/// One active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSession {
    pub widget: NodeId,
    pub direction: Direction,
    pub mode: PositionMode,
    pub origin: Pointer,
    pub start: Frame,
    /// Width over height at the start, with the height floored at 1.
    pub aspect: f64,
}

impl InteractionSession {
    /// The frame for a pointer sample.
    pub fn frame_at(&self, pointer: Pointer, bounds: &SizeBounds) -> Frame {
        let dir = self.direction;
        let free = self.mode.is_free();
        let start = self.start;
        let dx = pointer.x - self.origin.x;
        let dy = pointer.y - self.origin.y;

        let mut f = start;
        if dir.east() {
            f.width = start.width + dx;
        }
        if dir.south() {
            f.height = start.height + dy;
        }
        if free {
            if dir.west() {
                f.width = start.width - dx;
                f.left = start.left + dx;
            }
            if dir.north() {
                f.height = start.height - dy;
                f.top = start.top + dy;
            }
        }

        if pointer.preserve_ratio {
            let width_drives = match dir {
                Direction::E | Direction::W => true,
                Direction::N | Direction::S => false,
                _ => (f.width - start.width).abs() > (f.height - start.height).abs(),
            };
            if width_drives {
                f.height = f.width / self.aspect;
            } else {
                f.width = f.height * self.aspect;
            }
            if self.fit_ratio(&mut f, bounds) {
                self.anchor_leading_edges(&mut f);
                return f;
            }
        }

        f.width = bounds.clamp_width(f.width);
        f.height = bounds.clamp_height(f.height);
        self.anchor_leading_edges(&mut f);
        f
    }

    /// Clamp a ratio-locked frame along the width range that keeps both
    /// dimensions in bounds. Returns false when no such width exists.
    fn fit_ratio(&self, f: &mut Frame, bounds: &SizeBounds) -> bool {
        let lo = bounds.min_width.max(bounds.min_height * self.aspect);
        let hi = bounds.max_width.min(bounds.max_height * self.aspect);
        if lo > hi {
            return false;
        }
        f.width = f.width.clamp(lo, hi);
        f.height = f.width / self.aspect;
        true
    }

    fn anchor_leading_edges(&self, f: &mut Frame) {
        if !self.mode.is_free() {
            return;
        }
        if self.direction.west() {
            f.left = self.start.left + (self.start.width - f.width);
        }
        if self.direction.north() {
            f.top = self.start.top + (self.start.height - f.height);
        }
    }
}

/// What a finished drag hands to the commit pipeline: the widget's final
/// live size and, for free widgets, its offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub widget: NodeId,
    pub width: f64,
    pub height: f64,
    pub position: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ControllerState {
    Idle,
    Dragging(InteractionSession),
}

/// Turns pointer input into live widget geometry.
#[derive(Debug, Clone)]
pub struct ResizeController {
    bounds: SizeBounds,
    state: ControllerState,
}

impl ResizeController {
    pub fn new(bounds: SizeBounds) -> Self {
        Self {
            bounds,
            state: ControllerState::Idle,
        }
    }

    pub fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        match &self.state {
            ControllerState::Dragging(s) => Some(s),
            ControllerState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session().is_some()
    }

    /// Start a drag. Refused while another drag is active, when the widget
    /// is gone, or when its mode does not permit `direction`.
    pub fn begin<S: Surface + ?Sized>(
        &mut self,
        surface: &S,
        widget: NodeId,
        direction: Direction,
        pointer: Pointer,
    ) -> bool {
        if self.is_dragging() {
            return false;
        }
        let mode = surface.position_mode(widget);
        if !direction.permitted(mode) {
            tracing::debug!(node = widget.0, direction = direction.as_str(), "handle not permitted");
            return false;
        }
        let (Some(size), Some(rendered)) =
            (current_box(surface, widget), surface.rendered_box(widget))
        else {
            return false;
        };
        let start = Frame {
            width: size.width,
            height: size.height,
            left: size.left.unwrap_or(rendered.x),
            top: size.top.unwrap_or(rendered.y),
        };
        self.state = ControllerState::Dragging(InteractionSession {
            widget,
            direction,
            mode,
            origin: pointer,
            start,
            aspect: start.width / start.height.max(1.0),
        });
        tracing::debug!(
            node = widget.0,
            direction = direction.as_str(),
            width = start.width,
            height = start.height,
            "resize started"
        );
        true
    }

    /// Apply a pointer move to the live box. Returns `None` when idle; if
    /// the widget has disappeared the gesture ends without a commit.
    pub fn drag<S: Surface + ?Sized>(&mut self, surface: &mut S, pointer: Pointer) -> Option<Frame> {
        let session = *self.session()?;
        if !surface.contains(session.widget) {
            tracing::debug!(node = session.widget.0, "widget removed mid-drag");
            self.state = ControllerState::Idle;
            return None;
        }
        let frame = session.frame_at(pointer, &self.bounds);
        tracing::trace!(node = session.widget.0, ?frame, "resize frame");
        apply_frame(surface, &session, &frame);
        Some(frame)
    }

    /// Apply the final move, end the drag and report the final live box.
    pub fn release<S: Surface + ?Sized>(&mut self, surface: &mut S, pointer: Pointer) -> Option<Release> {
        self.drag(surface, pointer)?;
        let session = self.abandon()?;
        let widget = session.widget;
        let rendered = surface.rendered_box(widget)?;
        let position = if surface.position_mode(widget).is_free() {
            let inline = surface.inline_style(widget).unwrap_or_default();
            Some((
                inline.left.unwrap_or(rendered.x),
                inline.top.unwrap_or(rendered.y),
            ))
        } else {
            None
        };
        Some(Release {
            widget,
            width: rendered.width,
            height: rendered.height,
            position,
        })
    }

    /// Drop the active drag without committing.
    pub fn abandon(&mut self) -> Option<InteractionSession> {
        match std::mem::replace(&mut self.state, ControllerState::Idle) {
            ControllerState::Dragging(s) => Some(s),
            ControllerState::Idle => None,
        }
    }
}

/// Write a frame to the widget's inline geometry, in whole pixels. Flow
/// widgets only take the size.
fn apply_frame<S: Surface + ?Sized>(surface: &mut S, session: &InteractionSession, frame: &Frame) {
    let Some(mut style) = surface.inline_style(session.widget) else {
        return;
    };
    style.width = Some(frame.width.round());
    style.height = Some(frame.height.round());
    if session.mode.is_free() {
        style.left = Some(frame.left.round());
        style.top = Some(frame.top.round());
    }
    surface.set_inline_style(session.widget, style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::model::{Document, InlineStyle, Node, Viewport, WidgetKind};

    const BOUNDS: SizeBounds = SizeBounds {
        min_width: 240.0,
        min_height: 160.0,
        max_width: 4000.0,
        max_height: 4000.0,
    };

    fn session(direction: Direction, mode: PositionMode) -> InteractionSession {
        InteractionSession {
            widget: NodeId(1),
            direction,
            mode,
            origin: Pointer::at(100.0, 100.0),
            start: Frame {
                width: 400.0,
                height: 200.0,
                left: 50.0,
                top: 60.0,
            },
            aspect: 2.0,
        }
    }

    #[test]
    fn flow_permits_only_trailing_edges() {
        for dir in Direction::ALL {
            assert_eq!(
                dir.permitted(PositionMode::Flow),
                Direction::TRAILING.contains(&dir)
            );
            assert!(dir.permitted(PositionMode::Free));
        }
    }

    #[test]
    fn east_and_south_grow_with_pointer() {
        let f = session(Direction::Se, PositionMode::Flow).frame_at(Pointer::at(130.0, 110.0), &BOUNDS);
        assert_eq!((f.width, f.height), (430.0, 210.0));
        assert_eq!((f.left, f.top), (50.0, 60.0));
    }

    #[test]
    fn west_keeps_right_edge_fixed() {
        let s = session(Direction::W, PositionMode::Free);
        let f = s.frame_at(Pointer::at(80.0, 140.0), &BOUNDS);
        assert_eq!(f.width, 420.0);
        assert_eq!(f.left + f.width, 450.0);
        assert_eq!(f.height, 200.0);
    }

    #[test]
    fn clamp_rederives_leading_offset() {
        let s = session(Direction::Nw, PositionMode::Free);
        let f = s.frame_at(Pointer::at(400.0, 400.0), &BOUNDS);
        assert_eq!((f.width, f.height), (240.0, 160.0));
        assert_eq!(f.left + f.width, 450.0);
        assert_eq!(f.top + f.height, 260.0);
    }

    #[test]
    fn leading_edges_ignored_in_flow() {
        let s = session(Direction::W, PositionMode::Flow);
        let f = s.frame_at(Pointer::at(0.0, 100.0), &BOUNDS);
        assert_eq!(f.width, 400.0);
        assert_eq!(f.left, 50.0);
    }

    #[test]
    fn aspect_lock_by_direction() {
        let e = session(Direction::E, PositionMode::Free)
            .frame_at(Pointer::at(200.0, 100.0).with_ratio(), &BOUNDS);
        assert_eq!((e.width, e.height), (500.0, 250.0));

        let n = session(Direction::N, PositionMode::Free)
            .frame_at(Pointer::at(100.0, 50.0).with_ratio(), &BOUNDS);
        assert_eq!((n.width, n.height), (500.0, 250.0));
        assert_eq!(n.top + n.height, 260.0);

        // Corner: height changed more, so width follows height.
        let se = session(Direction::Se, PositionMode::Free)
            .frame_at(Pointer::at(110.0, 200.0).with_ratio(), &BOUNDS);
        assert_eq!((se.width, se.height), (600.0, 300.0));
    }

    #[test]
    fn aspect_lock_survives_min_clamp() {
        // Width alone would clamp to 240, height to 160: ratio 1.5.
        let w = session(Direction::W, PositionMode::Free)
            .frame_at(Pointer::at(300.0, 100.0).with_ratio(), &BOUNDS);
        assert_eq!((w.width, w.height), (320.0, 160.0));
        assert_eq!(w.left + w.width, 450.0);

        let nw = session(Direction::Nw, PositionMode::Free)
            .frame_at(Pointer::at(400.0, 400.0).with_ratio(), &BOUNDS);
        assert_eq!((nw.width, nw.height), (320.0, 160.0));
        assert_eq!(nw.top + nw.height, 260.0);
    }

    #[test]
    fn incompatible_aspect_falls_back_to_independent_clamp() {
        let narrow = SizeBounds {
            min_width: 240.0,
            min_height: 160.0,
            max_width: 300.0,
            max_height: 4000.0,
        };
        let mut s = session(Direction::E, PositionMode::Free);
        // 300 / 160 < 2: no width fits both bounds at this ratio.
        s.aspect = 2.0;
        let f = s.frame_at(Pointer::at(100.0, 100.0).with_ratio(), &narrow);
        assert_eq!((f.width, f.height), (300.0, 200.0));
    }

    #[test]
    fn handle_anchors() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(Direction::E.anchor(&r), (110.0, 45.0));
        assert_eq!(Direction::S.anchor(&r), (60.0, 70.0));
        assert_eq!(Direction::Nw.anchor(&r), (10.0, 20.0));
        assert_eq!(Direction::Sw.anchor(&r), (10.0, 70.0));
        assert_eq!(Direction::Ne.cursor(), "nesw-resize");
    }

    #[test]
    fn corner_hit_region() {
        let r = Rect::new(0.0, 0.0, 300.0, 200.0);
        assert!(corner_hit(&r, 295.0, 195.0, 16.0));
        assert!(corner_hit(&r, 300.0, 200.0, 16.0));
        assert!(!corner_hit(&r, 280.0, 195.0, 16.0));
    }

    fn free_doc() -> MemoryDocument {
        MemoryDocument::from_document(&Document {
            children: vec![Node::widget(WidgetKind::Graph, PositionMode::Free, None).with_style(
                InlineStyle {
                    left: Some(20.0),
                    top: Some(40.0),
                    width: Some(300.0),
                    height: Some(200.0),
                    ..Default::default()
                },
            )],
            viewport: Viewport::default(),
        })
    }

    #[test]
    fn drag_applies_and_release_reports() {
        let mut doc = free_doc();
        let w = doc.widgets()[0];
        let mut c = ResizeController::new(BOUNDS);
        assert!(c.begin(&doc, w, Direction::Nw, Pointer::at(20.0, 40.0)));
        assert!(!c.begin(&doc, w, Direction::E, Pointer::at(0.0, 0.0)));

        c.drag(&mut doc, Pointer::at(10.0, 30.0)).unwrap();
        assert_eq!(doc.rendered_box(w), Some(Rect::new(10.0, 30.0, 310.0, 210.0)));

        let r = c.release(&mut doc, Pointer::at(0.0, 20.0)).unwrap();
        assert_eq!((r.width, r.height), (320.0, 220.0));
        assert_eq!(r.position, Some((0.0, 20.0)));
        assert!(!c.is_dragging());
    }

    #[test]
    fn removed_widget_ends_gesture() {
        let mut doc = free_doc();
        let w = doc.widgets()[0];
        let mut c = ResizeController::new(BOUNDS);
        assert!(c.begin(&doc, w, Direction::E, Pointer::at(0.0, 0.0)));
        doc.remove(w);
        assert_eq!(c.drag(&mut doc, Pointer::at(5.0, 5.0)), None);
        assert!(!c.is_dragging());
        assert_eq!(c.release(&mut doc, Pointer::at(5.0, 5.0)), None);
    }
}
