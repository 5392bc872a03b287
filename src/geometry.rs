//! # Geometry
//!
//! Boxes, clamping and overlap tests shared by the resize controller, the
//! compactors and the handle overlay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{self, STYLE_KEY};
use crate::document::{NodeId, Surface};

/// An axis-aligned rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Grow a rectangle by `margin` on every side.
pub fn expand(rect: Rect, margin: f64) -> Rect {
    Rect::new(
        rect.x - margin,
        rect.y - margin,
        rect.width + margin * 2.0,
        rect.height + margin * 2.0,
    )
}

/// Intersection test on half-open intervals: touching edges don't overlap.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    !(a.right() <= b.x || b.right() <= a.x || a.bottom() <= b.y || b.bottom() <= a.y)
}

/// Two-sided clamp. `max` may be `f64::INFINITY`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Allowed widget dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBounds {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
}

impl SizeBounds {
    pub fn clamp_width(&self, width: f64) -> f64 {
        clamp(width, self.min_width, self.max_width)
    }

    pub fn clamp_height(&self, height: f64) -> f64 {
        clamp(height, self.min_height, self.max_height)
    }
}

/// A widget's current size and, when known, its persisted offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WidgetBox {
    pub width: f64,
    pub height: f64,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

/// Read a pixel magnitude: a finite number, or a string like `"12px"`.
pub fn parse_px(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let lower = s.trim().to_ascii_lowercase();
            let digits = lower.strip_suffix("px")?;
            if digits.is_empty() || digits.ends_with('.') || digits.starts_with('.') {
                return None;
            }
            if !digits
                .trim_start_matches('-')
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.')
            {
                return None;
            }
            digits.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// The box a resize starts from. Persisted `style` values win; the live
/// rendered box fills in whichever dimension is missing, so a freshly
/// inserted widget can still be resized from its rendered footprint.
/// Offsets come from the persisted style, then the inline style, and stay
/// `None` when neither has them.
pub fn current_box<S: Surface + ?Sized>(surface: &S, id: NodeId) -> Option<WidgetBox> {
    let rendered = surface.rendered_box(id)?;
    let config = config::read_config(surface, id);
    let style = config.get(STYLE_KEY).and_then(Value::as_object);
    let persisted = |key: &str| style.and_then(|s| parse_px(s.get(key)));
    let inline = surface.inline_style(id).unwrap_or_default();

    Some(WidgetBox {
        width: persisted("width").unwrap_or_else(|| rendered.width.round()),
        height: persisted("height").unwrap_or_else(|| rendered.height.round()),
        left: persisted("left").or(inline.left),
        top: persisted("top").or(inline.top),
    })
}
