//! # Free-Mode Compaction
//!
//! After a free widget is resized or moved it floats upward, one step at a
//! time, until it would come closer than the margin to another free widget
//! or to the top of the document.
//!
//! 1. Fold any residual `translate` into inline `left`/`top` and clear it
//! 2. From the current top, probe `max(margin, top - step)`
//! 3. A probe is blocked when the widget's box, kept one margin apart from
//!    every other free widget's box, would overlap it (half-open)
//! 4. On a blocked probe, snap once to the lowest top that leaves exactly
//!    one margin below the blocking widgets, if that is still an upward move
//!    and collision-free; then stop
//! 5. Stop at the floor
//!
//! A widget that starts above the floor (dragged past the document top, or
//! loaded that way) is pushed down to the floor instead, provided nothing
//! sits there; otherwise it stays put.
//!
//! Only the moving widget changes; free widgets are out of flow, so the
//! other boxes stay put for the whole walk and the probes are computed
//! without touching the surface. The final top is written once.

use crate::document::{NodeId, Surface};
use crate::geometry::{expand, overlaps, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionCompactor {
    /// Required gap between free widgets, and between a widget and the
    /// document top.
    pub margin: f64,
    pub step: f64,
}

impl Default for PositionCompactor {
    fn default() -> Self {
        Self {
            margin: 8.0,
            step: 8.0,
        }
    }
}

impl PositionCompactor {
    /// Compact one widget toward the floor. Returns the new inline top if it moved.
    /// Flow widgets and detached nodes are left alone.
    pub fn compact<S: Surface + ?Sized>(&self, surface: &mut S, id: NodeId) -> Option<f64> {
        if !surface.contains(id) || !surface.position_mode(id).is_free() {
            return None;
        }

        let mut style = surface.inline_style(id)?;
        if let Some((tx, ty)) = style.translate.take() {
            style.left = Some(style.left.unwrap_or(0.0) + tx);
            style.top = Some(style.top.unwrap_or(0.0) + ty);
            surface.set_inline_style(id, style.clone());
        }

        let top = style.top.unwrap_or(0.0);
        let rendered = surface.rendered_box(id)?;
        // Where top = 0 would put the box.
        let origin = Rect::new(rendered.x, rendered.y - top, rendered.width, rendered.height);

        let others: Vec<Rect> = surface
            .widgets()
            .into_iter()
            .filter(|&w| w != id && surface.position_mode(w).is_free())
            .filter_map(|w| surface.rendered_box(w))
            .collect();

        let new_top = self.settle(origin, top, &others);
        if new_top == top {
            return None;
        }

        tracing::debug!(node = id.0, from = top, to = new_top, "compacted free widget");
        style.top = Some(new_top);
        surface.set_inline_style(id, style);
        Some(new_top)
    }

    /// The greedy upward walk. `origin` is the widget's box at top offset 0.
    pub fn settle(&self, origin: Rect, mut top: f64, others: &[Rect]) -> f64 {
        let floor = self.margin;
        if top < floor {
            if self.collisions(origin.translate(0.0, floor), others).is_empty() {
                return floor;
            }
            return top;
        }
        while top > floor {
            let probe = floor.max(top - self.step);
            let blockers = self.collisions(origin.translate(0.0, probe), others);
            if blockers.is_empty() {
                top = probe;
                continue;
            }

            let contact = blockers
                .iter()
                .map(|b| b.bottom() + self.margin - origin.y)
                .fold(f64::NEG_INFINITY, f64::max);
            if contact < top
                && contact >= floor
                && self
                    .collisions(origin.translate(0.0, contact), others)
                    .is_empty()
            {
                top = contact;
            }
            break;
        }
        top
    }

    fn collisions(&self, candidate: Rect, others: &[Rect]) -> Vec<Rect> {
        let half = self.margin / 2.0;
        let grown = expand(candidate, half);
        others
            .iter()
            .filter(|o| overlaps(&grown, &expand(**o, half)))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::model::{Document, InlineStyle, Node, PositionMode, Viewport, WidgetKind};

    fn free_at(left: f64, top: f64, width: f64, height: f64) -> Node {
        Node::widget(WidgetKind::Graph, PositionMode::Free, None).with_style(InlineStyle {
            left: Some(left),
            top: Some(top),
            width: Some(width),
            height: Some(height),
            ..Default::default()
        })
    }

    fn doc(children: Vec<Node>) -> MemoryDocument {
        MemoryDocument::from_document(&Document {
            children,
            viewport: Viewport::default(),
        })
    }

    #[test]
    fn settles_one_margin_below_blocker() {
        let mut d = doc(vec![free_at(0.0, 0.0, 300.0, 150.0), free_at(0.0, 200.0, 300.0, 200.0)]);
        let moving = d.widgets()[1];
        let top = PositionCompactor::default().compact(&mut d, moving);
        assert_eq!(top, Some(158.0));
        assert_eq!(d.rendered_box(moving).unwrap().y, 158.0);
    }

    #[test]
    fn rises_to_floor_when_unobstructed() {
        let mut d = doc(vec![free_at(40.0, 300.0, 300.0, 200.0)]);
        let w = d.widgets()[0];
        assert_eq!(PositionCompactor::default().compact(&mut d, w), Some(8.0));
    }

    #[test]
    fn already_at_floor_does_not_move() {
        let mut d = doc(vec![free_at(0.0, 8.0, 300.0, 200.0)]);
        let w = d.widgets()[0];
        assert_eq!(PositionCompactor::default().compact(&mut d, w), None);
    }

    #[test]
    fn side_by_side_widgets_do_not_block() {
        let mut d = doc(vec![free_at(0.0, 0.0, 300.0, 150.0), free_at(400.0, 200.0, 300.0, 200.0)]);
        let moving = d.widgets()[1];
        assert_eq!(PositionCompactor::default().compact(&mut d, moving), Some(8.0));
    }

    #[test]
    fn translate_is_folded_first() {
        let node = Node::widget(WidgetKind::Text, PositionMode::Free, None).with_style(InlineStyle {
            left: Some(10.0),
            top: Some(4.0),
            width: Some(300.0),
            height: Some(200.0),
            translate: Some((6.0, 2.0)),
            ..Default::default()
        });
        let mut d = doc(vec![node]);
        let w = d.widgets()[0];
        assert_eq!(PositionCompactor::default().compact(&mut d, w), Some(8.0));
        let style = d.inline_style(w).unwrap();
        assert_eq!(style.translate, None);
        assert_eq!(style.left, Some(16.0));
        assert_eq!(style.top, Some(8.0));
    }

    #[test]
    fn above_floor_is_pushed_down() {
        let mut d = doc(vec![free_at(100.0, -80.0, 400.0, 200.0)]);
        let w = d.widgets()[0];
        assert_eq!(PositionCompactor::default().compact(&mut d, w), Some(8.0));
        assert_eq!(d.rendered_box(w).unwrap().y, 8.0);
    }

    #[test]
    fn above_floor_stays_when_floor_is_taken() {
        let c = PositionCompactor::default();
        let others = [Rect::new(0.0, 8.0, 300.0, 100.0)];
        let origin = Rect::new(0.0, 0.0, 300.0, 100.0);
        assert_eq!(c.settle(origin, -40.0, &others), -40.0);
        assert_eq!(c.settle(origin, 2.0, &[]), 8.0);
    }

    #[test]
    fn flow_widgets_are_ignored() {
        let node = Node::widget(WidgetKind::Table, PositionMode::Flow, None)
            .with_style(InlineStyle {
                top: Some(300.0),
                ..Default::default()
            });
        let mut d = doc(vec![node]);
        let w = d.widgets()[0];
        assert_eq!(PositionCompactor::default().compact(&mut d, w), None);
    }

    #[test]
    fn result_keeps_the_gap() {
        let c = PositionCompactor::default();
        let others = [
            Rect::new(0.0, 0.0, 300.0, 100.0),
            Rect::new(200.0, 130.0, 300.0, 60.0),
        ];
        let origin = Rect::new(100.0, 0.0, 250.0, 120.0);
        let top = c.settle(origin, 500.0, &others);
        let placed = origin.translate(0.0, top);
        for o in &others {
            assert!(!overlaps(&expand(placed, 4.0), &expand(*o, 4.0)));
        }
        assert_eq!(top, 198.0);
    }
}
