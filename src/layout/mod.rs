//! # Block Layout and Compaction
//!
//! Two halves live here.
//!
//! The block layout pass gives [`MemoryDocument`] live rendered boxes. It is
//! a small cursor-stacking engine:
//!
//! 1. Open the body at the top of the document with the viewport's width
//! 2. Walk children in order; each block child is placed at the cursor and
//!    the cursor advances by its height
//! 3. Adjacent vertical margins collapse to the larger of the two
//! 4. Runs of inline content (text, `<br>`, `<span>`...) occupy one line box
//! 5. Free widgets are taken out of flow and placed afterwards at their
//!    left/top offsets (plus any translate) from the body origin
//!
//! Explicit inline width/height win; otherwise a renderer-reported measured
//! size; otherwise the available width and the content height.
//!
//! The compactors ([`position`], [`flow`]) run after a resize commit and
//! normalize the layout the user left behind.

pub mod flow;
pub mod position;

use std::collections::HashMap;

use crate::document::{MemoryDocument, NodeData, NodeId};
use crate::geometry::Rect;
use crate::model::POSITION_ATTR;

/// Height of one line box of inline content.
pub const LINE_HEIGHT: f64 = 20.0;

const INLINE_TAGS: &[&str] = &[
    "a", "b", "br", "code", "em", "i", "img", "small", "span", "strong", "sub", "sup", "u",
];

/// Compute the rendered box of every live element, in document coordinates.
pub fn layout_document(doc: &MemoryDocument) -> HashMap<NodeId, Rect> {
    let mut pass = LayoutPass {
        doc,
        boxes: HashMap::new(),
        out_of_flow: vec![],
    };
    let body = doc.body();
    let width = doc.viewport().width;
    let height = pass.layout_children(body, 0.0, 0.0, width);
    let body_rect = Rect::new(0.0, 0.0, width, height);
    pass.boxes.insert(body, body_rect);

    // Free widgets found while placing other free widgets are queued too.
    while let Some(id) = pass.out_of_flow.pop() {
        pass.layout_free(id, body_rect);
    }
    pass.boxes
}

struct LayoutPass<'a> {
    doc: &'a MemoryDocument,
    boxes: HashMap<NodeId, Rect>,
    out_of_flow: Vec<NodeId>,
}

impl LayoutPass<'_> {
    fn layout_element(&mut self, id: NodeId, x: f64, y: f64, available_width: f64) -> f64 {
        let doc = self.doc;
        let Some(el) = doc.element(id) else {
            return 0.0;
        };
        let width = el
            .style
            .width
            .or(el.measured.map(|m| m.width))
            .unwrap_or(available_width);
        let explicit_height = el.style.height.or(el.measured.map(|m| m.height));
        let content_height = self.layout_children(id, x, y, width);
        let height = explicit_height.unwrap_or(content_height);
        self.boxes.insert(id, Rect::new(x, y, width, height));
        height
    }

    /// Stack an element's children starting at `y`. Returns the content height.
    fn layout_children(&mut self, parent: NodeId, x: f64, y: f64, width: f64) -> f64 {
        let doc = self.doc;
        let mut cursor = y;
        // Bottom margin of the previous block, pending collapse with the next.
        let mut pending_margin: Option<f64> = None;
        let mut line_open = false;

        for &child in doc.child_ids(parent) {
            match doc.data(child) {
                Some(NodeData::Text(s)) => {
                    if !is_collapsible(s) {
                        line_open = true;
                    }
                }
                Some(NodeData::Element(el)) => {
                    if el.attributes.get(POSITION_ATTR).map(String::as_str) == Some("free") {
                        self.out_of_flow.push(child);
                        continue;
                    }
                    if INLINE_TAGS.contains(&el.tag.to_ascii_lowercase().as_str()) {
                        if self.has_visible_inline(child) {
                            line_open = true;
                        }
                        continue;
                    }
                    if line_open {
                        cursor += pending_margin.take().unwrap_or(0.0) + LINE_HEIGHT;
                        pending_margin = Some(0.0);
                        line_open = false;
                    }
                    let margin_top = el.style.margin_top.unwrap_or(0.0);
                    let margin_bottom = el.style.margin_bottom.unwrap_or(0.0);
                    cursor += match pending_margin {
                        Some(prev) => prev.max(margin_top),
                        None => margin_top,
                    };
                    cursor += self.layout_element(child, x, cursor, width);
                    pending_margin = Some(margin_bottom);
                }
                None => {}
            }
        }

        if line_open {
            cursor += pending_margin.take().unwrap_or(0.0) + LINE_HEIGHT;
        }
        cursor += pending_margin.unwrap_or(0.0);
        cursor - y
    }

    fn layout_free(&mut self, id: NodeId, container: Rect) {
        let Some(el) = self.doc.element(id) else {
            return;
        };
        let (tx, ty) = el.style.translate.unwrap_or((0.0, 0.0));
        let x = container.x + el.style.left.unwrap_or(0.0) + tx;
        let y = container.y + el.style.top.unwrap_or(0.0) + ty;
        self.layout_element(id, x, y, container.width);
    }

    /// An inline element shows something if it holds non-blank text or a
    /// line break somewhere inside.
    fn has_visible_inline(&self, id: NodeId) -> bool {
        match self.doc.data(id) {
            Some(NodeData::Text(s)) => !is_collapsible(s),
            Some(NodeData::Element(el)) => {
                el.tag.eq_ignore_ascii_case("br")
                    || el.tag.eq_ignore_ascii_case("img")
                    || self
                        .doc
                        .child_ids(id)
                        .iter()
                        .any(|&c| self.has_visible_inline(c))
            }
            None => false,
        }
    }
}

/// Whitespace-only, counting the no-break space.
pub fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c == '\u{a0}')
}

/// Whitespace that collapses away in layout. A no-break space does not.
fn is_collapsible(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Surface;
    use crate::model::{Document, InlineStyle, Node, PositionMode, Viewport, WidgetKind};

    fn doc(children: Vec<Node>) -> MemoryDocument {
        MemoryDocument::from_document(&Document {
            children,
            viewport: Viewport::default(),
        })
    }

    fn margins(top: f64, bottom: f64) -> InlineStyle {
        InlineStyle {
            margin_top: Some(top),
            margin_bottom: Some(bottom),
            ..Default::default()
        }
    }

    #[test]
    fn blocks_stack_vertically() {
        let d = doc(vec![
            Node::paragraph("one"),
            Node::widget(WidgetKind::Table, PositionMode::Flow, None).with_measured(400.0, 200.0),
            Node::paragraph("two"),
        ]);
        let kids = d.children(d.body());
        assert_eq!(d.rendered_box(kids[0]), Some(Rect::new(0.0, 0.0, 800.0, 20.0)));
        assert_eq!(d.rendered_box(kids[1]), Some(Rect::new(0.0, 20.0, 400.0, 200.0)));
        assert_eq!(d.rendered_box(kids[2]), Some(Rect::new(0.0, 220.0, 800.0, 20.0)));
        assert_eq!(d.rendered_box(d.body()).unwrap().height, 240.0);
    }

    #[test]
    fn adjacent_margins_collapse() {
        let d = doc(vec![
            Node::widget(WidgetKind::Table, PositionMode::Flow, None)
                .with_measured(400.0, 100.0)
                .with_style(margins(8.0, 8.0)),
            Node::widget(WidgetKind::Graph, PositionMode::Flow, None)
                .with_measured(400.0, 100.0)
                .with_style(margins(8.0, 8.0)),
        ]);
        let w = d.widgets();
        assert_eq!(d.rendered_box(w[0]).unwrap().y, 8.0);
        assert_eq!(d.rendered_box(w[1]).unwrap().y, 116.0);
        assert_eq!(d.rendered_box(d.body()).unwrap().height, 224.0);
    }

    #[test]
    fn empty_paragraph_has_no_height_but_br_and_nbsp_do() {
        let d = doc(vec![
            Node::paragraph(""),
            Node::element("p", &[], vec![Node::element("br", &[], vec![])]),
            Node::element("p", &[], vec![Node::text("\u{a0}")]),
        ]);
        let kids = d.children(d.body());
        assert_eq!(d.rendered_box(kids[0]).unwrap().height, 0.0);
        assert_eq!(d.rendered_box(kids[1]).unwrap().height, LINE_HEIGHT);
        assert_eq!(d.rendered_box(kids[2]).unwrap().height, LINE_HEIGHT);
    }

    #[test]
    fn free_widgets_leave_flow() {
        let free = Node::widget(WidgetKind::Graph, PositionMode::Free, None).with_style(InlineStyle {
            left: Some(30.0),
            top: Some(200.0),
            width: Some(300.0),
            height: Some(150.0),
            translate: Some((5.0, -10.0)),
            ..Default::default()
        });
        let d = doc(vec![free, Node::paragraph("after")]);
        let kids = d.children(d.body());
        assert_eq!(d.rendered_box(kids[0]), Some(Rect::new(35.0, 190.0, 300.0, 150.0)));
        assert_eq!(d.rendered_box(kids[1]).unwrap().y, 0.0);
    }

    #[test]
    fn inline_text_before_block_opens_a_line() {
        let d = doc(vec![
            Node::text("loose text"),
            Node::widget(WidgetKind::Text, PositionMode::Flow, None).with_measured(300.0, 100.0),
        ]);
        let w = d.widgets()[0];
        assert_eq!(d.rendered_box(w).unwrap().y, LINE_HEIGHT);
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \n\t\u{a0}"));
        assert!(!is_blank(" x "));
        assert!(is_collapsible(" \n\t"));
        assert!(!is_collapsible("\u{a0}"));
    }
}
