//! # Document Surface
//!
//! The engine never touches a concrete document tree. It talks to a
//! [`Surface`]: a small capability interface for querying widgets, reading
//! and writing one attribute at a time, reading a node's live rendered box,
//! and walking siblings for flow compaction. A real editor bridges its DOM to
//! this trait; [`MemoryDocument`] implements it in memory, with its own block
//! layout pass standing in for the browser's, so every algorithm is testable
//! without a rendering surface.

pub mod markup;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::WidgetError;
use crate::geometry::Rect;
use crate::layout;
use crate::model::{
    Document, InlineStyle, Node, NodeKind, PositionMode, Size, Viewport, POSITION_ATTR,
    WIDGET_TYPE_ATTR,
};

/// Identifies a node for the lifetime of a surface. Ids are never reused, so
/// a removed widget's id simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A borrowed view of a node's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Element { tag: &'a str },
    Text(&'a str),
}

/// What the engine needs from a document.
///
/// Rendered boxes come in two coordinate spaces: `rendered_box` is relative
/// to the document body, `viewport_box` is where the node currently appears
/// on screen once the editing frame's offset and scroll are applied.
pub trait Surface {
    /// Every live widget element, in document order.
    fn widgets(&self) -> Vec<NodeId>;

    /// Whether the node is still attached to the document.
    fn contains(&self, id: NodeId) -> bool;

    fn node(&self, id: NodeId) -> Option<NodeRef<'_>>;

    fn children(&self, id: NodeId) -> Vec<NodeId>;

    fn next_sibling(&self, id: NodeId) -> Option<NodeId>;

    fn attribute(&self, id: NodeId, name: &str) -> Option<String>;

    /// Returns `false` if the node is gone.
    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool;

    fn inline_style(&self, id: NodeId) -> Option<InlineStyle>;

    /// Returns `false` if the node is gone.
    fn set_inline_style(&mut self, id: NodeId, style: InlineStyle) -> bool;

    /// The node's live box in document coordinates.
    fn rendered_box(&self, id: NodeId) -> Option<Rect>;

    /// The node's live box in viewport coordinates.
    fn viewport_box(&self, id: NodeId) -> Option<Rect>;

    /// Detach a node (and its subtree) from the document.
    fn remove(&mut self, id: NodeId) -> bool;

    fn position_mode(&self, id: NodeId) -> PositionMode {
        PositionMode::from_attribute(self.attribute(id, POSITION_ATTR).as_deref())
    }
}

// ── In-memory document ─────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub style: InlineStyle,
    pub measured: Option<Size>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
    alive: bool,
}

/// An arena-backed document tree with a built-in block layout.
///
/// Layout is recomputed after every mutation, so rendered boxes are always
/// current, the way a browser's would be after a synchronous reflow.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    slots: Vec<Slot>,
    body: NodeId,
    viewport: Viewport,
    boxes: HashMap<NodeId, Rect>,
}

impl MemoryDocument {
    /// An empty document with just a body.
    pub fn new(viewport: Viewport) -> Self {
        let mut doc = MemoryDocument {
            slots: vec![],
            body: NodeId(0),
            viewport,
            boxes: HashMap::new(),
        };
        doc.body = doc.alloc(
            None,
            NodeData::Element(ElementData {
                tag: "body".to_string(),
                attributes: BTreeMap::new(),
                style: InlineStyle::default(),
                measured: None,
            }),
        );
        doc.relayout();
        doc
    }

    pub fn from_document(document: &Document) -> Self {
        let mut doc = MemoryDocument::new(document.viewport);
        let body = doc.body;
        for child in &document.children {
            doc.build(body, child);
        }
        doc.relayout();
        doc
    }

    /// Load a document from an XHTML fragment: the body's children.
    pub fn from_markup(markup: &str, viewport: Viewport) -> Result<Self, WidgetError> {
        let children = markup::parse(markup)?;
        Ok(MemoryDocument::from_document(&Document { children, viewport }))
    }

    /// Snapshot the tree back into the serde model.
    pub fn to_document(&self) -> Document {
        Document {
            children: self.slots[self.body.0]
                .children
                .iter()
                .map(|&c| self.snapshot(c))
                .collect(),
            viewport: self.viewport,
        }
    }

    /// Serialize the body's children as XHTML.
    pub fn to_markup(&self) -> Result<String, WidgetError> {
        markup::write(&self.to_document().children)
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.viewport.scroll_x = x;
        self.viewport.scroll_y = y;
    }

    /// Resize the viewport. The body reflows to the new width.
    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.relayout();
    }

    pub fn set_frame_origin(&mut self, x: f64, y: f64) {
        self.viewport.origin_x = x;
        self.viewport.origin_y = y;
    }

    /// Append a subtree under `parent`. Returns the new root's id.
    pub fn append(&mut self, parent: NodeId, node: &Node) -> Option<NodeId> {
        if !self.is_element(parent) {
            return None;
        }
        let id = self.build(parent, node);
        self.relayout();
        Some(id)
    }

    /// Ancestors from the node's parent up to the body: the path a bubbling
    /// event travels.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![];
        let mut cur = self.slot(id).and_then(|s| s.parent);
        while let Some(p) = cur {
            path.push(p);
            cur = self.slots[p.0].parent;
        }
        path
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.slot(id)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slot(id).map(|s| &s.data)
    }

    pub(crate) fn child_ids(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0).filter(|s| s.alive)
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.slots.get_mut(id.0).filter(|s| s.alive) {
            Some(Slot {
                data: NodeData::Element(el),
                ..
            }) => Some(el),
            _ => None,
        }
    }

    fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    fn alloc(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            parent,
            children: vec![],
            data,
            alive: true,
        });
        if let Some(p) = parent {
            self.slots[p.0].children.push(id);
        }
        id
    }

    fn build(&mut self, parent: NodeId, node: &Node) -> NodeId {
        let data = match &node.kind {
            NodeKind::Element {
                tag,
                attributes,
                style,
                measured,
            } => NodeData::Element(ElementData {
                tag: tag.clone(),
                attributes: attributes.clone(),
                style: style.clone(),
                measured: *measured,
            }),
            NodeKind::Text { content } => NodeData::Text(content.clone()),
        };
        let is_text = matches!(data, NodeData::Text(_));
        let id = self.alloc(Some(parent), data);
        if !is_text {
            for child in &node.children {
                self.build(id, child);
            }
        }
        id
    }

    fn snapshot(&self, id: NodeId) -> Node {
        let slot = &self.slots[id.0];
        match &slot.data {
            NodeData::Element(el) => Node {
                kind: NodeKind::Element {
                    tag: el.tag.clone(),
                    attributes: el.attributes.clone(),
                    style: el.style.clone(),
                    measured: el.measured,
                },
                children: slot.children.iter().map(|&c| self.snapshot(c)).collect(),
            },
            NodeData::Text(s) => Node::text(s),
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(s)) => out.push_str(s),
            Some(NodeData::Element(_)) => {
                for &c in self.child_ids(id) {
                    self.collect_text(c, out);
                }
            }
            None => {}
        }
    }

    fn collect_widgets(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(el) = self.element(id) {
            if el.attributes.contains_key(WIDGET_TYPE_ATTR) {
                out.push(id);
            }
            for &c in self.child_ids(id) {
                self.collect_widgets(c, out);
            }
        }
    }

    fn kill(&mut self, id: NodeId) {
        self.slots[id.0].alive = false;
        let children = std::mem::take(&mut self.slots[id.0].children);
        for c in children {
            self.kill(c);
        }
    }

    fn relayout(&mut self) {
        self.boxes = layout::layout_document(self);
    }
}

impl Surface for MemoryDocument {
    fn widgets(&self) -> Vec<NodeId> {
        let mut out = vec![];
        self.collect_widgets(self.body, &mut out);
        out
    }

    fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        Some(match self.data(id)? {
            NodeData::Element(el) => NodeRef::Element { tag: &el.tag },
            NodeData::Text(s) => NodeRef::Text(s),
        })
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.child_ids(id).to_vec()
    }

    fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.slot(id)?.parent?;
        let siblings = &self.slots[parent.0].children;
        let pos = siblings.iter().position(|&s| s == id)?;
        siblings.get(pos + 1).copied()
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.element(id)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(el) = self.element_mut(id) else {
            return false;
        };
        el.attributes.insert(name.to_string(), value.to_string());
        if name == POSITION_ATTR {
            self.relayout();
        }
        true
    }

    fn inline_style(&self, id: NodeId) -> Option<InlineStyle> {
        Some(self.element(id)?.style.clone())
    }

    fn set_inline_style(&mut self, id: NodeId, style: InlineStyle) -> bool {
        let Some(el) = self.element_mut(id) else {
            return false;
        };
        el.style = style;
        self.relayout();
        true
    }

    fn rendered_box(&self, id: NodeId) -> Option<Rect> {
        if !self.contains(id) {
            return None;
        }
        self.boxes.get(&id).copied()
    }

    fn viewport_box(&self, id: NodeId) -> Option<Rect> {
        let v = &self.viewport;
        self.rendered_box(id)
            .map(|r| r.translate(v.origin_x - v.scroll_x, v.origin_y - v.scroll_y))
    }

    fn remove(&mut self, id: NodeId) -> bool {
        if id == self.body {
            return false;
        }
        let Some(parent) = self.slot(id).and_then(|s| s.parent) else {
            return false;
        };
        self.slots[parent.0].children.retain(|&c| c != id);
        self.kill(id);
        self.relayout();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{WidgetKind, WIDGET_CONFIG_ATTR};

    fn sample() -> MemoryDocument {
        MemoryDocument::from_document(&Document {
            children: vec![
                Node::paragraph("intro"),
                Node::widget(WidgetKind::Table, PositionMode::Flow, None).with_measured(400.0, 200.0),
                Node::text("\n  "),
                Node::paragraph(""),
                Node::element(
                    "section",
                    &[],
                    vec![Node::widget(WidgetKind::Graph, PositionMode::Free, None)
                        .with_measured(300.0, 150.0)],
                ),
            ],
            viewport: Viewport::default(),
        })
    }

    #[test]
    fn widgets_in_document_order() {
        let doc = sample();
        let widgets = doc.widgets();
        assert_eq!(widgets.len(), 2);
        assert_eq!(doc.attribute(widgets[0], WIDGET_TYPE_ATTR).as_deref(), Some("table"));
        assert_eq!(doc.position_mode(widgets[1]), PositionMode::Free);
    }

    #[test]
    fn next_sibling_walks_including_text() {
        let doc = sample();
        let table = doc.widgets()[0];
        let ws = doc.next_sibling(table).unwrap();
        assert!(matches!(doc.node(ws), Some(NodeRef::Text(_))));
        let filler = doc.next_sibling(ws).unwrap();
        assert_eq!(doc.node(filler), Some(NodeRef::Element { tag: "p" }));
    }

    #[test]
    fn removed_nodes_stop_resolving() {
        let mut doc = sample();
        let graph = doc.widgets()[1];
        let section = doc.ancestors(graph)[0];
        assert!(doc.remove(section));
        assert!(!doc.contains(graph));
        assert_eq!(doc.rendered_box(graph), None);
        assert!(!doc.set_attribute(graph, WIDGET_CONFIG_ATTR, "{}"));
        assert_eq!(doc.widgets().len(), 1);
        assert!(!doc.remove(doc.body()));
    }

    #[test]
    fn viewport_box_applies_origin_and_scroll() {
        let mut doc = sample();
        let table = doc.widgets()[0];
        let r = doc.rendered_box(table).unwrap();
        doc.set_frame_origin(10.0, 50.0);
        doc.scroll_to(0.0, 30.0);
        assert_eq!(doc.viewport_box(table), Some(r.translate(10.0, 20.0)));
    }

    #[test]
    fn ancestors_bubble_to_body() {
        let doc = sample();
        let graph = doc.widgets()[1];
        let path = doc.ancestors(graph);
        assert_eq!(path.len(), 2);
        assert_eq!(*path.last().unwrap(), doc.body());
    }

    #[test]
    fn snapshot_round_trips_structure() {
        let doc = sample();
        let again = MemoryDocument::from_document(&doc.to_document());
        assert_eq!(again.widgets().len(), 2);
        assert_eq!(again.text_content(again.body()), "intro\n  ");
    }
}
