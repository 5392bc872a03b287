//! # Document Model
//!
//! The input representation for the engine. A document is a tree of element
//! and text nodes, close to the DOM a rich-text editor keeps internally. It is
//! designed to be produced by deserializing JSON, by reading XHTML markup, or
//! by direct construction in tests.
//!
//! Widgets are ordinary elements. What makes an element a widget is the
//! `data-widget-type` attribute; its persisted geometry lives in the JSON
//! string held by `data-widget-config`, and `data-position="free"` switches it
//! from normal flow to absolute placement.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute naming the widget type. Its presence marks an element as a widget.
pub const WIDGET_TYPE_ATTR: &str = "data-widget-type";
/// Attribute holding the serialized widget configuration.
pub const WIDGET_CONFIG_ATTR: &str = "data-widget-config";
/// Attribute selecting the positioning mode. Only the literal `free` matters.
pub const POSITION_ATTR: &str = "data-position";

/// A complete document ready to be loaded into a surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Children of the document body.
    pub children: Vec<Node>,

    /// The editing viewport the document is shown through.
    #[serde(default)]
    pub viewport: Viewport,
}

/// The window onto the document: its size, where its frame sits on screen,
/// and how far it is scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    #[serde(default = "default_viewport_width")]
    pub width: f64,
    #[serde(default = "default_viewport_height")]
    pub height: f64,
    /// Screen position of the editing frame (e.g. an iframe) in the viewport.
    #[serde(default)]
    pub origin_x: f64,
    #[serde(default)]
    pub origin_y: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
            origin_x: 0.0,
            origin_y: 0.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

fn default_viewport_width() -> f64 {
    800.0
}

fn default_viewport_height() -> f64 {
    600.0
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// What kind of node this is.
    pub kind: NodeKind,

    /// Child nodes. Always empty for text.
    #[serde(default)]
    pub children: Vec<Node>,
}

/// The different kinds of nodes in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// An element such as `p`, `div` or `br`.
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        /// Inline geometry, the equivalent of the element's `style` attribute.
        #[serde(default, skip_serializing_if = "InlineStyle::is_empty")]
        style: InlineStyle,
        /// Intrinsic size reported by the content renderer, used when no
        /// explicit width/height is set.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        measured: Option<Size>,
    },

    /// A run of character data.
    Text { content: String },
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// The inline geometry of an element. Everything is in pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_bottom: Option<f64>,
    /// A 2-D `translate(x, y)` transform left behind by a visual drag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<(f64, f64)>,
    /// Declarations the engine does not interpret, kept in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn is_empty(&self) -> bool {
        *self == InlineStyle::default()
    }
}

/// How a widget takes part in layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Stacks with the surrounding content.
    #[default]
    Flow,
    /// Absolutely placed by explicit left/top offsets.
    Free,
}

impl PositionMode {
    /// Read the mode from the value of the `data-position` attribute.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("free") => PositionMode::Free,
            _ => PositionMode::Flow,
        }
    }

    pub fn is_free(self) -> bool {
        self == PositionMode::Free
    }
}

/// The closed set of widget types the editor knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    Table,
    Graph,
    Text,
    PageBreak,
}

impl WidgetKind {
    /// Read the kind from the value of the `data-widget-type` attribute.
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "table" => Some(WidgetKind::Table),
            "graph" => Some(WidgetKind::Graph),
            "text" => Some(WidgetKind::Text),
            "pageBreak" => Some(WidgetKind::PageBreak),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::Table => "table",
            WidgetKind::Graph => "graph",
            WidgetKind::Text => "text",
            WidgetKind::PageBreak => "pageBreak",
        }
    }
}

impl Node {
    /// Create an element with attributes and children.
    pub fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Self {
        Self {
            kind: NodeKind::Element {
                tag: tag.to_string(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                style: InlineStyle::default(),
                measured: None,
            },
            children,
        }
    }

    /// Create a text node.
    pub fn text(content: &str) -> Self {
        Self {
            kind: NodeKind::Text {
                content: content.to_string(),
            },
            children: vec![],
        }
    }

    /// Create a `<p>` holding a single line of text. An empty string yields
    /// an empty filler paragraph.
    pub fn paragraph(content: &str) -> Self {
        let children = if content.is_empty() {
            vec![]
        } else {
            vec![Node::text(content)]
        };
        Node::element("p", &[], children)
    }

    /// Create a widget element. The config, when given, is stored as JSON.
    pub fn widget(kind: WidgetKind, mode: PositionMode, config: Option<&Value>) -> Self {
        let mut attributes = vec![(WIDGET_TYPE_ATTR, kind.as_str())];
        if mode.is_free() {
            attributes.push((POSITION_ATTR, "free"));
        }
        let serialized = config.map(|c| c.to_string());
        if let Some(ref s) = serialized {
            attributes.push((WIDGET_CONFIG_ATTR, s.as_str()));
        }
        Node::element("div", &attributes, vec![])
    }

    /// Set the inline style of an element. No-op on text.
    pub fn with_style(mut self, inline: InlineStyle) -> Self {
        if let NodeKind::Element { ref mut style, .. } = self.kind {
            *style = inline;
        }
        self
    }

    /// Set the measured intrinsic size of an element. No-op on text.
    pub fn with_measured(mut self, width: f64, height: f64) -> Self {
        if let NodeKind::Element {
            ref mut measured, ..
        } = self.kind
        {
            *measured = Some(Size { width, height });
        }
        self
    }
}
