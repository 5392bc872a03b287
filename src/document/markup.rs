//! # XHTML Markup
//!
//! Reads and writes the document's markup, which stays the authoritative,
//! serializable form of everything the engine changes: widget configs live
//! in attributes and live geometry in the `style` attribute.
//!
//! Input is XHTML-ish: end names are not checked, HTML void elements (`<br>`,
//! `<img>`...) need no closing tag, and `&nbsp;` is understood.

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::WidgetError;
use crate::model::{InlineStyle, Node, NodeKind};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

fn markup_err(e: impl std::fmt::Display) -> WidgetError {
    WidgetError::Markup(e.to_string())
}

/// Parse a markup fragment into top-level nodes.
pub fn parse(markup: &str) -> Result<Vec<Node>, WidgetError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;

    let mut open: Vec<Node> = vec![];
    let mut roots: Vec<Node> = vec![];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let node = element_from(&e)?;
                if node_tag(&node).is_some_and(is_void) {
                    attach(&mut open, &mut roots, node);
                } else {
                    open.push(node);
                }
            }
            Event::Empty(e) => {
                let node = element_from(&e)?;
                attach(&mut open, &mut roots, node);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if is_void(&name) {
                    continue;
                }
                // Close everything up to the matching open element. A stray
                // end tag with no match is dropped.
                if let Some(pos) = open.iter().rposition(|n| node_tag(n) == Some(name.as_str())) {
                    while open.len() > pos {
                        if let Some(node) = open.pop() {
                            attach(&mut open, &mut roots, node);
                        }
                    }
                }
            }
            Event::Text(t) => {
                let text = unescape(&String::from_utf8_lossy(&t))?;
                if !text.is_empty() {
                    attach(&mut open, &mut roots, Node::text(&text));
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).to_string();
                attach(&mut open, &mut roots, Node::text(&text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // Unclosed elements close at end of input.
    while let Some(node) = open.pop() {
        attach(&mut open, &mut roots, node);
    }
    Ok(roots)
}

/// Serialize nodes as markup.
pub fn write(nodes: &[Node]) -> Result<String, WidgetError> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        write_node(&mut writer, node)?;
    }
    String::from_utf8(writer.into_inner()).map_err(markup_err)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), WidgetError> {
    match &node.kind {
        NodeKind::Element {
            tag,
            attributes,
            style,
            ..
        } => {
            let mut start = BytesStart::new(tag.as_str());
            for (key, value) in attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            if !style.is_empty() {
                let css = format_style(style);
                start.push_attribute(("style", css.as_str()));
            }
            if node.children.is_empty() && is_void(tag) {
                writer.write_event(Event::Empty(start)).map_err(markup_err)?;
            } else {
                writer.write_event(Event::Start(start)).map_err(markup_err)?;
                for child in &node.children {
                    write_node(writer, child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(tag.as_str())))
                    .map_err(markup_err)?;
            }
        }
        NodeKind::Text { content } => {
            writer
                .write_event(Event::Text(BytesText::new(content)))
                .map_err(markup_err)?;
        }
    }
    Ok(())
}

fn node_tag(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Element { tag, .. } => Some(tag),
        NodeKind::Text { .. } => None,
    }
}

fn attach(open: &mut [Node], roots: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn element_from(e: &BytesStart) -> Result<Node, WidgetError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut node = Node::element(&tag, &[], vec![]);
    if let NodeKind::Element {
        ref mut attributes,
        ref mut style,
        ..
    } = node.kind
    {
        for attr in e.html_attributes() {
            let attr = attr.map_err(markup_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = unescape(&String::from_utf8_lossy(&attr.value))?;
            if key == "style" {
                *style = parse_style(&value);
            } else {
                attributes.insert(key, value);
            }
        }
    }
    Ok(node)
}

fn unescape(raw: &str) -> Result<String, WidgetError> {
    // Editors emit the whole HTML5 named set (`&mdash;`, `&copy;`, ...).
    unescape_with(raw, resolve_html5_entity)
        .map(|s| s.into_owned())
        .map_err(markup_err)
}

// ── Inline style declarations ──────────────────────────────────

/// Parse a `style` attribute. Declarations the engine does not own, or whose
/// values it cannot read, are kept verbatim in `other`.
pub fn parse_style(css: &str) -> InlineStyle {
    let mut style = InlineStyle::default();
    for decl in css.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        let slot = match name.as_str() {
            "width" => &mut style.width,
            "height" => &mut style.height,
            "left" => &mut style.left,
            "top" => &mut style.top,
            "margin-top" => &mut style.margin_top,
            "margin-bottom" => &mut style.margin_bottom,
            "transform" => {
                match parse_translate(value) {
                    Some(t) => style.translate = Some(t),
                    None if value.eq_ignore_ascii_case("none") => style.translate = None,
                    None => style.other.push((name, value.to_string())),
                }
                continue;
            }
            _ => {
                style.other.push((name, value.to_string()));
                continue;
            }
        };
        match parse_css_px(value) {
            Some(v) => *slot = Some(v),
            None => style.other.push((name, value.to_string())),
        }
    }
    style
}

/// Format inline geometry as a `style` attribute value.
pub fn format_style(style: &InlineStyle) -> String {
    let mut decls: Vec<String> = vec![];
    let fields = [
        ("width", style.width),
        ("height", style.height),
        ("left", style.left),
        ("top", style.top),
        ("margin-top", style.margin_top),
        ("margin-bottom", style.margin_bottom),
    ];
    for (name, value) in fields {
        if let Some(v) = value {
            decls.push(format!("{}: {}px", name, v));
        }
    }
    if let Some((x, y)) = style.translate {
        decls.push(format!("transform: translate({}px, {}px)", x, y));
    }
    for (name, value) in &style.other {
        decls.push(format!("{}: {}", name, value));
    }
    decls.join("; ")
}

fn parse_css_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    if number != value || number == "0" {
        number.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    } else {
        None
    }
}

fn parse_translate(value: &str) -> Option<(f64, f64)> {
    let inner = value.trim().strip_prefix("translate(")?.strip_suffix(')')?;
    let (x, y) = match inner.split_once(',') {
        Some((x, y)) => (x, y),
        None => (inner, "0px"),
    };
    Some((parse_css_px(x)?, parse_css_px(y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_of(node: &Node) -> &str {
        node_tag(node).unwrap_or("#text")
    }

    #[test]
    fn parses_widget_attributes_with_quoted_json() {
        let nodes = parse(
            r#"<div data-widget-type="table" data-widget-config='{"showHeader":true,"style":{"width":320}}'></div>"#,
        )
        .unwrap();
        assert_eq!(nodes.len(), 1);
        let NodeKind::Element { attributes, .. } = &nodes[0].kind else {
            panic!("expected element");
        };
        assert_eq!(attributes["data-widget-type"], "table");
        assert_eq!(
            attributes["data-widget-config"],
            r#"{"showHeader":true,"style":{"width":320}}"#
        );
    }

    #[test]
    fn void_elements_and_entities() {
        let nodes = parse("<p>a<br>b&nbsp;&amp;</p><p></p>").unwrap();
        assert_eq!(nodes.len(), 2);
        let p = &nodes[0];
        assert_eq!(p.children.len(), 3);
        assert_eq!(tag_of(&p.children[1]), "br");
        match &p.children[2].kind {
            NodeKind::Text { content } => assert_eq!(content, "b\u{a0}&"),
            _ => panic!("expected text"),
        }
        assert!(nodes[1].children.is_empty());
    }

    #[test]
    fn html_named_entities() {
        let nodes = parse("<p>A&mdash;B &copy; 2024&hellip;</p>").unwrap();
        match &nodes[0].children[0].kind {
            NodeKind::Text { content } => assert_eq!(content, "A\u{2014}B \u{a9} 2024\u{2026}"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn unclosed_elements_close_at_eof() {
        let nodes = parse("<div><p>open").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(tag_of(&nodes[0].children[0]), "p");
    }

    #[test]
    fn style_attribute_round_trip() {
        let style = parse_style(
            "width: 300px; height:200px; top: 0; transform: translate(4px, -6.5px); color: red; left: 2em",
        );
        assert_eq!(style.width, Some(300.0));
        assert_eq!(style.height, Some(200.0));
        assert_eq!(style.top, Some(0.0));
        assert_eq!(style.left, None);
        assert_eq!(style.translate, Some((4.0, -6.5)));
        assert_eq!(
            style.other,
            vec![
                ("color".to_string(), "red".to_string()),
                ("left".to_string(), "2em".to_string())
            ]
        );
        assert_eq!(parse_style(&format_style(&style)), style);
    }

    #[test]
    fn write_escapes_and_keeps_empty_paragraphs() {
        let nodes = vec![
            Node::element("div", &[("data-widget-config", r#"{"a":"it's"}"#)], vec![]),
            Node::paragraph(""),
            Node::element("p", &[], vec![Node::element("br", &[], vec![])]),
        ];
        let out = write(&nodes).unwrap();
        assert!(out.contains("<p></p>"));
        assert!(out.contains("<br/>"));
        let back = parse(&out).unwrap();
        let NodeKind::Element { attributes, .. } = &back[0].kind else {
            panic!("expected element");
        };
        assert_eq!(attributes["data-widget-config"], r#"{"a":"it's"}"#);
    }
}
