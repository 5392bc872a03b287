//! # Widget Configuration Codec
//!
//! Every widget carries its configuration as a single JSON string in the
//! `data-widget-config` attribute. The payload is opaque to the engine except
//! for the reserved `style` object, of which the engine owns four keys:
//! `width`, `height`, `left` and `top`. Everything else, including any other
//! keys inside `style`, is round-tripped untouched.
//!
//! The codec fails soft in both directions. A malformed attribute reads as
//! `None`, and a value that cannot be represented serializes as `None`, in
//! which case the attribute is left as it was. The attribute therefore always
//! holds parseable JSON after any engine write.

pub mod schema;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::{NodeId, Surface};
use crate::model::{WidgetKind, WIDGET_CONFIG_ATTR, WIDGET_TYPE_ATTR};

use schema::WidgetConfig;

/// Key of the engine-owned sub-object inside a widget config.
pub const STYLE_KEY: &str = "style";

/// Parse a raw attribute value. Absent, blank or malformed input yields `None`.
pub fn parse(raw: Option<&str>) -> Option<Value> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

/// Serialize a value for storage in the attribute. Returns `None` when the
/// value cannot be represented as JSON.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::debug!(error = %e, "widget config is not serializable");
            None
        }
    }
}

/// Read a widget's config as a JSON object. Anything that is not an object
/// reads as an empty one.
pub fn read_config<S: Surface + ?Sized>(surface: &S, id: NodeId) -> Map<String, Value> {
    match parse(surface.attribute(id, WIDGET_CONFIG_ATTR).as_deref()) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Read and validate a widget's config against its type's schema. `None`
/// when the node is not a widget of a known type.
pub fn widget_config<S: Surface + ?Sized>(surface: &S, id: NodeId) -> Option<WidgetConfig> {
    let kind = WidgetKind::from_attribute(&surface.attribute(id, WIDGET_TYPE_ATTR)?)?;
    let raw = parse(surface.attribute(id, WIDGET_CONFIG_ATTR).as_deref());
    Some(WidgetConfig::from_value(kind, raw.as_ref()))
}

/// Write a widget's config. Returns `false`, leaving the attribute unchanged,
/// when the config cannot be serialized.
pub fn write_config<S: Surface + ?Sized, T: Serialize + ?Sized>(
    surface: &mut S,
    id: NodeId,
    config: &T,
) -> bool {
    match serialize(config) {
        Some(s) => surface.set_attribute(id, WIDGET_CONFIG_ATTR, &s),
        None => {
            tracing::warn!(node = id.0, "rejected widget config write");
            false
        }
    }
}

/// The engine-owned geometry inside `config.style`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StyleUpdate {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

/// Merge geometry into a config's `style` object, rounding to whole pixels.
/// Keys of `style` the engine does not own are preserved; a non-object
/// `style` is replaced.
pub fn merge_style(config: &mut Map<String, Value>, update: &StyleUpdate) {
    let mut style = match config.remove(STYLE_KEY) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let fields = [
        ("width", update.width),
        ("height", update.height),
        ("left", update.left),
        ("top", update.top),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            style.insert(key.to_string(), px_value(v));
        }
    }
    config.insert(STYLE_KEY.to_string(), Value::Object(style));
}

/// Commit geometry to a widget's persisted config.
pub fn commit_style<S: Surface + ?Sized>(surface: &mut S, id: NodeId, update: &StyleUpdate) -> bool {
    let mut config = read_config(surface, id);
    merge_style(&mut config, update);
    write_config(surface, id, &config)
}

/// A whole-pixel JSON number. Non-finite input becomes `null`.
fn px_value(v: f64) -> Value {
    let rounded = v.round();
    if rounded.is_finite() && rounded.abs() < i64::MAX as f64 {
        Value::from(rounded as i64)
    } else {
        Value::Null
    }
}
