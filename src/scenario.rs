//! # Scenario Replay
//!
//! A scenario is a document plus a script of resize gestures. Replaying it
//! drives the engine exactly as a user would: each gesture presses the
//! named handle at its on-screen position, moves the pointer by `(dx, dy)`,
//! and lets go. The result is the document the engine leaves behind.

use serde::{Deserialize, Serialize};

use crate::config::{self, schema::WidgetConfig};
use crate::document::{MemoryDocument, NodeId, Surface};
use crate::engine::{Engine, EngineEvent};
use crate::error::WidgetError;
use crate::geometry::Rect;
use crate::host::{Host, MemoryHost, Notification};
use crate::interaction::{Direction, Pointer};
use crate::model::{Document, PositionMode, Viewport};
use crate::options::{Activation, EngineOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub document: ScenarioDocument,
    #[serde(default)]
    pub options: EngineOptions,
    #[serde(default)]
    pub gestures: Vec<Gesture>,
}

/// The starting document: XHTML markup, or a node tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioDocument {
    Markup {
        markup: String,
        #[serde(default)]
        viewport: Viewport,
    },
    Tree(Document),
}

/// One scripted drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gesture {
    /// Index of the widget in document order.
    pub widget: usize,
    pub direction: Direction,
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
    #[serde(default)]
    pub preserve_ratio: bool,
}

/// How [`run_json`] reports the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Markup,
    Json,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    document: Document,
    widgets: Vec<WidgetSummary>,
    notifications: &'a [Notification],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetSummary {
    node: NodeId,
    position: PositionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    rendered: Option<Rect>,
    config: Option<WidgetConfig>,
}

impl Scenario {
    pub fn load(&self) -> Result<MemoryDocument, WidgetError> {
        match &self.document {
            ScenarioDocument::Markup { markup, viewport } => MemoryDocument::from_markup(markup, *viewport),
            ScenarioDocument::Tree(doc) => Ok(MemoryDocument::from_document(doc)),
        }
    }

    /// Replay every gesture and hand back the host, engine detached.
    pub fn run(&self) -> Result<MemoryHost, WidgetError> {
        let mut host = MemoryHost::new(self.load()?);
        let mut engine = Engine::attach(&mut host, self.options);
        for gesture in &self.gestures {
            replay(&mut engine, &mut host, gesture)?;
        }
        engine.detach(&mut host);
        Ok(host)
    }
}

fn replay(engine: &mut Engine, host: &mut MemoryHost, gesture: &Gesture) -> Result<(), WidgetError> {
    let widgets = host.surface().map(|s| s.widgets()).unwrap_or_default();
    let widget = *widgets
        .get(gesture.widget)
        .ok_or(WidgetError::UnknownWidget(gesture.widget))?;

    let start = match engine.options().activation {
        Activation::Handles => engine
            .overlay()
            .marker(widget, gesture.direction)
            .map(|m| m.center()),
        Activation::Corner => host
            .surface()
            .and_then(|s| s.viewport_box(widget))
            .map(|r| {
                let inset = engine.options().handle_size / 2.0;
                (r.right() - inset, r.bottom() - inset)
            }),
    };
    let Some((x, y)) = start else {
        tracing::warn!(
            widget = gesture.widget,
            direction = gesture.direction.as_str(),
            "no handle for gesture; skipped"
        );
        return Ok(());
    };

    let mut down = Pointer::at(x, y);
    down.preserve_ratio = gesture.preserve_ratio;
    let mut up = Pointer::at(x + gesture.dx, y + gesture.dy);
    up.preserve_ratio = gesture.preserve_ratio;

    if !engine.dispatch(host, EngineEvent::PointerDown(down)) {
        tracing::warn!(widget = gesture.widget, "gesture did not start");
        return Ok(());
    }
    engine.dispatch(host, EngineEvent::PointerMove(up));
    engine.dispatch(host, EngineEvent::PointerUp(up));
    Ok(())
}

/// Replay a scenario given as JSON and render the resulting document.
pub fn run_json(json: &str, format: OutputFormat) -> Result<String, WidgetError> {
    let scenario: Scenario = serde_json::from_str(json)?;
    let host = scenario.run()?;
    let doc = host.document().ok_or(WidgetError::MissingBody)?;
    match format {
        OutputFormat::Markup => doc.to_markup(),
        OutputFormat::Json => {
            let widgets = doc
                .widgets()
                .into_iter()
                .map(|node| WidgetSummary {
                    node,
                    position: doc.position_mode(node),
                    rendered: doc.rendered_box(node),
                    config: config::widget_config(doc, node),
                })
                .collect();
            let report = Report {
                document: doc.to_document(),
                widgets,
                notifications: host.notifications(),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP_SCENARIO: &str = r#"{
        "document": {
            "markup": "<div data-widget-type=\"table\" style=\"width: 400px; height: 200px\"></div><p></p><p>after</p>"
        },
        "gestures": [{ "widget": 0, "direction": "se", "dx": 40, "dy": 10 }]
    }"#;

    #[test]
    fn markup_scenario_commits_and_compacts() {
        let scenario: Scenario = serde_json::from_str(MARKUP_SCENARIO).unwrap();
        let host = scenario.run().unwrap();
        let doc = host.document().unwrap();
        let w = doc.widgets()[0];
        let cfg = config::read_config(doc, w);
        assert_eq!(cfg["style"]["width"], 440);
        assert_eq!(cfg["style"]["height"], 210);
        assert_eq!(doc.children(doc.body()).len(), 2);
        assert_eq!(host.total_listeners(), 0);
    }

    #[test]
    fn unknown_widget_index_is_an_error() {
        let json = r#"{ "document": { "children": [] }, "gestures": [{ "widget": 3, "direction": "e" }] }"#;
        let err = run_json(json, OutputFormat::Markup).unwrap_err();
        assert!(matches!(err, WidgetError::UnknownWidget(3)));
    }

    #[test]
    fn forbidden_handle_is_skipped() {
        let json = r#"{
            "document": { "markup": "<div data-widget-type=\"text\"></div>" },
            "gestures": [{ "widget": 0, "direction": "nw", "dx": -10, "dy": -10 }]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        let host = scenario.run().unwrap();
        assert!(host.notifications().is_empty());
    }

    #[test]
    fn json_output_includes_notifications() {
        let out = run_json(MARKUP_SCENARIO, OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["notifications"][0]["type"], "widgetChanged");
        assert!(v["document"]["children"].is_array());
        assert_eq!(v["widgets"][0]["position"], "flow");
        assert_eq!(v["widgets"][0]["config"]["type"], "table");
        assert_eq!(v["widgets"][0]["rendered"]["width"], 440.0);
    }

    #[test]
    fn malformed_scenario_reports_parse_error() {
        let err = run_json("{ \"document\": ", OutputFormat::Markup).unwrap_err();
        assert!(matches!(err, WidgetError::Parse { .. }));
    }
}
