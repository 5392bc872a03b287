//! # Widgetbox
//!
//! A geometry and layout engine for widgets embedded in rich-text documents.
//!
//! Tables, charts, text cards and page breaks live inside an editable
//! document as ordinary elements. Users resize them by dragging handles and,
//! for freely placed widgets, move their leading edges too. The engine turns
//! those drags into geometry, persists it into the widget's own
//! configuration attribute, and tidies the layout afterwards, all without
//! ever leaving the markup in a state that fails to parse.
//!
//! Two placement regimes coexist. **Flow** widgets stack in the text like
//! any block and only grow from their trailing edges; after a resize the
//! stack is compacted, with empty filler paragraphs removed and gaps
//! normalized. **Free** widgets are absolutely placed, can be dragged from
//! all eight handles, and float upward after a resize until they meet
//! another free widget or the top of the document.
//!
//! ## Architecture
//!
//! ```text
//! Host editor events
//!       ↓
//!   [engine]       — Lifecycle, pointer capture, commit pipeline
//!       ↓
//!   [interaction]  — Drag state machine: pointer → frame
//!       ↓
//!   [geometry]     — Boxes, clamping, overlap
//!       ↓
//!   [config]       — Widget config codec and typed schemas
//!       ↓
//!   [layout]       — Free compaction, flow compaction, block layout
//!       ↓
//!   [document]     — Surface trait, in-memory tree, XHTML markup
//! ```
//!
//! [`overlay`] keeps the resize handles in viewport space alongside all of
//! this, and [`scenario`] replays scripted gestures for the CLI.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod host;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod options;
pub mod overlay;
pub mod scenario;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use document::{MemoryDocument, NodeId, Surface};
pub use engine::{Engine, EngineEvent};
pub use error::WidgetError;
pub use host::{Host, MemoryHost};
pub use options::EngineOptions;

use scenario::OutputFormat;

/// Replay a scenario described as JSON and return the resulting markup.
///
/// This is the primary entry point for the CLI and the WASM binding.
pub fn run_scenario_json(json: &str) -> Result<String, WidgetError> {
    scenario::run_json(json, OutputFormat::Markup)
}

/// Replay a scenario and return the resulting document tree and host
/// notifications as JSON.
pub fn run_scenario_report(json: &str) -> Result<String, WidgetError> {
    scenario::run_json(json, OutputFormat::Json)
}
