//! Structured error types for the widget engine.
//!
//! Geometry never fails: bad sizes are clamped, bad configs fall back to
//! defaults. Errors only come out of the loading surfaces, i.e. reading a
//! scenario or document as JSON or markup and replaying scripted gestures.

use thiserror::Error;

/// The unified error type returned by the public loading API.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// JSON input failed to parse as a valid scenario or document.
    #[error("Failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// XHTML markup could not be read or written.
    #[error("Markup error: {0}")]
    Markup(String),
    /// The host has no document body to attach to.
    #[error("Host document has no body")]
    MissingBody,
    /// A scripted gesture referenced a widget index that does not exist.
    #[error("No widget at index {0}")]
    UnknownWidget(usize),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the scenario schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        WidgetError::Parse { source: e, hint }
    }
}

impl From<quick_xml::Error> for WidgetError {
    fn from(e: quick_xml::Error) -> Self {
        WidgetError::Markup(e.to_string())
    }
}
