//! Engine configuration. Every field has a default, so `{}` is a complete
//! configuration and a scenario only names what it changes.

use serde::{Deserialize, Serialize};

use crate::geometry::SizeBounds;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    #[serde(default = "default_min_width")]
    pub min_width: f64,
    #[serde(default = "default_min_height")]
    pub min_height: f64,
    #[serde(default = "default_max_size")]
    pub max_width: f64,
    #[serde(default = "default_max_size")]
    pub max_height: f64,

    /// Gap kept between free widgets during upward compaction.
    #[serde(default = "default_gap")]
    pub compact_margin: f64,
    /// Distance of one upward compaction probe.
    #[serde(default = "default_gap")]
    pub compact_step: f64,
    /// Vertical margin given to every flow widget.
    #[serde(default = "default_gap")]
    pub stack_gap: f64,

    /// Side of a square resize handle.
    #[serde(default = "default_handle_size")]
    pub handle_size: f64,

    #[serde(default)]
    pub activation: Activation,
}

/// How a resize starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Press one of the overlay's handles.
    #[default]
    Handles,
    /// Press inside a handle-sized region at a widget's bottom-right corner.
    /// Always drags `se`.
    Corner,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_width: default_min_width(),
            min_height: default_min_height(),
            max_width: default_max_size(),
            max_height: default_max_size(),
            compact_margin: default_gap(),
            compact_step: default_gap(),
            stack_gap: default_gap(),
            handle_size: default_handle_size(),
            activation: Activation::default(),
        }
    }
}

impl EngineOptions {
    pub fn bounds(&self) -> SizeBounds {
        SizeBounds {
            min_width: self.min_width,
            min_height: self.min_height,
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

fn default_min_width() -> f64 {
    240.0
}

fn default_min_height() -> f64 {
    160.0
}

fn default_max_size() -> f64 {
    4000.0
}

fn default_gap() -> f64 {
    8.0
}

fn default_handle_size() -> f64 {
    16.0
}
