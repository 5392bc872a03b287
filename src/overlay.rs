//! # Handle Overlay
//!
//! Resize handles live in one fixed layer above the editing surface, in
//! viewport coordinates, so they never enter the document's markup. Each
//! live widget has a [`HandleRecord`]: eight markers for a free widget, the
//! three trailing-edge markers for a flow widget. Markers are squares
//! centered on their anchor point of the widget's viewport box.
//!
//! Records follow the widget set on every sync and are repositioned whenever
//! the viewport scrolls or resizes and on every drag frame.

use std::collections::BTreeMap;

use crate::document::{NodeId, Surface};
use crate::geometry::Rect;
use crate::interaction::Direction;
use crate::model::PositionMode;

/// One resize handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub direction: Direction,
    /// Viewport-space square, centered on the anchor.
    pub rect: Rect,
}

impl Marker {
    pub fn center(&self) -> (f64, f64) {
        (self.rect.center_x(), self.rect.center_y())
    }

    pub fn cursor(&self) -> &'static str {
        self.direction.cursor()
    }
}

/// The handles of one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleRecord {
    pub widget: NodeId,
    pub mode: PositionMode,
    pub markers: Vec<Marker>,
}

/// Counts from one [`HandleOverlay::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct HandleOverlay {
    handle_size: f64,
    records: BTreeMap<NodeId, HandleRecord>,
    /// Widgets in document order, as of the last sync.
    stacking: Vec<NodeId>,
}

impl HandleOverlay {
    pub fn new(handle_size: f64) -> Self {
        Self {
            handle_size,
            records: BTreeMap::new(),
            stacking: Vec::new(),
        }
    }

    pub fn handle_size(&self) -> f64 {
        self.handle_size
    }

    /// Bring the records in line with the surface's widgets, then reposition
    /// every marker. A widget whose positioning mode changed gets a fresh
    /// record with the right set of handles.
    pub fn sync<S: Surface + ?Sized>(&mut self, surface: &S) -> SyncReport {
        let mut report = SyncReport::default();
        let widgets = surface.widgets();

        let before = self.records.len();
        self.records.retain(|id, record| {
            widgets.contains(id) && surface.position_mode(*id) == record.mode
        });
        report.dropped = before - self.records.len();

        for &widget in &widgets {
            if self.records.contains_key(&widget) {
                continue;
            }
            let mode = surface.position_mode(widget);
            let markers = Direction::for_mode(mode)
                .iter()
                .map(|&direction| Marker {
                    direction,
                    rect: Rect::default(),
                })
                .collect();
            self.records.insert(
                widget,
                HandleRecord {
                    widget,
                    mode,
                    markers,
                },
            );
            report.created += 1;
        }

        self.stacking = widgets;
        self.place_all(surface);
        if report != SyncReport::default() {
            tracing::debug!(
                created = report.created,
                dropped = report.dropped,
                live = self.records.len(),
                "synced handle overlay"
            );
        }
        report
    }

    /// Reposition one widget's markers from its current viewport box.
    pub fn place<S: Surface + ?Sized>(&mut self, surface: &S, widget: NodeId) {
        let size = self.handle_size;
        let Some(record) = self.records.get_mut(&widget) else {
            return;
        };
        let Some(vbox) = surface.viewport_box(widget) else {
            return;
        };
        for marker in &mut record.markers {
            let (x, y) = marker.direction.anchor(&vbox);
            marker.rect = Rect::new(x - size / 2.0, y - size / 2.0, size, size);
        }
    }

    pub fn place_all<S: Surface + ?Sized>(&mut self, surface: &S) {
        let ids: Vec<NodeId> = self.records.keys().copied().collect();
        for id in ids {
            self.place(surface, id);
        }
    }

    /// The marker under a viewport point. Widgets later in the document sit
    /// above earlier ones, and within a widget later markers above earlier
    /// ones.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<(NodeId, Direction)> {
        let mut stack = self.stacking.iter().rev().filter_map(|id| self.records.get(id));
        stack.find_map(|record| {
            record
                .markers
                .iter()
                .rev()
                .find(|m| m.rect.contains(x, y))
                .map(|m| (record.widget, m.direction))
        })
    }

    pub fn record(&self, widget: NodeId) -> Option<&HandleRecord> {
        self.records.get(&widget)
    }

    pub fn marker(&self, widget: NodeId, direction: Direction) -> Option<&Marker> {
        self.record(widget)?
            .markers
            .iter()
            .find(|m| m.direction == direction)
    }

    pub fn records(&self) -> impl Iterator<Item = &HandleRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.stacking.clear();
    }
}
