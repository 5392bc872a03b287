//! # Host Editor Boundary
//!
//! The engine is a guest inside a rich-text editor. The [`Host`] trait is all
//! it needs from that editor: the document surface (absent when the editor
//! has no body yet), a way to subscribe to events, and the hooks that tell
//! the editor something changed.
//!
//! [`MemoryHost`] is the in-memory host used by the CLI and the tests. It
//! keeps live listener counts and a log of every notification, so teardown
//! and change signalling can be asserted directly.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::document::{MemoryDocument, NodeId, Surface};

/// Events the engine can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListenerKind {
    Initialized,
    ContentReplaced,
    StructureChanged,
    Removed,
    Scroll,
    Resize,
    /// Document-level pointer move, capture phase. Only held during a drag.
    PointerMoveCapture,
    /// Document-level pointer up, capture phase. Only held during a drag.
    PointerUpCapture,
}

/// A signal the engine sent to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// `widget:changed`, dispatched on the widget and bubbling through `path`.
    WidgetChanged { target: NodeId, path: Vec<NodeId> },
    Change,
    Dirty { dirty: bool },
    NodeChanged,
}

pub trait Host {
    /// The document, or `None` when the editor has no body.
    fn surface(&self) -> Option<&dyn Surface>;

    fn surface_mut(&mut self) -> Option<&mut dyn Surface>;

    fn listen(&mut self, kind: ListenerKind);

    fn unlisten(&mut self, kind: ListenerKind);

    /// Dispatch a bubbling `widget:changed` event from `widget`.
    fn widget_changed(&mut self, widget: NodeId);

    fn fire_change(&mut self);

    fn set_dirty(&mut self, dirty: bool);

    fn node_changed(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    document: Option<MemoryDocument>,
    listeners: BTreeMap<ListenerKind, usize>,
    notifications: Vec<Notification>,
    dirty: bool,
}

impl MemoryHost {
    pub fn new(document: MemoryDocument) -> Self {
        Self {
            document: Some(document),
            ..Default::default()
        }
    }

    /// A host whose editor has not produced a body.
    pub fn without_body() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&MemoryDocument> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut MemoryDocument> {
        self.document.as_mut()
    }

    pub fn into_document(self) -> Option<MemoryDocument> {
        self.document
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.listeners.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.values().sum()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Host for MemoryHost {
    fn surface(&self) -> Option<&dyn Surface> {
        self.document.as_ref().map(|d| d as &dyn Surface)
    }

    fn surface_mut(&mut self) -> Option<&mut dyn Surface> {
        self.document.as_mut().map(|d| d as &mut dyn Surface)
    }

    fn listen(&mut self, kind: ListenerKind) {
        *self.listeners.entry(kind).or_insert(0) += 1;
    }

    fn unlisten(&mut self, kind: ListenerKind) {
        if let Some(count) = self.listeners.get_mut(&kind) {
            *count -= 1;
            if *count == 0 {
                self.listeners.remove(&kind);
            }
        }
    }

    fn widget_changed(&mut self, widget: NodeId) {
        let path = self
            .document
            .as_ref()
            .map(|d| d.ancestors(widget))
            .unwrap_or_default();
        self.notifications.push(Notification::WidgetChanged {
            target: widget,
            path,
        });
    }

    fn fire_change(&mut self) {
        self.notifications.push(Notification::Change);
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
        self.notifications.push(Notification::Dirty { dirty });
    }

    fn node_changed(&mut self) {
        self.notifications.push(Notification::NodeChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Viewport;

    #[test]
    fn listener_counts_balance() {
        let mut host = MemoryHost::new(MemoryDocument::new(Viewport::default()));
        host.listen(ListenerKind::Scroll);
        host.listen(ListenerKind::Scroll);
        host.listen(ListenerKind::Resize);
        assert_eq!(host.listener_count(ListenerKind::Scroll), 2);
        host.unlisten(ListenerKind::Scroll);
        host.unlisten(ListenerKind::Scroll);
        host.unlisten(ListenerKind::Scroll);
        host.unlisten(ListenerKind::Resize);
        assert_eq!(host.total_listeners(), 0);
    }

    #[test]
    fn missing_body_has_no_surface() {
        let mut host = MemoryHost::without_body();
        assert!(host.surface().is_none());
        assert!(host.surface_mut().is_none());
    }

    #[test]
    fn notifications_are_logged() {
        let mut host = MemoryHost::new(MemoryDocument::new(Viewport::default()));
        host.fire_change();
        host.set_dirty(true);
        assert!(host.is_dirty());
        assert_eq!(
            host.take_notifications(),
            vec![Notification::Change, Notification::Dirty { dirty: true }]
        );
        assert!(host.notifications().is_empty());
    }
}
