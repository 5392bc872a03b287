//! # Engine
//!
//! Wires the pieces to a host editor. The engine is single-threaded and
//! event-driven: the host calls [`Engine::dispatch`] for every event the
//! engine subscribed to, and everything, compaction included, runs
//! synchronously inside that call.
//!
//! ```text
//!  lifecycle ──► sync overlay ◄── scroll / resize (re-place)
//!
//!  pointer down ──► ResizeController::begin ──► capture listeners
//!  pointer move ──► ResizeController::drag ──► place handles
//!  pointer up ────► ResizeController::release
//!                        │
//!                        ▼
//!        commit config.style ──► PositionCompactor (free)
//!                        │
//!                        ▼
//!        FlowCompactor ──► notify host ──► place handles
//! ```

use crate::config::{self, StyleUpdate};
use crate::document::{NodeId, Surface};
use crate::error::WidgetError;
use crate::host::{Host, ListenerKind};
use crate::interaction::{corner_hit, Direction, InteractionSession, Pointer, Release, ResizeController};
use crate::layout::flow::FlowCompactor;
use crate::layout::position::PositionCompactor;
use crate::options::{Activation, EngineOptions};
use crate::overlay::HandleOverlay;

/// Subscriptions held for the engine's whole life.
const AMBIENT_LISTENERS: [ListenerKind; 6] = [
    ListenerKind::Initialized,
    ListenerKind::ContentReplaced,
    ListenerKind::StructureChanged,
    ListenerKind::Removed,
    ListenerKind::Scroll,
    ListenerKind::Resize,
];

/// Subscriptions held only while a drag is active.
const CAPTURE_LISTENERS: [ListenerKind; 2] = [
    ListenerKind::PointerMoveCapture,
    ListenerKind::PointerUpCapture,
];

/// Everything the host can deliver to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// The editor finished initializing.
    Initialized,
    /// The whole content was replaced.
    ContentReplaced,
    /// The node structure changed (selection moves, edits).
    StructureChanged,
    /// The editor is going away.
    Removed,
    /// The document or an ancestor scrolled. The surface already reflects it.
    Scroll,
    /// The viewport was resized. The surface already reflects it.
    Resize,
    PointerDown(Pointer),
    PointerMove(Pointer),
    PointerUp(Pointer),
    /// Pointer capture was taken away without a pointer up.
    LostCapture,
}

pub struct Engine {
    options: EngineOptions,
    controller: ResizeController,
    overlay: HandleOverlay,
    position: PositionCompactor,
    flow: FlowCompactor,
    attached: bool,
    capturing: bool,
    last_pointer: Option<Pointer>,
}

impl Engine {
    /// Attach to a host: subscribe to lifecycle, scroll and resize events and
    /// create handles for the widgets already present. A host without a
    /// document body gets an inert engine.
    pub fn attach<H: Host + ?Sized>(host: &mut H, options: EngineOptions) -> Engine {
        let mut engine = Engine {
            options,
            controller: ResizeController::new(options.bounds()),
            overlay: HandleOverlay::new(options.handle_size),
            position: PositionCompactor {
                margin: options.compact_margin,
                step: options.compact_step,
            },
            flow: FlowCompactor {
                gap: options.stack_gap,
            },
            attached: false,
            capturing: false,
            last_pointer: None,
        };

        if host.surface().is_none() {
            tracing::warn!("{}; widget resizing disabled", WidgetError::MissingBody);
            return engine;
        }

        for kind in AMBIENT_LISTENERS {
            host.listen(kind);
        }
        engine.attached = true;
        engine.sync(host);
        engine
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn overlay(&self) -> &HandleOverlay {
        &self.overlay
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.controller.session()
    }

    /// Handle one host event. Returns whether the engine acted on it.
    pub fn dispatch<H: Host + ?Sized>(&mut self, host: &mut H, event: EngineEvent) -> bool {
        if !self.attached {
            return false;
        }
        match event {
            EngineEvent::Initialized | EngineEvent::ContentReplaced | EngineEvent::StructureChanged => {
                self.sync(host);
                true
            }
            EngineEvent::Removed => {
                self.detach(host);
                true
            }
            EngineEvent::Scroll | EngineEvent::Resize => {
                if let Some(surface) = host.surface() {
                    self.overlay.place_all(surface);
                }
                true
            }
            EngineEvent::PointerDown(p) => self.pointer_down(host, p),
            EngineEvent::PointerMove(p) => self.pointer_move(host, p),
            EngineEvent::PointerUp(p) => self.pointer_up(host, p),
            EngineEvent::LostCapture => match self.last_pointer {
                Some(p) if self.capturing => self.pointer_up(host, p),
                _ => false,
            },
        }
    }

    /// Unsubscribe from everything, drop every handle and any drag in
    /// flight. Safe to call more than once.
    pub fn detach<H: Host + ?Sized>(&mut self, host: &mut H) {
        if !self.attached {
            return;
        }
        self.controller.abandon();
        self.release_capture(host);
        for kind in AMBIENT_LISTENERS {
            host.unlisten(kind);
        }
        self.overlay.clear();
        self.attached = false;
        tracing::debug!("detached widget engine");
    }

    fn sync<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(surface) = host.surface() else {
            return;
        };
        self.overlay.sync(surface);
        let stale = self
            .controller
            .session()
            .is_some_and(|s| !surface.contains(s.widget));
        if stale {
            self.controller.abandon();
            self.release_capture(host);
        }
    }

    fn pointer_down<H: Host + ?Sized>(&mut self, host: &mut H, p: Pointer) -> bool {
        if self.controller.is_dragging() {
            return false;
        }
        let Some(surface) = host.surface() else {
            return false;
        };
        let Some((widget, direction)) = self.hit(surface, p) else {
            return false;
        };
        if !self.controller.begin(surface, widget, direction, p) {
            return false;
        }
        for kind in CAPTURE_LISTENERS {
            host.listen(kind);
        }
        self.capturing = true;
        self.last_pointer = Some(p);
        true
    }

    fn hit(&self, surface: &dyn Surface, p: Pointer) -> Option<(NodeId, Direction)> {
        match self.options.activation {
            Activation::Handles => self.overlay.hit_test(p.x, p.y),
            Activation::Corner => surface
                .widgets()
                .into_iter()
                .rev()
                .find(|&w| {
                    surface
                        .viewport_box(w)
                        .is_some_and(|r| corner_hit(&r, p.x, p.y, self.options.handle_size))
                })
                .map(|w| (w, Direction::Se)),
        }
    }

    fn pointer_move<H: Host + ?Sized>(&mut self, host: &mut H, p: Pointer) -> bool {
        if !self.capturing {
            return false;
        }
        self.last_pointer = Some(p);
        let Some(surface) = host.surface_mut() else {
            return false;
        };
        let widget = self.controller.session().map(|s| s.widget);
        match (self.controller.drag(surface, p), widget) {
            (Some(_), Some(widget)) => {
                self.overlay.place(&*surface, widget);
                true
            }
            _ => {
                // The widget went away; the gesture is over.
                if !self.controller.is_dragging() {
                    self.release_capture(host);
                }
                false
            }
        }
    }

    fn pointer_up<H: Host + ?Sized>(&mut self, host: &mut H, p: Pointer) -> bool {
        if !self.capturing {
            return false;
        }
        let released = host
            .surface_mut()
            .and_then(|surface| self.controller.release(surface, p));
        self.controller.abandon();
        self.release_capture(host);
        match released {
            Some(release) => {
                self.commit(host, release);
                true
            }
            None => false,
        }
    }

    /// Persist a finished drag, compact, notify the host and re-place
    /// handles.
    fn commit<H: Host + ?Sized>(&mut self, host: &mut H, release: Release) {
        let widget = release.widget;
        let (persisted, compacted) = {
            let Some(surface) = host.surface_mut() else {
                return;
            };
            let update = StyleUpdate {
                width: Some(release.width),
                height: Some(release.height),
                left: release.position.map(|(left, _)| left),
                top: release.position.map(|(_, top)| top),
            };
            let persisted = config::commit_style(surface, widget, &update);
            if !persisted {
                tracing::warn!(node = widget.0, "widget geometry not persisted to its config");
            }

            let moved = self.position.compact(surface, widget);
            if persisted && release.position.is_some() {
                // Compaction may have moved the widget or folded a transform
                // into its offsets; the persisted position follows.
                let inline = surface.inline_style(widget).unwrap_or_default();
                let after = StyleUpdate {
                    left: inline.left,
                    top: inline.top,
                    ..Default::default()
                };
                if after.left != update.left.map(f64::round) || after.top != update.top.map(f64::round) {
                    config::commit_style(surface, widget, &after);
                }
            }

            self.flow.compact(surface);
            self.overlay.place_all(&*surface);
            (persisted, moved)
        };

        tracing::debug!(
            node = widget.0,
            width = release.width.round(),
            height = release.height.round(),
            compacted_to = ?compacted,
            "committed widget geometry"
        );

        // Widget listeners re-read the config; the live document changed
        // either way.
        if persisted {
            if compacted.is_some() {
                host.widget_changed(widget);
            }
            host.widget_changed(widget);
        }
        host.fire_change();
        host.set_dirty(true);
        host.node_changed();
    }

    fn release_capture<H: Host + ?Sized>(&mut self, host: &mut H) {
        if !self.capturing {
            return;
        }
        for kind in CAPTURE_LISTENERS {
            host.unlisten(kind);
        }
        self.capturing = false;
        self.last_pointer = None;
    }
}
