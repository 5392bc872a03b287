//! # Flow-Mode Stack Compaction
//!
//! Editors leave empty paragraphs behind widgets: the caret needs somewhere
//! to go after an inserted block, and deleting text rarely deletes the `<p>`
//! it lived in. After a commit, every empty filler paragraph directly after
//! a flow widget is removed and every flow widget gets the same vertical gap.
//!
//! A filler is a `<p>` holding nothing but whitespace, no-break spaces and
//! `<br>`s. Whitespace-only text between siblings is skipped when looking
//! for fillers; the first sibling that is not a filler ends the run.

use super::is_blank;

use crate::document::{NodeId, NodeRef, Surface};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowCompactor {
    /// Top and bottom margin of every flow widget.
    pub gap: f64,
}

impl Default for FlowCompactor {
    fn default() -> Self {
        Self { gap: 8.0 }
    }
}

/// What one compaction pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowReport {
    pub removed: usize,
    pub normalized: usize,
}

impl FlowReport {
    pub fn changed(&self) -> bool {
        self.removed > 0 || self.normalized > 0
    }
}

impl FlowCompactor {
    pub fn compact<S: Surface + ?Sized>(&self, surface: &mut S) -> FlowReport {
        let mut report = FlowReport::default();
        let hosts: Vec<NodeId> = surface
            .widgets()
            .into_iter()
            .filter(|&w| !surface.position_mode(w).is_free())
            .collect();

        for &host in &hosts {
            let mut sibling = next_non_blank_sibling(&*surface, host);
            while let Some(filler) = sibling.filter(|&s| is_empty_paragraph(&*surface, s)) {
                sibling = next_non_blank_sibling(&*surface, filler);
                if surface.remove(filler) {
                    report.removed += 1;
                }
            }
        }

        for &host in &hosts {
            let Some(mut style) = surface.inline_style(host) else {
                continue;
            };
            if style.margin_top == Some(self.gap) && style.margin_bottom == Some(self.gap) {
                continue;
            }
            style.margin_top = Some(self.gap);
            style.margin_bottom = Some(self.gap);
            if surface.set_inline_style(host, style) {
                report.normalized += 1;
            }
        }

        if report.changed() {
            tracing::debug!(
                removed = report.removed,
                normalized = report.normalized,
                "compacted flow stack"
            );
        }
        report
    }
}

fn next_non_blank_sibling<S: Surface + ?Sized>(surface: &S, id: NodeId) -> Option<NodeId> {
    let mut cur = surface.next_sibling(id);
    while let Some(node) = cur {
        match surface.node(node) {
            Some(NodeRef::Text(s)) if is_blank(s) => cur = surface.next_sibling(node),
            _ => break,
        }
    }
    cur
}

/// `<p>` with only blank text and `<br>` children.
pub fn is_empty_paragraph<S: Surface + ?Sized>(surface: &S, id: NodeId) -> bool {
    match surface.node(id) {
        Some(NodeRef::Element { tag }) if tag.eq_ignore_ascii_case("p") => {}
        _ => return false,
    }
    surface.children(id).into_iter().all(|c| match surface.node(c) {
        Some(NodeRef::Text(s)) => is_blank(s),
        Some(NodeRef::Element { tag }) => tag.eq_ignore_ascii_case("br"),
        None => true,
    })
}
