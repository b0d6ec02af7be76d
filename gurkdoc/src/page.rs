//! The live page: document, geometry, tooltips and click listeners.

use crate::dom::{Document, NodeId};
use crate::layout::Layout;
use crate::toc::{BranchId, LeafId};
use crate::tooltip::{TooltipId, TooltipSet};
use std::collections::HashMap;

/// What a click on a listened-to node does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Select(LeafId),
    ToggleBranch(BranchId),
    ToggleTooltip(TooltipId),
}

pub struct Page {
    pub doc: Document,
    pub layout: Box<dyn Layout>,
    /// Container the page content is swapped into.
    pub main: NodeId,
    /// Container tooltips are lifted into.
    pub content_root: NodeId,
    pub tooltips: TooltipSet,
    listeners: HashMap<NodeId, Vec<Action>>,
}

impl Page {
    pub fn new(
        doc: Document,
        layout: Box<dyn Layout>,
        main: NodeId,
        content_root: NodeId,
        tooltip_offset: f64,
    ) -> Self {
        Page {
            doc,
            layout,
            main,
            content_root,
            tooltips: TooltipSet::new(tooltip_offset),
            listeners: HashMap::new(),
        }
    }

    pub fn on_click(&mut self, node: NodeId, action: Action) {
        self.listeners.entry(node).or_default().push(action);
    }

    /// Actions for a click on `node`, bubbling up through its ancestors.
    pub fn actions_for(&self, node: NodeId) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(found) = self.listeners.get(&n) {
                actions.extend(found.iter().copied());
            }
            current = self.doc.parent(n);
        }
        actions
    }

    /// Drop the previous page's tooltips along with their listeners.
    pub fn clear_tooltips(&mut self) {
        self.tooltips.clear(&mut self.doc);
        self.listeners.retain(|_, actions| {
            actions.retain(|a| !matches!(a, Action::ToggleTooltip(_)));
            !actions.is_empty()
        });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}
