//! Geometry seam for tooltip placement.

use crate::dom::{Document, NodeId};
use std::collections::HashMap;

/// Viewport-relative box, as returned by `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }
}

pub trait Layout {
    fn bounding_rect(&self, doc: &Document, node: NodeId) -> Rect;
    fn scroll_top(&self, doc: &Document, node: NodeId) -> f64;
}

/// Layout with explicitly assigned boxes; unknown nodes sit at the origin.
#[derive(Debug, Clone, Default)]
pub struct FixedLayout {
    rects: HashMap<NodeId, Rect>,
    scroll: HashMap<NodeId, f64>,
}

impl FixedLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, node: NodeId, rect: Rect) {
        self.rects.insert(node, rect);
    }

    pub fn scroll(&mut self, node: NodeId, top: f64) {
        self.scroll.insert(node, top);
    }
}

impl Layout for FixedLayout {
    fn bounding_rect(&self, _doc: &Document, node: NodeId) -> Rect {
        self.rects.get(&node).copied().unwrap_or_default()
    }

    fn scroll_top(&self, _doc: &Document, node: NodeId) -> f64 {
        self.scroll.get(&node).copied().unwrap_or(0.0)
    }
}
