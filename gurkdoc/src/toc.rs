//! Table of contents: the nested section map and its collapsible list view.

use crate::bundle::BundleError;
use crate::dom::{Document, NodeId};
use serde_json::Value;

const POINT_CLASS: &str = "fnldoc--toc--point";
const LEAF_CLASS: &str = "fnldoc--toc--leaf";
const NODE_CLASS: &str = "fnldoc--toc--node";
const LABEL_CLASS: &str = "fnldoc--toc--branch-label";
const TOGGLE_CLASS: &str = "fnldoc--toc--toggle";
const TOGGLE_OPEN_CLASS: &str = "--open";
const NESTED_CLASS: &str = "fnldoc--toc--nested";
const NESTED_HIDDEN_CLASS: &str = "--hidden";

/// A leaf holds pre-rendered page HTML; a branch maps section titles to
/// children in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum TocNode {
    Leaf(String),
    Branch(Vec<(String, TocNode)>),
}

impl TocNode {
    pub fn from_json(value: &Value) -> Result<TocNode, BundleError> {
        from_json_at(value, &mut Vec::new())
    }

    /// Direct child named `title`, if this is a branch.
    pub fn get(&self, title: &str) -> Option<&TocNode> {
        match self {
            TocNode::Leaf(_) => None,
            TocNode::Branch(children) => children
                .iter()
                .find(|(t, _)| t == title)
                .map(|(_, node)| node),
        }
    }

    /// Every leaf as `(path, content)`, depth first in declaration order.
    /// The last path segment is the leaf's title.
    pub fn leaves(&self) -> Vec<(Vec<&str>, &str)> {
        let mut out = Vec::new();
        collect_leaves(self, &mut Vec::new(), &mut out);
        out
    }

    /// Replace every leaf's content with `f(content)`.
    pub fn map_leaves<F: FnMut(&str) -> String>(&mut self, f: &mut F) {
        match self {
            TocNode::Leaf(content) => *content = f(content.as_str()),
            TocNode::Branch(children) => {
                for (_, child) in children {
                    child.map_leaves(f);
                }
            }
        }
    }
}

fn from_json_at(value: &Value, path: &mut Vec<String>) -> Result<TocNode, BundleError> {
    match value {
        Value::String(html) => Ok(TocNode::Leaf(html.clone())),
        Value::Object(map) => {
            let mut children = Vec::with_capacity(map.len());
            for (title, child) in map {
                path.push(title.clone());
                children.push((title.clone(), from_json_at(child, path)?));
                path.pop();
            }
            Ok(TocNode::Branch(children))
        }
        _ => Err(BundleError::InvalidToc {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path.join(" / ")
            },
        }),
    }
}

fn collect_leaves<'a>(node: &'a TocNode, path: &mut Vec<&'a str>, out: &mut Vec<(Vec<&'a str>, &'a str)>) {
    match node {
        TocNode::Leaf(content) => out.push((path.clone(), content)),
        TocNode::Branch(children) => {
            for (title, child) in children {
                path.push(title);
                collect_leaves(child, path, out);
                path.pop();
            }
        }
    }
}

// -- View ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchId(usize);

impl LeafId {
    pub(crate) fn new(index: usize) -> Self {
        LeafId(index)
    }
}

impl BranchId {
    pub(crate) fn new(index: usize) -> Self {
        BranchId(index)
    }
}

#[derive(Debug, Clone)]
pub struct TocLeaf {
    pub path: Vec<String>,
    pub title: String,
    pub content: String,
    pub link: NodeId,
}

#[derive(Debug, Clone)]
pub struct TocBranch {
    pub title: String,
    pub label: NodeId,
    pub toggle: NodeId,
    pub nested: NodeId,
    pub state: BranchState,
}

/// The rendered list plus the state of every branch.
#[derive(Debug, Clone)]
pub struct TocView {
    pub list: NodeId,
    leaves: Vec<TocLeaf>,
    branches: Vec<TocBranch>,
}

impl TocView {
    /// Build the list for `entries`. Branches start collapsed. The list is
    /// created detached; the caller mounts it.
    pub fn render(doc: &mut Document, entries: &[(String, TocNode)]) -> TocView {
        let mut view = TocView {
            list: doc.create_element("ul"),
            leaves: Vec::new(),
            branches: Vec::new(),
        };
        let list = view.list;
        view.render_into(doc, list, entries, &mut Vec::new());
        tracing::debug!(
            leaves = view.leaves.len(),
            branches = view.branches.len(),
            "rendered table of contents"
        );
        view
    }

    fn render_into(
        &mut self,
        doc: &mut Document,
        list: NodeId,
        entries: &[(String, TocNode)],
        path: &mut Vec<String>,
    ) {
        for (title, node) in entries {
            path.push(title.clone());
            let item = doc.create_element("li");
            doc.add_class(item, POINT_CLASS);
            doc.append_child(list, item);
            match node {
                TocNode::Leaf(content) => {
                    doc.add_class(item, LEAF_CLASS);
                    let link = doc.create_element("a");
                    doc.set_attr(link, "href", "#");
                    doc.set_text(link, title);
                    doc.append_child(item, link);
                    self.leaves.push(TocLeaf {
                        path: path.clone(),
                        title: title.clone(),
                        content: content.clone(),
                        link,
                    });
                }
                TocNode::Branch(children) => {
                    doc.add_class(item, NODE_CLASS);
                    let label = doc.create_element("span");
                    doc.add_class(label, LABEL_CLASS);
                    doc.set_text(label, &format!("{} ", title));
                    let toggle = doc.create_element("button");
                    doc.add_class(toggle, TOGGLE_CLASS);
                    let nested = doc.create_element("nav");
                    doc.add_class(nested, NESTED_CLASS);
                    let sublist = doc.create_element("ul");
                    doc.append_child(nested, sublist);
                    for child in [label, toggle, nested] {
                        doc.append_child(item, child);
                    }
                    let branch = TocBranch {
                        title: title.clone(),
                        label,
                        toggle,
                        nested,
                        state: BranchState::Collapsed,
                    };
                    project(doc, &branch);
                    self.branches.push(branch);
                    self.render_into(doc, sublist, children, path);
                }
            }
            path.pop();
        }
    }

    /// Flip a branch and return its new state.
    pub fn toggle(&mut self, doc: &mut Document, id: BranchId) -> BranchState {
        let Some(branch) = self.branches.get_mut(id.0) else {
            return BranchState::Collapsed;
        };
        branch.state = match branch.state {
            BranchState::Collapsed => BranchState::Expanded,
            BranchState::Expanded => BranchState::Collapsed,
        };
        project(doc, branch);
        branch.state
    }

    pub fn leaf(&self, id: LeafId) -> Option<&TocLeaf> {
        self.leaves.get(id.0)
    }

    pub fn branch(&self, id: BranchId) -> Option<&TocBranch> {
        self.branches.get(id.0)
    }

    pub fn leaves(&self) -> impl Iterator<Item = (LeafId, &TocLeaf)> {
        self.leaves.iter().enumerate().map(|(i, l)| (LeafId(i), l))
    }

    pub fn branches(&self) -> impl Iterator<Item = (BranchId, &TocBranch)> {
        self.branches.iter().enumerate().map(|(i, b)| (BranchId(i), b))
    }

    /// First leaf titled `title`, in render order.
    pub fn find_leaf(&self, title: &str) -> Option<LeafId> {
        self.leaves().find(|(_, l)| l.title == title).map(|(id, _)| id)
    }
}

fn project(doc: &mut Document, branch: &TocBranch) {
    let open = branch.state == BranchState::Expanded;
    doc.set_class(branch.toggle, TOGGLE_OPEN_CLASS, open);
    doc.set_class(branch.nested, NESTED_HIDDEN_CLASS, !open);
}
