//! In-memory DOM: just enough of the browser model for the page passes.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Removing a subtree frees its slots for reuse. An id carries
//! the generation of its slot, so the id of a removed node never resolves
//! again, even after the slot is handed out to a new node.
//!
//! Fragment parsing and serialization go through html5ever, see [`html`].

pub mod html;

use html5ever::serialize::TraversalScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Inline style, serialized into the `style` attribute.
    pub style: Vec<(String, String)>,
}

impl Element {
    pub fn style_attr(&self) -> Option<String> {
        if self.style.is_empty() {
            return None;
        }
        let decls: Vec<String> = self
            .style
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        Some(decls.join("; "))
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a `<body>` root.
    pub fn new() -> Self {
        let mut doc = Document {
            slots: Vec::new(),
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
        };
        doc.body = doc.create_element("body");
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            style: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    /// `None` once the node has been removed.
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.node(node).map(|n| &n.kind)
    }

    pub fn is_live(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Nodes currently allocated, attached or not.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node)? {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match self.node(node) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_live(parent) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        let Some(node) = self.node_mut(child) else {
            return;
        };
        node.parent = Some(parent);
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
    }

    /// Unlink `node` from its parent; it stays allocated and can be re-attached.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != node);
        }
    }

    /// Unlink `node` and free it with all of its descendants.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    /// Free every child subtree of `node`.
    pub fn remove_children(&mut self, node: NodeId) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        for child in std::mem::take(&mut n.children) {
            self.free_subtree(child);
        }
    }

    fn free_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index as usize)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                stack.extend(node.children);
            }
        }
    }

    /// Whether `node` is reachable from the document body.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.body, node)
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.is_live(node).then_some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    // -- Attributes -----------------------------------------------------------

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(e) = self.element_mut(node) else {
            return;
        };
        if name == "style" {
            e.style = parse_style(value);
            return;
        }
        match e.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => e.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        self.attr(node, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).contains(&class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        self.set_class(node, class, true);
    }

    /// Add or remove `class` so that its presence equals `on`.
    pub fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        let mut classes: Vec<String> = self.classes(node).into_iter().map(String::from).collect();
        let present = classes.iter().any(|c| c == class);
        if on == present {
            return;
        }
        if on {
            classes.push(class.to_string());
        } else {
            classes.retain(|c| c != class);
        }
        self.set_attr(node, "class", &classes.join(" "));
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)?
            .style
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(e) = self.element_mut(node) {
            match e.style.iter_mut().find(|(k, _)| k == property) {
                Some((_, v)) => *v = value.to_string(),
                None => e.style.push((property.to_string(), value.to_string())),
            }
        }
    }

    // -- Content --------------------------------------------------------------

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            match self.kind(n) {
                Some(NodeKind::Text(t)) => out.push_str(t),
                Some(NodeKind::Element(_)) => stack.extend(self.children(n).iter().rev()),
                Some(NodeKind::Comment(_)) | None => {}
            }
        }
        out
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.remove_children(node);
        let t = self.create_text(text);
        self.append_child(node, t);
    }

    /// Replace the children of `node` with the parsed fragment.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) {
        self.remove_children(node);
        html::parse_into(self, node, html);
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let context = self.tag(node).map(html::element_name);
        html::serialize(self, node, TraversalScope::ChildrenOnly(context))
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        html::serialize(self, node, TraversalScope::IncludeNode)
    }

    // -- Queries --------------------------------------------------------------

    /// Descendants of `node` in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    pub fn elements_with_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }
}

/// Split a `style` attribute into `(property, value)` pairs.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_moves_between_parents() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let c = doc.create_element("span");
        doc.append_child(doc.body(), a);
        doc.append_child(doc.body(), b);
        doc.append_child(a, c);
        doc.append_child(b, c);
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), [c]);
        assert_eq!(doc.parent(c), Some(b));
    }

    #[test]
    fn cannot_append_an_ancestor() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner);
        doc.append_child(inner, outer);
        assert_eq!(doc.parent(outer), None);
        assert!(doc.children(inner).is_empty());
    }

    #[test]
    fn class_list_edits() {
        let mut doc = Document::new();
        let n = doc.create_element("li");
        doc.set_attr(n, "class", "a b");
        doc.add_class(n, "c");
        doc.add_class(n, "a");
        assert_eq!(doc.attr(n, "class"), Some("a b c"));
        doc.set_class(n, "b", false);
        assert_eq!(doc.classes(n), ["a", "c"]);
        assert!(!doc.has_class(n, "b"));
    }

    #[test]
    fn style_attribute_is_parsed() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attr(div, "style", "visibility: hidden; top:4px");
        assert_eq!(doc.style(div, "visibility"), Some("hidden"));
        assert_eq!(doc.style(div, "top"), Some("4px"));
    }

    #[test]
    fn serializes_style_and_escapes() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attr(div, "title", "a\"b");
        doc.set_style(div, "position", "absolute");
        doc.set_style(div, "left", "3px");
        doc.set_text(div, "1 < 2");
        assert_eq!(
            doc.outer_html(div),
            "<div title=\"a&quot;b\" style=\"position: absolute; left: 3px\">1 &lt; 2</div>"
        );
    }

    #[test]
    fn inner_html_replaces_children() {
        let mut doc = Document::new();
        let main = doc.create_element("main");
        doc.append_child(doc.body(), main);
        doc.set_inner_html(main, "<p>one</p>");
        let old = doc.children(main)[0];
        doc.set_inner_html(main, "<p>hi</p><br>");
        assert_eq!(doc.inner_html(main), "<p>hi</p><br>");
        assert!(!doc.is_attached(old));
        assert!(!doc.is_live(old));
    }

    #[test]
    fn replaced_content_is_freed() {
        let mut doc = Document::new();
        let main = doc.create_element("main");
        doc.append_child(doc.body(), main);
        doc.set_inner_html(main, "<p>a <b>b</b></p><p>c</p>");
        let settled = doc.node_count();
        for _ in 0..1000 {
            doc.set_inner_html(main, "<p>a <b>b</b></p><p>c</p>");
        }
        assert_eq!(doc.node_count(), settled);
    }

    #[test]
    fn removed_ids_stay_dead_after_slot_reuse() {
        let mut doc = Document::new();
        let old = doc.create_element("span");
        doc.append_child(doc.body(), old);
        doc.set_attr(old, "id", "old");
        doc.remove(old);

        let new = doc.create_element("em");
        doc.append_child(doc.body(), new);
        assert_ne!(old, new);
        assert_eq!(doc.tag(old), None);
        assert_eq!(doc.tag(new), Some("em"));
        assert!(!doc.is_attached(old));
        assert_eq!(doc.element_by_id("old"), None);

        doc.set_attr(old, "id", "ghost");
        assert_eq!(doc.attr(new, "id"), None);
    }

    #[test]
    fn detach_keeps_the_node() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.body(), p);
        doc.set_text(p, "kept");
        doc.detach(p);
        assert!(!doc.is_attached(p));
        assert_eq!(doc.text_content(p), "kept");
    }

    #[test]
    fn queries_in_document_order() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        doc.append_child(doc.body(), root);
        doc.set_inner_html(
            root,
            "<span class=\"x\" id=\"one\"><b class=\"x\">in</b></span><i class=\"x\">after</i>",
        );
        let found = doc.elements_with_class(root, "x");
        let tags: Vec<_> = found.iter().map(|n| doc.tag(*n).unwrap()).collect();
        assert_eq!(tags, ["span", "b", "i"]);
        assert_eq!(doc.element_by_id("one"), Some(found[0]));
        assert_eq!(doc.text_content(root), "inafter");
    }
}
