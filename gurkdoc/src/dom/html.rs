//! HTML fragments in and out of the arena.
//!
//! Parsing runs html5ever's fragment algorithm (the one behind `innerHTML`)
//! into an `RcDom` and copies the result into the [`Document`]. Serialization
//! feeds the arena to html5ever's serializer, which owns escaping, void
//! elements and raw-text elements.

use super::{Document, NodeId, NodeKind};
use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{ns, parse_fragment, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::io;

pub fn element_name(tag: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(tag))
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(name))
}

/// Parse `html` as the content of a `<body>` and append the nodes to `parent`.
pub fn parse_into(doc: &mut Document, parent: NodeId, html: &str) {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        element_name("body"),
        Vec::new(),
        false,
    )
    .one(html);

    // The fragment lands under a synthetic <html> root.
    let document = dom.document.children.borrow();
    let Some(root) = document.first() else {
        return;
    };
    for child in root.children.borrow().iter() {
        import(doc, parent, child);
    }
}

fn import(doc: &mut Document, parent: NodeId, handle: &Handle) {
    match &handle.data {
        NodeData::Text { contents } => {
            let text = doc.create_text(&contents.borrow());
            doc.append_child(parent, text);
        }
        NodeData::Comment { contents } => {
            let comment = doc.create_comment(contents);
            doc.append_child(parent, comment);
        }
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let element = doc.create_element(&name.local);
            for attr in attrs.borrow().iter() {
                doc.set_attr(element, &attr.name.local, &attr.value);
            }
            doc.append_child(parent, element);
            for child in handle.children.borrow().iter() {
                import(doc, element, child);
            }
            if let Some(contents) = template_contents.borrow().as_ref() {
                for child in contents.children.borrow().iter() {
                    import(doc, element, child);
                }
            }
        }
        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
}

/// Markup of `node` (`IncludeNode`) or of its children (`ChildrenOnly`).
pub fn serialize(doc: &Document, node: NodeId, traversal_scope: TraversalScope) -> String {
    let mut out = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };
    if let Err(err) = html5ever::serialize(&mut out, &Subtree { doc, node }, opts) {
        tracing::warn!(%err, "html serialization stopped early");
    }
    String::from_utf8_lossy(&out).into_owned()
}

struct Subtree<'a> {
    doc: &'a Document,
    node: NodeId,
}

impl Serialize for Subtree<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        match traversal_scope {
            TraversalScope::IncludeNode => write_node(self.doc, self.node, serializer),
            TraversalScope::ChildrenOnly(_) => {
                for child in self.doc.children(self.node) {
                    write_node(self.doc, *child, serializer)?;
                }
                Ok(())
            }
        }
    }
}

fn write_node<S: Serializer>(doc: &Document, node: NodeId, serializer: &mut S) -> io::Result<()> {
    match doc.kind(node) {
        Some(NodeKind::Text(text)) => serializer.write_text(text),
        Some(NodeKind::Comment(text)) => serializer.write_comment(text),
        Some(NodeKind::Element(element)) => {
            let name = element_name(&element.tag);
            let mut attrs: Vec<(QualName, String)> = element
                .attrs
                .iter()
                .map(|(k, v)| (attribute_name(k), v.clone()))
                .collect();
            if let Some(style) = element.style_attr() {
                attrs.push((attribute_name("style"), style));
            }
            serializer.start_elem(name.clone(), attrs.iter().map(|(k, v)| (k, v.as_str())))?;
            for child in doc.children(node) {
                write_node(doc, *child, serializer)?;
            }
            serializer.end_elem(name)
        }
        None => Ok(()),
    }
}
