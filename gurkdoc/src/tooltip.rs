//! Tooltips for documented names in code samples.
//!
//! [`annotate`] attaches a tooltip element to every identifier token that has
//! a definition. [`TooltipSet`] then owns the tooltips of the current page:
//! it lifts them out of the inline flow, positions them against their
//! identifier and tracks which one is visible. The inline `visibility` style
//! is always a projection of [`Visibility`].

use crate::definitions::{qualified_name, Definition, DefinitionTable};
use crate::dom::{html, Document, NodeId};
use crate::hooks::{HookFuture, PageSwitchHook};
use crate::layout::Layout;
use crate::markup::{escape_html, render_explanation};
use crate::page::{Action, Page};
use crate::ready::ReadyHandle;
use std::time::Duration;

/// Class the code-block renderer puts on identifier tokens.
pub const TOKEN_NAME_CLASS: &str = "gurklang--token--name";
pub const TOOLTIP_CLASS: &str = "tooltip";
pub const TOOLTIP_TEXT_CLASS: &str = "tooltiptext";

/// A tooltip attached under its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub anchor: NodeId,
    pub tooltip: NodeId,
}

/// Markup of the tooltip for `name`, which may be bare or module-qualified.
pub fn tooltip_html(name: &str, definition: &Definition, prelude: &str) -> String {
    let bare = name
        .strip_prefix(definition.module.as_str())
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name);
    let title = qualified_name(bare, &definition.module, prelude);
    format!(
        concat!(
            "<div class=\"tooltiptext docs-tooltip\">",
            "<div class=\"docs-tooltip-title\">{}</div>",
            "<div class=\"docs-tooltip-explanation\">{}</div>",
            "<div class=\"docs-tooltip-stack-diagram\">{}</div>",
            "</div>"
        ),
        escape_html(&title),
        render_explanation(&definition.explanation),
        escape_html(&definition.stack_diagram)
    )
}

/// Attach tooltips to the identifier tokens under `root`.
///
/// Names without a definition are left untouched, as are tokens that already
/// carry a tooltip.
pub fn annotate(
    doc: &mut Document,
    root: NodeId,
    table: &DefinitionTable,
    prelude: &str,
) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    for node in doc.elements_with_class(root, TOKEN_NAME_CLASS) {
        if doc.has_class(node, TOOLTIP_CLASS) {
            continue;
        }
        let name = doc.text_content(node);
        let Some(definition) = table.lookup(&name) else {
            continue;
        };
        doc.add_class(node, TOOLTIP_CLASS);
        html::parse_into(doc, node, &tooltip_html(&name, definition, prelude));
        if let Some(&tooltip) = doc.children(node).last() {
            annotations.push(Annotation {
                anchor: node,
                tooltip,
            });
        }
    }
    annotations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

impl Visibility {
    fn css(self) -> &'static str {
        match self {
            Visibility::Hidden => "hidden",
            Visibility::Visible => "visible",
        }
    }

    fn flipped(self) -> Self {
        match self {
            Visibility::Hidden => Visibility::Visible,
            Visibility::Visible => Visibility::Hidden,
        }
    }
}

/// Index into the current page's tooltips. Ids from before a
/// [`TooltipSet::clear`] never resolve again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TooltipId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Entry {
    anchor: NodeId,
    tooltip: NodeId,
    root: NodeId,
    visibility: Visibility,
}

/// Floating tooltips of the current page.
#[derive(Debug, Clone)]
pub struct TooltipSet {
    entries: Vec<Entry>,
    offset: f64,
    generation: u32,
}

impl TooltipSet {
    /// `offset` is the vertical gap below the identifier, in pixels.
    pub fn new(offset: f64) -> Self {
        TooltipSet {
            entries: Vec::new(),
            offset,
            generation: 0,
        }
    }

    fn id(&self, index: usize) -> TooltipId {
        TooltipId {
            index,
            generation: self.generation,
        }
    }

    fn entry(&self, id: TooltipId) -> Option<&Entry> {
        if id.generation != self.generation {
            return None;
        }
        self.entries.get(id.index)
    }

    /// Move each tooltip under `root`, position it and hide it.
    pub fn activate(
        &mut self,
        doc: &mut Document,
        annotations: &[Annotation],
        root: NodeId,
        layout: &dyn Layout,
    ) -> Vec<TooltipId> {
        let mut ids = Vec::with_capacity(annotations.len());
        for a in annotations {
            doc.append_child(root, a.tooltip);
            doc.set_style(a.tooltip, "position", "absolute");
            let entry = Entry {
                anchor: a.anchor,
                tooltip: a.tooltip,
                root,
                visibility: Visibility::Hidden,
            };
            self.position(doc, &entry, layout);
            project(doc, &entry);
            self.entries.push(entry);
            ids.push(self.id(self.entries.len() - 1));
        }
        ids
    }

    /// Flip `id`, hiding every other tooltip first.
    pub fn toggle(&mut self, doc: &mut Document, id: TooltipId, layout: &dyn Layout) -> Visibility {
        let Some(target) = self.entry(id).cloned() else {
            return Visibility::Hidden;
        };
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if i != id.index {
                entry.visibility = Visibility::Hidden;
                project(doc, entry);
            }
        }
        self.position(doc, &target, layout);
        let entry = &mut self.entries[id.index];
        entry.visibility = entry.visibility.flipped();
        project(doc, entry);
        entry.visibility
    }

    /// Re-anchor every tooltip, e.g. after the viewport was resized.
    pub fn reposition_all(&self, doc: &mut Document, layout: &dyn Layout) {
        for entry in &self.entries {
            if doc.is_attached(entry.anchor) {
                self.position(doc, entry, layout);
            }
        }
    }

    /// Remove every tooltip from the document and forget them.
    pub fn clear(&mut self, doc: &mut Document) {
        for entry in self.entries.drain(..) {
            doc.remove(entry.tooltip);
        }
        self.generation = self.generation.wrapping_add(1);
    }

    fn position(&self, doc: &mut Document, entry: &Entry, layout: &dyn Layout) {
        let anchor = layout.bounding_rect(doc, entry.anchor);
        let root = layout.bounding_rect(doc, entry.root);
        let scroll = layout.scroll_top(doc, entry.root);
        let left = anchor.left - root.left;
        let top = anchor.top - root.top + scroll + self.offset;
        doc.set_style(entry.tooltip, "left", &format!("{}px", left));
        doc.set_style(entry.tooltip, "top", &format!("{}px", top));
    }

    pub fn visibility(&self, id: TooltipId) -> Option<Visibility> {
        self.entry(id).map(|e| e.visibility)
    }

    pub fn visible(&self) -> Vec<TooltipId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.visibility == Visibility::Visible)
            .map(|(i, _)| self.id(i))
            .collect()
    }

    pub fn anchor(&self, id: TooltipId) -> Option<NodeId> {
        self.entry(id).map(|e| e.anchor)
    }

    pub fn tooltip(&self, id: TooltipId) -> Option<NodeId> {
        self.entry(id).map(|e| e.tooltip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn project(doc: &mut Document, entry: &Entry) {
    doc.set_style(entry.tooltip, "visibility", entry.visibility.css());
}

// -- Page-switch hook ---------------------------------------------------------

/// Where tooltips end up after annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipMode {
    /// Left inside their identifier; shown by CSS hover.
    Inline,
    /// Lifted to the content root and toggled by clicks.
    Floating,
}

/// Re-annotates the content pane after every page switch.
pub struct TooltipHook {
    definitions: ReadyHandle<DefinitionTable>,
    prelude: String,
    timeout: Duration,
    mode: TooltipMode,
}

impl TooltipHook {
    pub fn new(
        definitions: ReadyHandle<DefinitionTable>,
        prelude: &str,
        timeout: Duration,
        mode: TooltipMode,
    ) -> Self {
        TooltipHook {
            definitions,
            prelude: prelude.to_string(),
            timeout,
            mode,
        }
    }
}

impl PageSwitchHook for TooltipHook {
    fn name(&self) -> &str {
        "tooltips"
    }

    fn on_page_switch<'a>(&'a mut self, title: &'a str, page: &'a mut Page) -> HookFuture<'a> {
        Box::pin(async move {
            let table = self.definitions.wait(self.timeout).await?;
            page.clear_tooltips();
            let annotations = annotate(&mut page.doc, page.main, &table, &self.prelude);
            if self.mode == TooltipMode::Floating {
                let ids = page.tooltips.activate(
                    &mut page.doc,
                    &annotations,
                    page.content_root,
                    page.layout.as_ref(),
                );
                for id in ids {
                    if let Some(anchor) = page.tooltips.anchor(id) {
                        page.on_click(anchor, Action::ToggleTooltip(id));
                    }
                }
            }
            tracing::info!(page = title, tooltips = annotations.len(), "attached tooltips");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FixedLayout, Rect};

    fn code(doc: &mut Document, html: &str) -> NodeId {
        let root = doc.create_element("div");
        doc.append_child(doc.body(), root);
        doc.set_inner_html(root, html);
        root
    }

    fn token(name: &str) -> String {
        format!(
            "<span class=\"gurklang--token gurklang--token--name\">{}</span>",
            escape_html(name)
        )
    }

    #[test]
    fn tooltip_markup_for_prelude_and_module_names() {
        let table = DefinitionTable::builtin();
        let html = tooltip_html("dup", table.lookup("dup").unwrap(), "prelude");
        assert!(html.contains("<div class=\"docs-tooltip-title\">dup</div>"));
        assert!(html.contains("(a -- a a)"));

        let html = tooltip_html("<-", table.lookup("<-").unwrap(), "prelude");
        assert!(html.contains("<div class=\"docs-tooltip-title\">boxes.&lt;-</div>"));
        assert!(html.contains("(box[T] T --)"));
    }

    fn title_of(doc: &Document, annotation: &Annotation) -> String {
        let title = doc.elements_with_class(annotation.tooltip, "docs-tooltip-title")[0];
        doc.text_content(title)
    }

    #[test]
    fn qualified_tokens_keep_a_single_module_prefix() {
        let table = DefinitionTable::builtin();
        let mut doc = Document::new();
        let html = [token("boxes.<-"), token("prelude.dup"), token("<-")].join(" ");
        let root = code(&mut doc, &html);
        let found = annotate(&mut doc, root, &table, "prelude");
        let titles: Vec<String> = found.iter().map(|a| title_of(&doc, a)).collect();
        assert_eq!(titles, ["boxes.<-", "dup", "boxes.<-"]);
    }

    #[test]
    fn explanation_markup_expanded_after_escaping() {
        let table = DefinitionTable::builtin();
        let html = tooltip_html("-!>", table.lookup("-!>").unwrap(), "prelude");
        assert!(html.contains("<i>at the current transaction level</i>"));
        let html = tooltip_html("unrot", table.lookup("unrot").unwrap(), "prelude");
        assert!(html.contains("inverse of <tt>rot</tt>"));
    }

    #[test]
    fn hostile_definition_text_is_escaped() {
        let mut table = DefinitionTable::new();
        table.insert(
            "x",
            Definition {
                module: "evil".into(),
                explanation: "<script>alert(1)</script>".into(),
                stack_diagram: "(a -- <b>)".into(),
            },
        );
        let mut doc = Document::new();
        let root = code(&mut doc, &token("x"));
        let found = annotate(&mut doc, root, &table, "prelude");
        let html = doc.outer_html(found[0].tooltip);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("(a -- &lt;b&gt;)"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn unknown_names_are_left_alone() {
        let table = DefinitionTable::builtin();
        let mut doc = Document::new();
        let html = token("frobnicate");
        let root = code(&mut doc, &html);
        let found = annotate(&mut doc, root, &table, "prelude");
        assert!(found.is_empty());
        assert_eq!(doc.inner_html(root), html);
    }

    #[test]
    fn known_names_get_a_tooltip_child() {
        let table = DefinitionTable::builtin();
        let mut doc = Document::new();
        let root = code(&mut doc, &format!("{} {}", token("dup"), token("<-")));
        let found = annotate(&mut doc, root, &table, "prelude");
        assert_eq!(found.len(), 2);
        for a in &found {
            assert!(doc.has_class(a.anchor, TOOLTIP_CLASS));
            assert_eq!(doc.parent(a.tooltip), Some(a.anchor));
            assert!(doc.has_class(a.tooltip, TOOLTIP_TEXT_CLASS));
        }
    }

    #[test]
    fn annotating_twice_adds_nothing() {
        let table = DefinitionTable::builtin();
        let mut doc = Document::new();
        let root = code(&mut doc, &token("dup"));
        assert_eq!(annotate(&mut doc, root, &table, "prelude").len(), 1);
        assert!(annotate(&mut doc, root, &table, "prelude").is_empty());
    }

    fn floating(doc: &mut Document, layout: &FixedLayout) -> (TooltipSet, Vec<TooltipId>, NodeId) {
        let table = DefinitionTable::builtin();
        let content = code(doc, &format!("{} {}", token("dup"), token("drop")));
        let found = annotate(doc, content, &table, "prelude");
        let mut set = TooltipSet::new(24.0);
        let ids = set.activate(doc, &found, content, layout);
        (set, ids, content)
    }

    #[test]
    fn activation_reparents_and_hides() {
        let mut doc = Document::new();
        let (set, ids, content) = floating(&mut doc, &FixedLayout::new());
        assert_eq!(ids.len(), 2);
        for id in &ids {
            let tooltip = set.tooltip(*id).unwrap();
            assert_eq!(doc.parent(tooltip), Some(content));
            assert_eq!(doc.style(tooltip, "position"), Some("absolute"));
            assert_eq!(doc.style(tooltip, "visibility"), Some("hidden"));
        }
        assert!(set.visible().is_empty());
    }

    #[test]
    fn at_most_one_visible() {
        let mut doc = Document::new();
        let layout = FixedLayout::new();
        let (mut set, ids, _) = floating(&mut doc, &layout);
        let (first, second) = (ids[0], ids[1]);

        set.toggle(&mut doc, first, &layout);
        assert_eq!(set.visible(), [first]);

        set.toggle(&mut doc, second, &layout);
        assert_eq!(set.visible(), [second]);
        assert_eq!(
            doc.style(set.tooltip(first).unwrap(), "visibility"),
            Some("hidden")
        );

        assert_eq!(set.toggle(&mut doc, second, &layout), Visibility::Hidden);
        assert!(set.visible().is_empty());
    }

    #[test]
    fn position_follows_anchor_relative_to_root() {
        let mut doc = Document::new();
        let mut layout = FixedLayout::new();
        let (mut set, ids, content) = floating(&mut doc, &layout);
        let anchor = set.anchor(ids[0]).unwrap();
        let tooltip = set.tooltip(ids[0]).unwrap();

        layout.place(content, Rect::new(100.0, 50.0, 600.0, 400.0));
        layout.place(anchor, Rect::new(140.0, 90.0, 30.0, 16.0));
        layout.scroll(content, 10.0);
        set.reposition_all(&mut doc, &layout);
        assert_eq!(doc.style(tooltip, "left"), Some("40px"));
        assert_eq!(doc.style(tooltip, "top"), Some("74px"));

        layout.place(anchor, Rect::new(120.5, 60.0, 30.0, 16.0));
        set.toggle(&mut doc, ids[0], &layout);
        assert_eq!(doc.style(tooltip, "left"), Some("20.5px"));
        assert_eq!(doc.style(tooltip, "top"), Some("44px"));
    }

    #[test]
    fn clear_removes_previous_tooltips() {
        let mut doc = Document::new();
        let (mut set, ids, _) = floating(&mut doc, &FixedLayout::new());
        let tooltip = set.tooltip(ids[0]).unwrap();
        set.clear(&mut doc);
        assert!(set.is_empty());
        assert!(!doc.is_attached(tooltip));
        assert!(!doc.is_live(tooltip));
    }

    #[test]
    fn ids_from_a_previous_page_do_not_resolve() {
        let mut doc = Document::new();
        let layout = FixedLayout::new();
        let (mut set, old, _) = floating(&mut doc, &layout);
        set.clear(&mut doc);

        let table = DefinitionTable::builtin();
        let content = code(&mut doc, &format!("{} {}", token("rot"), token("unrot")));
        let found = annotate(&mut doc, content, &table, "prelude");
        let new = set.activate(&mut doc, &found, content, &layout);
        assert_eq!(new.len(), 2);

        assert_ne!(old[0], new[0]);
        assert_eq!(set.anchor(old[0]), None);
        assert_eq!(set.visibility(old[0]), None);
        assert_eq!(set.toggle(&mut doc, old[0], &layout), Visibility::Hidden);
        assert!(set.visible().is_empty());
        assert_eq!(set.anchor(new[0]), Some(found[0].anchor));
    }
}
