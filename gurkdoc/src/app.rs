//! The documentation viewer: a TOC, a title and a content pane.
//!
//! Selecting a page swaps the title and content first and then notifies the
//! page-switch hooks, so hooks always scan the new content.

use crate::bundle::ContentBundle;
use crate::config::SiteConfig;
use crate::dom::{Document, NodeId};
use crate::hooks::PageSwitchHooks;
use crate::layout::Layout;
use crate::page::{Action, Page};
use crate::toc::TocView;
use anyhow::Result;

/// Where the viewer renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mounts {
    pub toc: NodeId,
    pub main: NodeId,
    pub title: NodeId,
}

impl Mounts {
    /// A fresh `nav` / `h1` / `main` skeleton in `doc`'s body. The content
    /// root (`content_id`) wraps the title and content pane.
    pub fn skeleton(doc: &mut Document, content_id: &str) -> Mounts {
        let body = doc.body();
        let toc = doc.create_element("nav");
        doc.set_attr(toc, "id", "toc");
        let content = doc.create_element("div");
        doc.set_attr(content, "id", content_id);
        let title = doc.create_element("h1");
        doc.set_attr(title, "id", "title");
        let main = doc.create_element("main");
        doc.set_attr(main, "id", "main");
        doc.append_child(body, toc);
        doc.append_child(body, content);
        doc.append_child(content, title);
        doc.append_child(content, main);
        Mounts { toc, main, title }
    }
}

pub struct App {
    page: Page,
    mounts: Mounts,
    toc: TocView,
    hooks: PageSwitchHooks,
}

impl App {
    /// Render the TOC and show the bundle's start page.
    pub async fn load(
        mut doc: Document,
        mounts: Mounts,
        bundle: &ContentBundle,
        hooks: PageSwitchHooks,
        layout: Box<dyn Layout>,
        config: &SiteConfig,
    ) -> Result<App> {
        let content_root = doc.element_by_id(&config.content_root).unwrap_or_else(|| {
            tracing::debug!(id = %config.content_root, "no content root, using the main pane");
            mounts.main
        });
        let toc = TocView::render(&mut doc, bundle.sections());
        doc.append_child(mounts.toc, toc.list);

        let mut page = Page::new(doc, layout, mounts.main, content_root, config.tooltip_offset);
        for (id, leaf) in toc.leaves() {
            page.on_click(leaf.link, Action::Select(id));
        }
        for (id, branch) in toc.branches() {
            page.on_click(branch.label, Action::ToggleBranch(id));
            page.on_click(branch.toggle, Action::ToggleBranch(id));
        }

        let mut app = App {
            page,
            mounts,
            toc,
            hooks,
        };
        app.select(bundle.start(), bundle.start_content()?).await?;
        Ok(app)
    }

    /// Show a page, then run the page-switch hooks.
    pub async fn select(&mut self, title: &str, content: &str) -> Result<()> {
        tracing::debug!(page = title, "select");
        self.page.doc.set_inner_html(self.mounts.title, title);
        self.page.doc.set_inner_html(self.mounts.main, content);
        self.hooks.notify(title, &mut self.page).await
    }

    /// Dispatch a click on `node` to its listeners and those of its ancestors.
    pub async fn click(&mut self, node: NodeId) -> Result<()> {
        for action in self.page.actions_for(node) {
            match action {
                Action::Select(id) => {
                    let Some(leaf) = self.toc.leaf(id) else {
                        continue;
                    };
                    let (title, content) = (leaf.title.clone(), leaf.content.clone());
                    self.select(&title, &content).await?;
                }
                Action::ToggleBranch(id) => {
                    self.toc.toggle(&mut self.page.doc, id);
                }
                Action::ToggleTooltip(id) => {
                    let page = &mut self.page;
                    page.tooltips.toggle(&mut page.doc, id, page.layout.as_ref());
                }
            }
        }
        Ok(())
    }

    /// Viewport changed: re-anchor every tooltip.
    pub fn resize(&mut self) {
        let page = &mut self.page;
        page.tooltips.reposition_all(&mut page.doc, page.layout.as_ref());
    }

    pub fn document(&self) -> &Document {
        &self.page.doc
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn toc(&self) -> &TocView {
        &self.toc
    }

    pub fn mounts(&self) -> Mounts {
        self.mounts
    }

    pub fn title(&self) -> String {
        self.page.doc.text_content(self.mounts.title)
    }

    pub fn content_html(&self) -> String {
        self.page.doc.inner_html(self.mounts.main)
    }
}
