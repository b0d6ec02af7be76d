//! Static site build: one HTML file per page of the bundle.
//!
//! Every page goes through the same [`App`] pipeline a live viewer would run
//! (content swap, then tooltips and math), and the resulting document is
//! written out. Fenced blocks in page content are expanded first. Tooltips stay inline so they work with CSS alone.

use crate::app::{App, Mounts};
use crate::bundle::ContentBundle;
use crate::config::SiteConfig;
use crate::content::expand_blocks;
use crate::definitions::DefinitionTable;
use crate::dom::Document;
use crate::hooks::PageSwitchHooks;
use crate::layout::FixedLayout;
use crate::math::{DelimiterTypesetter, TypesetHook, Typesetter};
use crate::ready::ReadyHandle;
use crate::render::page::{render_page, GRAMMAR_SCRIPT};
use crate::tooltip::{TooltipHook, TooltipMode};
use anyhow::{Context, Result};
use gurk_syntax::{hljs, Grammar};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Write every page, `index.html` and the highlight.js grammar script into
/// `out_dir`. Returns the written paths.
pub async fn build(
    bundle: &ContentBundle,
    definitions: DefinitionTable,
    config: &SiteConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut hooks = PageSwitchHooks::new();
    hooks.register(TooltipHook::new(
        ReadyHandle::ready("definition table", definitions),
        &config.prelude,
        config.ready_timeout(),
        TooltipMode::Inline,
    ));
    let typesetter: Box<dyn Typesetter> = Box::new(DelimiterTypesetter::new(config.math.clone()));
    hooks.register(TypesetHook::new(
        ReadyHandle::ready("typesetter", typesetter),
        config.ready_timeout(),
    ));

    let mut bundle = bundle.clone();
    bundle.map_pages(|content| expand_blocks(content, &config.math));

    let mut doc = Document::new();
    let mounts = Mounts::skeleton(&mut doc, &config.content_root);
    let mut app = App::load(doc, mounts, &bundle, hooks, Box::new(FixedLayout::new()), config).await?;

    let mut taken = HashSet::new();
    let pages: Vec<_> = app
        .toc()
        .leaves()
        .map(|(_, leaf)| {
            let slug = unique(slug(&leaf.path), &mut taken);
            (leaf.link, leaf.path.clone(), leaf.title.clone(), leaf.content.clone(), slug)
        })
        .collect();
    for (link, _, _, _, slug) in &pages {
        app.page_mut().doc.set_attr(*link, "href", &format!("{}.html", slug));
    }

    let mut written = Vec::new();
    for (_, path, title, content, slug) in &pages {
        app.select(title, content)
            .await
            .with_context(|| format!("failed to render page {}", path.join(" / ")))?;
        let doc = app.document();
        let html = render_page(&app.title(), &doc.inner_html(doc.body()), &config.math);

        let mut targets = vec![out_dir.join(format!("{}.html", slug))];
        if path.len() == 1 && title == bundle.start() {
            targets.push(out_dir.join("index.html"));
        }
        for target in targets {
            fs::write(&target, &html)
                .with_context(|| format!("failed to write {}", target.display()))?;
            tracing::info!(page = %title, file = %target.display(), "wrote page");
            written.push(target);
        }
    }

    let script_path = out_dir.join(GRAMMAR_SCRIPT);
    fs::write(&script_path, grammar_script())
        .with_context(|| format!("failed to write {}", script_path.display()))?;
    written.push(script_path);
    Ok(written)
}

/// highlight.js registration for both grammars, skipped when highlight.js
/// is not loaded on the page.
pub fn grammar_script() -> String {
    format!(
        "if (typeof hljs !== \"undefined\") {{\n{}}}\n",
        hljs::registration_script(&[Grammar::plain(), Grammar::repl()])
    )
}

/// File name for a page path.
///
/// Each segment is lowercased, stripped of everything but alphanumerics,
/// spaces and hyphens, and has its spaces turned into hyphens; segments are
/// joined with `-`.
pub fn slug(path: &[String]) -> String {
    let parts: Vec<String> = path
        .iter()
        .map(|segment| {
            let mut part = String::with_capacity(segment.len());
            for c in segment.to_lowercase().chars() {
                if c.is_alphanumeric() || c == ' ' || c == '-' {
                    part.push(c);
                }
            }
            part.trim().replace(' ', "-")
        })
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        "page".to_string()
    } else {
        parts.join("-")
    }
}

fn unique(slug: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = slug.clone();
    let mut n = 2;
    while candidate == "index" || !taken.insert(candidate.clone()) {
        candidate = format!("{}-{}", slug, n);
        n += 1;
    }
    candidate
}
