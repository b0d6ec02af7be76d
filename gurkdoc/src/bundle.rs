//! The compiled documentation bundle: `{ "compiledHtml": toc, "start": title }`.

use crate::toc::TocNode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("invalid bundle: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid table of contents entry at {path}")]
    InvalidToc { path: String },
    #[error("compiledHtml must be an object of sections")]
    NotASectionMap,
    #[error("start page `{start}` is not a top-level page of the bundle")]
    MissingStart { start: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBundle {
    compiled_html: Value,
    start: String,
}

/// A leaf of the bundle with its section path.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSource<'a> {
    pub path: Vec<&'a str>,
    pub title: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentBundle {
    sections: Vec<(String, TocNode)>,
    start: String,
}

impl ContentBundle {
    pub fn from_json(source: &str) -> Result<Self, BundleError> {
        let raw: RawBundle = serde_json::from_str(source)?;
        let sections = match TocNode::from_json(&raw.compiled_html)? {
            TocNode::Branch(sections) => sections,
            TocNode::Leaf(_) => return Err(BundleError::NotASectionMap),
        };
        let bundle = ContentBundle {
            sections,
            start: raw.start,
        };
        bundle.start_content()?;
        Ok(bundle)
    }

    pub fn sections(&self) -> &[(String, TocNode)] {
        &self.sections
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    /// Content of the start page.
    pub fn start_content(&self) -> Result<&str, BundleError> {
        self.sections
            .iter()
            .find_map(|(title, node)| match node {
                TocNode::Leaf(content) if *title == self.start => Some(content.as_str()),
                _ => None,
            })
            .ok_or_else(|| BundleError::MissingStart {
                start: self.start.clone(),
            })
    }

    /// Every page, depth first in declaration order.
    pub fn pages(&self) -> Vec<PageSource<'_>> {
        let mut pages = Vec::new();
        for (title, node) in &self.sections {
            for (mut path, content) in node.leaves() {
                path.insert(0, title.as_str());
                let title = path.last().copied().unwrap_or_default();
                pages.push(PageSource {
                    path,
                    title,
                    content,
                });
            }
        }
        pages
    }

    /// Rewrite the content of every page.
    pub fn map_pages<F: FnMut(&str) -> String>(&mut self, mut f: F) {
        for (_, node) in &mut self.sections {
            node.map_leaves(&mut f);
        }
    }
}
