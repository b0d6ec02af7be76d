//! Site configuration, assembled from an optional JSON file and CLI flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PRELUDE: &str = "prelude";
pub const DEFAULT_CONTENT_ROOT: &str = "content";
pub const DEFAULT_TOOLTIP_OFFSET: f64 = 24.0;
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;
pub const MATHJAX_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MathConfig {
    pub inline: (String, String),
    pub display: (String, String),
    pub script_url: String,
}

impl Default for MathConfig {
    fn default() -> Self {
        MathConfig {
            inline: ("$".into(), "$".into()),
            display: ("!!".into(), "!!".into()),
            script_url: MATHJAX_URL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    /// Module whose names are shown without a `module.` prefix.
    pub prelude: String,
    /// `id` of the element tooltips are reparented under.
    pub content_root: String,
    /// Vertical distance between an identifier and its tooltip, in pixels.
    pub tooltip_offset: f64,
    /// How long a page-switch hook waits for its prerequisite.
    pub ready_timeout_ms: u64,
    pub math: MathConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            prelude: DEFAULT_PRELUDE.into(),
            content_root: DEFAULT_CONTENT_ROOT.into(),
            tooltip_offset: DEFAULT_TOOLTIP_OFFSET,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
            math: MathConfig::default(),
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}
