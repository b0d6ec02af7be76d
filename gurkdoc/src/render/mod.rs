//! Renderers: trait-based format dispatch for code samples, plus the page
//! shell used by the static build.

pub mod code;
pub mod page;

use crate::codeblock::CodeKind;
use anyhow::{anyhow, Result};

/// Renders a Gurklang code sample into HTML.
pub trait Renderer {
    fn render(&self, source: &str) -> String;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str, kind: CodeKind) -> Result<Box<dyn Renderer>> {
    match format {
        "code" | "tokens" => Ok(Box::new(code::TokenRenderer { kind })),
        "hljs" => Ok(Box::new(code::HljsRenderer { kind })),
        _ => Err(anyhow!("unknown format: {}. Use code or hljs", format)),
    }
}
