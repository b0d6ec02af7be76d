//! Math typesetting: the MathJax loader for built pages and a server-side
//! typesetter that resolves `math-inline` / `math-display` elements.

use crate::config::MathConfig;
use crate::dom::{Document, NodeId};
use crate::hooks::{HookFuture, PageSwitchHook};
use crate::markup::escape_html;
use crate::page::Page;
use crate::ready::ReadyHandle;
use anyhow::Result;
use serde_json::json;
use std::time::Duration;

pub const INLINE_CLASS: &str = "math-inline";
pub const DISPLAY_CLASS: &str = "math-display";

pub trait Typesetter {
    /// Typeset the formulas under `root`, returning how many were handled.
    fn typeset(&self, doc: &mut Document, root: NodeId) -> Result<usize>;
}

/// Marks each math element whose text is wrapped in the configured
/// delimiters with `data-math` and the bare TeX in `data-tex`.
pub struct DelimiterTypesetter {
    config: MathConfig,
}

impl DelimiterTypesetter {
    pub fn new(config: MathConfig) -> Self {
        DelimiterTypesetter { config }
    }
}

impl Typesetter for DelimiterTypesetter {
    fn typeset(&self, doc: &mut Document, root: NodeId) -> Result<usize> {
        let mut count = 0;
        for (class, kind, (open, close)) in [
            (INLINE_CLASS, "inline", &self.config.inline),
            (DISPLAY_CLASS, "display", &self.config.display),
        ] {
            for node in doc.elements_with_class(root, class) {
                let text = doc.text_content(node);
                let Some(tex) = strip_delimiters(text.trim(), open, close) else {
                    tracing::debug!(text = %text, "math element without delimiters");
                    continue;
                };
                doc.set_attr(node, "data-math", kind);
                doc.set_attr(node, "data-tex", tex);
                count += 1;
            }
        }
        Ok(count)
    }
}

fn strip_delimiters<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    if text.len() < open.len() + close.len() {
        return None;
    }
    text.strip_prefix(open)?.strip_suffix(close)
}

/// `<script>` tags that configure and load MathJax.
///
/// With `startup` false MathJax waits for an explicit `MathJax.typeset()`,
/// which is what a page-switching client wants.
pub fn loader_script(config: &MathConfig, startup: bool) -> String {
    let options = json!({
        "startup": { "typeset": startup },
        "tex": {
            "inlineMath": [[config.inline.0, config.inline.1]],
            "displayMath": [[config.display.0, config.display.1]],
            "processEscapes": true,
        },
        "options": {
            "processHtmlClass": format!("{}|{}", INLINE_CLASS, DISPLAY_CLASS),
        },
    });
    format!(
        "<script>window.MathJax = {};</script>\n<script id=\"MathJax-script\" async src=\"{}\"></script>\n",
        options.to_string().replace("</", "<\\/"),
        escape_html(&config.script_url)
    )
}

/// Runs the typesetter over the content pane after every page switch.
pub struct TypesetHook {
    typesetter: ReadyHandle<Box<dyn Typesetter>>,
    timeout: Duration,
}

impl TypesetHook {
    pub fn new(typesetter: ReadyHandle<Box<dyn Typesetter>>, timeout: Duration) -> Self {
        TypesetHook {
            typesetter,
            timeout,
        }
    }
}

impl PageSwitchHook for TypesetHook {
    fn name(&self) -> &str {
        "math"
    }

    fn on_page_switch<'a>(&'a mut self, title: &'a str, page: &'a mut Page) -> HookFuture<'a> {
        Box::pin(async move {
            let typesetter = self.typesetter.wait(self.timeout).await?;
            let count = typesetter.typeset(&mut page.doc, page.main)?;
            tracing::info!(page = title, formulas = count, "typeset math");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FixedLayout;
    use crate::markup::math_display;
    use crate::ready::Ready;

    #[test]
    fn marks_delimited_formulas() {
        let mut doc = Document::new();
        let root = doc.body();
        let html = format!(
            "<p><span class=\"math-inline\">$x^2$</span> and</p>{}<span class=\"math-inline\">no delimiters</span>",
            math_display("\\sum_i i", ("!!", "!!"))
        );
        doc.set_inner_html(root, &html);
        let count = DelimiterTypesetter::new(MathConfig::default())
            .typeset(&mut doc, root)
            .unwrap();
        assert_eq!(count, 2);
        let inline = doc.elements_with_class(root, INLINE_CLASS)[0];
        assert_eq!(doc.attr(inline, "data-math"), Some("inline"));
        assert_eq!(doc.attr(inline, "data-tex"), Some("x^2"));
        let display = doc.elements_with_class(root, DISPLAY_CLASS)[0];
        assert_eq!(doc.attr(display, "data-tex"), Some("\\sum_i i"));
    }

    #[test]
    fn lone_delimiter_is_not_a_formula() {
        assert_eq!(strip_delimiters("$", "$", "$"), None);
        assert_eq!(strip_delimiters("$$", "$", "$"), Some(""));
    }

    #[test]
    fn loader_carries_delimiters() {
        let script = loader_script(&MathConfig::default(), false);
        assert!(script.contains(r#""inlineMath":[["$","$"]]"#), "{}", script);
        assert!(script.contains(r#""displayMath":[["!!","!!"]]"#));
        assert!(script.contains(r#""typeset":false"#));
        assert!(script.contains("mathjax@3"));
    }

    #[tokio::test]
    async fn hook_fails_when_typesetter_never_loads() {
        let ready: Ready<Box<dyn Typesetter>> = Ready::new("MathJax");
        let mut hook = TypesetHook::new(ready.handle(), Duration::from_millis(10));
        let doc = Document::new();
        let body = doc.body();
        let mut page = Page::new(doc, Box::new(FixedLayout::new()), body, body, 24.0);
        let err = hook.on_page_switch("Intro", &mut page).await.unwrap_err();
        assert!(err.to_string().contains("waiting for MathJax"), "{}", err);
    }
}
