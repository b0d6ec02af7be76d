//! Code sample renderers.

use super::Renderer;
use crate::codeblock::{dedent, render_code_block, CodeKind};
use gurk_syntax::Highlighter;

/// `gurklang--token--*` spans, the markup tooltips attach to.
pub struct TokenRenderer {
    pub kind: CodeKind,
}

impl Renderer for TokenRenderer {
    fn render(&self, source: &str) -> String {
        render_code_block(source, self.kind)
    }
}

/// highlight.js-style `hljs-*` spans, as the client-side plugin would produce.
pub struct HljsRenderer {
    pub kind: CodeKind,
}

impl Renderer for HljsRenderer {
    fn render(&self, source: &str) -> String {
        let grammar = self.kind.grammar();
        let highlighted = Highlighter::new(grammar).highlight(&dedent(source));
        format!(
            "<pre><code class=\"hljs language-{}\">{}</code></pre>",
            grammar.id(),
            highlighted.to_html()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hljs_markup() {
        let html = HljsRenderer {
            kind: CodeKind::Plain,
        }
        .render("1 dup");
        assert_eq!(
            html,
            "<pre><code class=\"hljs language-gurklang\"><span class=\"hljs-number\">1</span> <span class=\"hljs-variable\">dup</span></code></pre>"
        );
    }

    #[test]
    fn repl_hljs_uses_repl_grammar() {
        let html = HljsRenderer { kind: CodeKind::Repl }.render(">>> dup");
        assert!(html.contains("language-gurkrepl"));
        assert!(html.contains("<span class=\"hljs-meta\">&gt;&gt;&gt;"));
    }
}
