//! Standalone HTML page around a rendered viewer body.

use crate::config::MathConfig;
use crate::markup::escape_html;
use crate::math::loader_script;

/// Script the static build writes next to the pages.
pub const GRAMMAR_SCRIPT: &str = "gurklang.js";

pub fn render_page(title: &str, body_html: &str, math: &MathConfig) -> String {
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    out.push_str("<style>\n");
    out.push_str("body { font-family: system-ui, sans-serif; display: flex; margin: 0; }\n");
    out.push_str("#toc { min-width: 14em; padding: 1em; border-right: 1px solid #ddd; }\n");
    out.push_str("#content { position: relative; flex: 1; max-width: 48em; padding: 0 2em; }\n");
    out.push_str("pre { background: #f4f4f4; padding: 1em; border-radius: 5px; overflow-x: auto; }\n");
    out.push_str(".fnldoc--toc--point { list-style: none; }\n");
    out.push_str(".fnldoc--toc--toggle::before { content: \"\\25B8\"; }\n");
    out.push_str(".fnldoc--toc--toggle.--open::before { content: \"\\25BE\"; }\n");
    out.push_str(".fnldoc--toc--nested.--hidden { display: none; }\n");
    out.push_str(".gurklang--token--int { color: #1c00cf; }\n");
    out.push_str(".gurklang--token--string { color: #c41a16; }\n");
    out.push_str(".gurklang--token--atom { color: #836c28; }\n");
    out.push_str(".gurklang--token--comment { color: #007400; font-style: italic; }\n");
    out.push_str(".gurklang--meta { color: #888; }\n");
    out.push_str(".gurklang--section--good { border-left: 3px solid #4eaa25; display: block; }\n");
    out.push_str(".gurklang--section--bad { border-left: 3px solid #d33; display: block; }\n");
    out.push_str(".tooltip { position: relative; cursor: help; text-decoration: underline dotted; }\n");
    out.push_str(".tooltiptext { visibility: hidden; position: absolute; z-index: 1; width: 22em; ");
    out.push_str("background: #222; color: #eee; padding: 0.5em; border-radius: 4px; white-space: normal; }\n");
    out.push_str(".tooltip:hover > .tooltiptext { visibility: visible; }\n");
    out.push_str(".docs-tooltip-title { font-weight: bold; }\n");
    out.push_str(".docs-tooltip-stack-diagram { font-family: monospace; margin-top: 0.3em; }\n");
    out.push_str("</style>\n");
    out.push_str(&format!("<script src=\"{}\" defer></script>\n", GRAMMAR_SCRIPT));
    out.push_str(&loader_script(math, true));
    out.push_str("</head>\n<body>\n");
    out.push_str(body_html);
    out.push_str("\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_has_title_scripts_and_body() {
        let html = render_page("Boxes & co", "<main>x</main>", &MathConfig::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Boxes &amp; co</title>"));
        assert!(html.contains("<script src=\"gurklang.js\" defer></script>"));
        assert!(html.contains("window.MathJax"));
        assert!(html.contains("<body>\n<main>x</main>\n</body>"));
    }
}
