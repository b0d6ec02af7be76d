//! Fenced source blocks inside page content.
//!
//! A compiled page may still carry blocks fenced by lines of their own:
//!
//! - `%%%gurk` and `%%%gurkrepl` become highlighted code blocks
//! - `%%%math` becomes a display formula
//! - `%%%adm <name>` becomes an admonition box titled after `name`; its body
//!   is expanded in turn
//!
//! Every block is closed by a line of three or more `%`. Fence bodies are
//! HTML text and get unescaped before they are rendered.

use crate::codeblock::{render_code_block, CodeKind};
use crate::config::MathConfig;
use crate::markup::{escape_html, math_display, unescape_html};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fence {
    Code(CodeKind),
    Math,
    Admonition(String),
}

fn opening(line: &str) -> Option<Fence> {
    let rest = line.trim().strip_prefix("%%%")?.trim_start_matches('%');
    let mut words = rest.split_whitespace();
    match words.next()? {
        "gurk" => Some(Fence::Code(CodeKind::Plain)),
        "gurkrepl" => Some(Fence::Code(CodeKind::Repl)),
        "math" => Some(Fence::Math),
        "adm" => words.next().map(|name| Fence::Admonition(name.to_string())),
        _ => None,
    }
}

fn is_closing(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '%')
}

/// Replace every fenced block in `html` with its rendered markup.
/// Unterminated blocks are left as they are.
pub fn expand_blocks(html: &str, math: &MathConfig) -> String {
    let lines: Vec<&str> = html.lines().collect();
    let mut out = Vec::with_capacity(lines.len());
    expand_lines(&lines, math, &mut out);
    out.join("\n")
}

fn expand_lines(lines: &[&str], math: &MathConfig, out: &mut Vec<String>) {
    let mut i = 0;
    while i < lines.len() {
        let Some(fence) = opening(lines[i]) else {
            out.push(lines[i].to_string());
            i += 1;
            continue;
        };
        let Some(len) = block_len(&lines[i + 1..]) else {
            tracing::warn!(line = i + 1, "unterminated %%% block");
            out.extend(lines[i..].iter().map(|l| l.to_string()));
            return;
        };
        out.push(render(&fence, &lines[i + 1..i + 1 + len], math));
        i += len + 2;
    }
}

/// Number of body lines before the matching closer, skipping nested blocks.
fn block_len(lines: &[&str]) -> Option<usize> {
    let mut depth = 0usize;
    for (n, line) in lines.iter().enumerate() {
        if opening(line).is_some() {
            depth += 1;
        } else if is_closing(line) {
            if depth == 0 {
                return Some(n);
            }
            depth -= 1;
        }
    }
    None
}

fn render(fence: &Fence, body: &[&str], math: &MathConfig) -> String {
    match fence {
        Fence::Code(kind) => render_code_block(&unescape_html(&body.join("\n")), *kind),
        Fence::Math => {
            let tex = unescape_html(&body.join("\n"));
            math_display(tex.trim(), (math.display.0.as_str(), math.display.1.as_str()))
        }
        Fence::Admonition(name) => {
            let mut inner = Vec::with_capacity(body.len());
            expand_lines(body, math, &mut inner);
            admonition(name, &inner.join("\n"))
        }
    }
}

/// Admonition box around already rendered `body_html`.
pub fn admonition(name: &str, body_html: &str) -> String {
    format!(
        concat!(
            "<div class=\"admonition adm-{}\">",
            "<div class=\"admonition-icon\"></div>",
            "<div class=\"admonition-title\">{}</div>",
            "<div class=\"admonition-body\">{}</div>",
            "</div>"
        ),
        escape_html(&name.to_lowercase()),
        escape_html(&title_case(name)),
        body_html
    )
}

/// Upper-case the first letter of every word, lower-case the rest.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}
