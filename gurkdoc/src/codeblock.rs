//! Code samples rendered as `gurklang--token--*` spans.
//!
//! This is the markup the tooltip annotator scans: every identifier becomes a
//! `gurklang--token--name` span. Block comments of the form
//! `#((label … #))` become labelled sections whose contents are still
//! tokenized, and REPL error output becomes a `bad` section.

use crate::markup::escape_html;
use gurk_syntax::{Class, Grammar, Highlighter, Node, Scope};

const DEFAULT_SECTION: &str = "comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Plain,
    Repl,
}

impl CodeKind {
    pub fn grammar(self) -> &'static Grammar {
        match self {
            CodeKind::Plain => Grammar::plain(),
            CodeKind::Repl => Grammar::repl(),
        }
    }
}

pub fn render_code_block(source: &str, kind: CodeKind) -> String {
    let source = dedent(source);
    let highlighted = Highlighter::new(kind.grammar()).highlight(&source);
    let mut out = String::from("<pre><code language=\"gurklang\">");
    write_nodes(&highlighted.nodes, &mut out);
    out.push_str("</code></pre>");
    out
}

/// Drop surrounding blank lines and the indentation common to all lines.
pub fn dedent(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => write_text(text, out),
            Node::Scope(scope) => write_scope(scope, out),
        }
    }
}

fn write_text(text: &str, out: &mut String) {
    if text.trim().is_empty() {
        out.push_str(&escape_html(text));
    } else {
        write_token("text", text, out);
    }
}

fn write_token(name: &str, text: &str, out: &mut String) {
    if text.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<span class=\"gurklang--token gurklang--token--{}\">{}</span>",
        name,
        escape_html(text)
    ));
}

fn write_scope(scope: &Scope, out: &mut String) {
    match (scope.name.as_str(), scope.class) {
        ("block_comment", _) => write_section(scope, out),
        ("error_transcript", _) => {
            out.push_str("<span class=\"gurklang--section gurklang--section--bad\">");
            write_token("error", &flatten(scope), out);
            out.push_str("</span>");
        }
        (_, Some(Class::Meta)) => {
            out.push_str(&format!(
                "<span class=\"gurklang--token gurklang--token--meta gurklang--meta\">{}</span>",
                escape_html(&scope.open)
            ));
            write_nodes(&scope.children, out);
        }
        (_, Some(Class::Punctuation)) => {
            write_token("paren", &scope.open, out);
            write_nodes(&scope.children, out);
            if let Some(close) = &scope.close {
                write_token("paren", close, out);
            }
        }
        (_, Some(class)) => write_token(class.token_name(), &flatten(scope), out),
        (_, None) => write_text(&flatten(scope), out),
    }
}

/// `#((label` on its own line names the section; otherwise it is a plain
/// comment section and everything inside is rendered.
fn write_section(scope: &Scope, out: &mut String) {
    let (label, body) = match split_label(&scope.children) {
        Some((label, body)) => (label, body),
        None => (DEFAULT_SECTION.to_string(), scope.children.clone()),
    };
    out.push_str(&format!(
        "<span class=\"gurklang--section gurklang--section--{}\">",
        escape_html(&label)
    ));
    write_nodes(&body, out);
    out.push_str("</span>");
}

fn split_label(children: &[Node]) -> Option<(String, Vec<Node>)> {
    let mut label = String::new();
    for (i, child) in children.iter().enumerate() {
        match child {
            Node::Scope(scope) => label.push_str(&flatten(scope)),
            Node::Text(text) => {
                let Some((head, tail)) = text.split_once('\n') else {
                    label.push_str(text);
                    continue;
                };
                label.push_str(head);
                let label = label.trim();
                let valid = !label.is_empty()
                    && label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_');
                if !valid {
                    return None;
                }
                let mut body = vec![Node::Text(tail.to_string())];
                body.extend(children[i + 1..].iter().cloned());
                return Some((label.to_string(), body));
            }
        }
    }
    None
}

/// Source text of a scope.
fn flatten(scope: &Scope) -> String {
    let mut out = scope.open.clone();
    for child in &scope.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Scope(inner) => out.push_str(&flatten(inner)),
        }
    }
    if let Some(close) = &scope.close {
        out.push_str(close);
    }
    out
}
