//! Inline markup for definition text: HTML escaping and the tiny
//! `*italic*` / `` `code` `` syntax used in explanations.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static RE_ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*((?:\\\*|[^*])+)\*").unwrap());

static RE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`((?:\\`|[^`])+)`").unwrap());

static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Decode character references. Unknown named entities are left as they are.
pub fn unescape_html(s: &str) -> String {
    RE_ENTITY
        .replace_all(s, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Expand `*text*` to `<i>text</i>` and `` `text` `` to `<tt>text</tt>`.
///
/// Input must already be escaped; the expansion only adds the two tags.
pub fn expand_markup(escaped: &str) -> String {
    let italic = RE_ITALIC.replace_all(escaped, "<i>$1</i>");
    RE_CODE.replace_all(&italic, "<tt>$1</tt>").into_owned()
}

/// Escape, then expand markup.
pub fn render_explanation(text: &str) -> String {
    expand_markup(&escape_html(text))
}

/// Display math element, typeset on the client.
pub fn math_display(tex: &str, delimiters: (&str, &str)) -> String {
    format!(
        "<div class=\"math-display\">{}{}{}</div>",
        delimiters.0,
        escape_html(tex),
        delimiters.1
    )
}
