//! Export grammars as highlight.js language plugins.
//!
//! The generated plugin mirrors the grammar rule for rule. Guards become
//! JavaScript lookaheads and recursive `contains` lists are wired after every
//! rule object exists, the same way a hand-written plugin would do it.

use crate::grammar::{Contains, Grammar, Guard, Rule};

/// JavaScript source of a `hljs => language` plugin function for `grammar`.
pub fn plugin_source(grammar: &Grammar) -> String {
    let mut out = String::new();
    out.push_str("hljs => {\n");
    out.push_str("    const rules = {};\n");

    for (_, rule) in grammar.rules() {
        out.push_str(&rule_object(rule));
    }

    out.push_str(&format!(
        "    const DEFAULT_CONTAINS = [{}];\n",
        grammar
            .default_set()
            .iter()
            .map(|id| rule_ref(grammar.rule(*id)))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    for (_, rule) in grammar.rules() {
        if rule.contains.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "    {}.contains = {};\n",
            rule_ref(rule),
            contains_list(grammar, &rule.contains)
        ));
    }

    out.push_str("    return {\n");
    out.push_str(&format!("        name: {},\n", js_string(grammar.display_name())));
    let aliases: Vec<String> = grammar.aliases().iter().map(|a| js_string(a)).collect();
    out.push_str(&format!("        aliases: [{}],\n", aliases.join(", ")));
    out.push_str(&format!(
        "        contains: {},\n",
        contains_list(grammar, grammar.top())
    ));
    out.push_str("    };\n");
    out.push('}');
    out
}

/// Script registering every grammar with a global `hljs`.
pub fn registration_script(grammars: &[&Grammar]) -> String {
    let mut out = String::from("// Gurklang grammars for highlight.js\n");
    for grammar in grammars {
        out.push_str(&format!(
            "hljs.registerLanguage({}, {});\n",
            js_string(grammar.id()),
            plugin_source(grammar)
        ));
    }
    out
}

fn rule_object(rule: &Rule) -> String {
    let mut out = format!("    {} = {{\n", rule_ref(rule));
    if let Some(class) = rule.class {
        out.push_str(&format!("        className: {},\n", js_string(class.as_str())));
    }
    out.push_str(&format!(
        "        begin: {},\n",
        js_regex(rule.begin.source(), rule.guard.as_ref())
    ));
    if let Some(ref end) = rule.end {
        out.push_str(&format!("        end: {},\n", js_regex(end.source(), None)));
    }
    if rule.relevance > 0 {
        out.push_str(&format!("        relevance: {},\n", rule.relevance));
    }
    out.push_str("    };\n");
    out
}

fn rule_ref(rule: &Rule) -> String {
    format!("rules.{}", rule.name)
}

fn contains_list(grammar: &Grammar, contains: &[Contains]) -> String {
    if contains == [Contains::Default] {
        return "DEFAULT_CONTAINS".to_string();
    }
    let items: Vec<String> = contains
        .iter()
        .map(|c| match c {
            Contains::Rule(id) => rule_ref(grammar.rule(*id)),
            Contains::Default => "...DEFAULT_CONTAINS".to_string(),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// Regex literal for a pattern. highlight.js compiles every pattern in
/// multi-line mode, so `(?m)` is dropped; JavaScript has no inline `(?s)`,
/// so its dots are spelled out as `[\s\S]`.
fn js_regex(source: &str, guard: Option<&Guard>) -> String {
    let mut body = js_pattern(source);
    match guard {
        Some(Guard::FollowedBy(p)) => body.push_str(&format!("(?={})", js_pattern(p.source()))),
        Some(Guard::NotFollowedBy(p)) => body.push_str(&format!("(?!{})", js_pattern(p.source()))),
        None => {}
    }
    format!("/{}/", body.replace('/', "\\/"))
}

fn js_pattern(source: &str) -> String {
    let mut body = source;
    let mut dot_all = false;
    loop {
        if let Some(rest) = body.strip_prefix("(?m)") {
            body = rest;
        } else if let Some(rest) = body.strip_prefix("(?s)") {
            body = rest;
            dot_all = true;
        } else {
            break;
        }
    }
    if !dot_all {
        return body.to_string();
    }

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '.' if !in_class => out.push_str(r"[\s\S]"),
            _ => out.push(c),
        }
    }
    out
}

fn js_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_wires_recursive_contains() {
        let js = plugin_source(Grammar::plain());
        assert!(js.starts_with("hljs => {"));
        assert!(js.contains("rules.vec_literal.contains = DEFAULT_CONTAINS;"));
        assert!(js.contains("rules.code_literal.contains = DEFAULT_CONTAINS;"));
        assert!(js.contains("rules.double_quoted_string.contains = [rules.escape];"));
        assert!(js.contains("name: 'Gurklang',"));
        assert!(js.contains("aliases: ['gurk'],"));
    }

    #[test]
    fn guards_become_lookaheads() {
        let js = plugin_source(Grammar::plain());
        assert!(js.contains(r#"begin: /[+-]?[0-9]+(?=[(){}"'#]|\s|$)/,"#));
        assert!(js.contains(r"begin: /#(?!\(\(|\)\))/,"));
    }

    #[test]
    fn inline_flags_are_dropped() {
        let js = plugin_source(Grammar::repl());
        assert!(js.contains("begin: /^>>>/,"));
        assert!(js.contains("end: /$/,"));
        assert!(js.contains("relevance: 10,"));
        assert!(js.contains(
            "contains: [rules.error_transcript, rules.prompt, rules.continuation, ...DEFAULT_CONTAINS],"
        ));
    }

    #[test]
    fn dot_all_dots_match_newlines_in_javascript() {
        let js = plugin_source(Grammar::plain());
        assert!(js.contains(r"begin: /\\[\s\S]/,"), "{}", js);
        assert_eq!(js_pattern(r"(?s)a.b[.]\."), r"a[\s\S]b[.]\.");
        assert_eq!(js_pattern(r"(?m)^a.b"), r"^a.b");
    }

    #[test]
    fn registration_covers_every_grammar() {
        let js = registration_script(&[Grammar::plain(), Grammar::repl()]);
        assert!(js.contains("hljs.registerLanguage('gurklang', hljs => {"));
        assert!(js.contains("hljs.registerLanguage('gurkrepl', hljs => {"));
    }

    #[test]
    fn slashes_and_quotes_are_escaped() {
        assert_eq!(js_regex("a/b", None), r"/a\/b/");
        assert_eq!(js_string("it's"), r"'it\'s'");
    }
}
