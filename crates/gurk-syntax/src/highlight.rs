//! Grammar-driven highlighter with highlight.js matching semantics.
//!
//! At each position the engine looks for the earliest begin match among the
//! rules nested in the current region and for the region's end pattern. The
//! earliest match wins; on a tie a nested rule beats the end pattern and an
//! earlier-declared rule beats a later one. Text that no rule claims is kept
//! as unclassified text.

use crate::grammar::{Class, Grammar, RuleId};
use std::ops::Range;

/// A highlighted region opened by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub rule: RuleId,
    pub name: String,
    pub class: Option<Class>,
    /// Text of the begin match.
    pub open: String,
    pub children: Vec<Node>,
    /// Text of the end match; `None` for single-match rules and for regions
    /// left open at end of input.
    pub close: Option<String>,
    /// Byte range of the whole region in the source.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Scope(Scope),
}

/// Result of highlighting a source string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlighted {
    pub nodes: Vec<Node>,
}

impl Highlighted {
    /// Every scope in document order (parents before children).
    pub fn scopes(&self) -> Vec<&Scope> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Scope>) {
            for node in nodes {
                if let Node::Scope(scope) = node {
                    out.push(scope);
                    walk(&scope.children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Render as highlight.js-style markup (`<span class="hljs-...">`).
    pub fn to_html(&self) -> String {
        fn write(nodes: &[Node], out: &mut String) {
            for node in nodes {
                match node {
                    Node::Text(text) => out.push_str(&escape(text)),
                    Node::Scope(scope) => {
                        if let Some(class) = scope.class {
                            out.push_str(&format!("<span class=\"hljs-{}\">", class.as_str()));
                        }
                        out.push_str(&escape(&scope.open));
                        write(&scope.children, out);
                        if let Some(ref close) = scope.close {
                            out.push_str(&escape(close));
                        }
                        if scope.class.is_some() {
                            out.push_str("</span>");
                        }
                    }
                }
            }
        }
        let mut out = String::new();
        write(&self.nodes, &mut out);
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Cached result of the last search for a rule's begin pattern.
#[derive(Clone, Copy)]
enum Lookahead {
    Unknown,
    Found(usize, usize),
    Never,
}

/// A region being filled while scanning.
struct Frame {
    scope: Option<Scope>,
    children: Vec<Node>,
    candidates: Vec<RuleId>,
    cache: Vec<Lookahead>,
}

impl Frame {
    fn new(scope: Option<Scope>, candidates: Vec<RuleId>) -> Self {
        let cache = vec![Lookahead::Unknown; candidates.len()];
        Frame {
            scope,
            children: Vec::new(),
            candidates,
            cache,
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Close the frame into a scope node, or hand back its children for the root.
    fn finish(self, close: Option<String>, end: usize) -> Result<Node, Vec<Node>> {
        match self.scope {
            Some(mut scope) => {
                scope.children = self.children;
                scope.close = close;
                scope.span.end = end;
                Ok(Node::Scope(scope))
            }
            None => Err(self.children),
        }
    }
}

enum Event {
    Begin { index: usize, start: usize, end: usize },
    End { start: usize, end: usize },
}

pub struct Highlighter<'g> {
    grammar: &'g Grammar,
    top: Vec<RuleId>,
    nested: Vec<Vec<RuleId>>,
}

impl<'g> Highlighter<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        let nested = grammar
            .rules()
            .map(|(_, rule)| grammar.resolve(&rule.contains))
            .collect();
        Highlighter {
            grammar,
            top: grammar.resolve(grammar.top()),
            nested,
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn highlight(&self, source: &str) -> Highlighted {
        let mut stack = vec![Frame::new(None, self.top.clone())];
        let mut pos = 0;

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            match self.next_event(source, pos, frame) {
                None => {
                    frame.push_text(&source[pos..]);
                    break;
                }
                Some(Event::Begin { index, start, end }) => {
                    frame.push_text(&source[pos..start]);
                    let id = frame.candidates[index];
                    let rule = self.grammar.rule(id);
                    tracing::trace!(rule = %rule.name, start, end, "open scope");
                    let scope = Scope {
                        rule: id,
                        name: rule.name.clone(),
                        class: rule.class,
                        open: source[start..end].to_string(),
                        children: Vec::new(),
                        close: None,
                        span: start..end,
                    };
                    if rule.end.is_some() {
                        stack.push(Frame::new(Some(scope), self.nested[id.index()].clone()));
                    } else {
                        frame.children.push(Node::Scope(scope));
                    }
                    pos = end;
                }
                Some(Event::End { start, end }) => {
                    frame.push_text(&source[pos..start]);
                    let close = source[start..end].to_string();
                    pos = end;
                    if let Some(done) = stack.pop() {
                        attach(&mut stack, done.finish(Some(close), end));
                    }
                }
            }
        }

        // Regions still open at end of input are closed implicitly.
        while stack.len() > 1 {
            if let Some(done) = stack.pop() {
                attach(&mut stack, done.finish(None, source.len()));
            }
        }
        let nodes = stack.pop().map(|root| root.children).unwrap_or_default();
        Highlighted { nodes }
    }

    fn next_event(&self, source: &str, pos: usize, frame: &mut Frame) -> Option<Event> {
        let mut best: Option<(usize, usize, usize)> = None;
        for index in 0..frame.candidates.len() {
            let found = match frame.cache[index] {
                Lookahead::Found(s, e) if s >= pos => Some((s, e)),
                Lookahead::Never => None,
                _ => {
                    let found = self.find_begin(source, pos, frame.candidates[index]);
                    frame.cache[index] = match found {
                        Some((s, e)) => Lookahead::Found(s, e),
                        None => Lookahead::Never,
                    };
                    found
                }
            };
            if let Some((s, e)) = found {
                if best.map_or(true, |(bs, _, _)| s < bs) {
                    best = Some((s, e, index));
                }
            }
        }

        let end = frame
            .scope
            .as_ref()
            .and_then(|scope| self.grammar.rule(scope.rule).end.as_ref())
            .and_then(|p| p.regex().find_at(source, pos))
            .map(|m| (m.start(), m.end()));

        match (best, end) {
            (Some((s, _, _)), Some((es, ee))) if es < s => Some(Event::End { start: es, end: ee }),
            (Some((start, end, index)), _) => Some(Event::Begin { index, start, end }),
            (None, Some((start, end))) => Some(Event::End { start, end }),
            (None, None) => None,
        }
    }

    /// Earliest non-empty begin match of `id` at or after `from` whose guard holds.
    fn find_begin(&self, source: &str, mut from: usize, id: RuleId) -> Option<(usize, usize)> {
        let rule = self.grammar.rule(id);
        while from <= source.len() {
            let m = rule.begin.regex().find_at(source, from)?;
            let allowed = rule
                .guard
                .as_ref()
                .map_or(true, |g| g.allows(&source[m.end()..]));
            if !m.is_empty() && allowed {
                return Some((m.start(), m.end()));
            }
            from = next_char_boundary(source, m.start());
        }
        None
    }
}

fn next_char_boundary(s: &str, i: usize) -> usize {
    s[i..].chars().next().map_or(s.len() + 1, |c| i + c.len_utf8())
}

fn attach(stack: &mut [Frame], finished: Result<Node, Vec<Node>>) {
    if let (Some(parent), Ok(node)) = (stack.last_mut(), finished) {
        parent.children.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(source: &str) -> Highlighted {
        Highlighter::new(Grammar::plain()).highlight(source)
    }

    fn repl(source: &str) -> Highlighted {
        Highlighter::new(Grammar::repl()).highlight(source)
    }

    /// (rule name, source text) of every scope.
    fn scopes<'a>(h: &Highlighted, source: &'a str) -> Vec<(String, &'a str)> {
        h.scopes()
            .into_iter()
            .map(|s| (s.name.clone(), &source[s.span.clone()]))
            .collect()
    }

    #[test]
    fn signed_numbers_before_terminators() {
        for (source, number) in [
            ("42", "42"),
            ("-7 dup", "-7"),
            ("+3)", "+3"),
            ("10}", "10"),
            ("5\"x\"", "5"),
            ("99#c", "99"),
            ("1\n", "1"),
            ("12'a'", "12"),
        ] {
            let h = plain(source);
            let first = &h.scopes()[0];
            assert_eq!(first.class, Some(Class::Number), "in {:?}", source);
            assert_eq!(&source[first.span.clone()], number);
        }
    }

    #[test]
    fn digits_followed_by_letters_are_identifiers() {
        let source = "12abc x1";
        let h = plain(source);
        assert_eq!(
            scopes(&h, source),
            [
                ("identifier".to_string(), "12abc"),
                ("identifier".to_string(), "x1")
            ]
        );
    }

    #[test]
    fn string_extends_past_escaped_quote() {
        let source = r#""say \"hi\"" println"#;
        let h = plain(source);
        let string = &h.scopes()[0];
        assert_eq!(string.class, Some(Class::String));
        assert_eq!(&source[string.span.clone()], r#""say \"hi\"""#);
        assert_eq!(string.close.as_deref(), Some("\""));
    }

    #[test]
    fn single_quoted_string_with_escape() {
        let source = r"'it\'s' x";
        let h = plain(source);
        assert_eq!(&source[h.scopes()[0].span.clone()], r"'it\'s'");
    }

    #[test]
    fn symbols_and_identifiers() {
        let source = ":name def <- -!>";
        let h = plain(source);
        let classes: Vec<_> = h.scopes().iter().map(|s| s.class).collect();
        assert_eq!(
            classes,
            [
                Some(Class::Symbol),
                Some(Class::Variable),
                Some(Class::Variable),
                Some(Class::Variable)
            ]
        );
    }

    #[test]
    fn line_comment_runs_to_end_of_line() {
        let source = "1 # one two\n2";
        let h = plain(source);
        let found = scopes(&h, source);
        assert_eq!(found[1], ("line_comment".to_string(), "# one two"));
        assert_eq!(found[2], ("number".to_string(), "2"));
    }

    #[test]
    fn nested_lists_and_blocks() {
        let source = "(1 (2 {x}) :a)";
        let h = plain(source);
        let names: Vec<_> = h.scopes().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "vec_literal",
                "number",
                "vec_literal",
                "number",
                "code_literal",
                "identifier",
                "symbol"
            ]
        );
        assert_eq!(h.scopes()[0].span, 0..source.len());
    }

    #[test]
    fn block_comment_keeps_string_with_hash_whole() {
        let source = "#((example\n\"a # b\" println\n#))\nafter";
        let h = plain(source);
        let top = h.scopes()[0];
        assert_eq!(top.name, "block_comment");
        assert_eq!(&source[top.span.clone()], "#((example\n\"a # b\" println\n#))");
        let inner: Vec<_> = top
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Scope(s) => Some((s.name.as_str(), &source[s.span.clone()])),
                Node::Text(_) => None,
            })
            .collect();
        assert_eq!(
            inner,
            [
                ("identifier", "example"),
                ("double_quoted_string", "\"a # b\""),
                ("identifier", "println")
            ]
        );
        assert!(!h.scopes().iter().any(|s| s.name == "line_comment"));
    }

    #[test]
    fn nested_block_comments() {
        let source = "#(( outer #(( inner #)) still #)) x";
        let h = plain(source);
        let top = h.scopes()[0];
        assert_eq!(&source[top.span.clone()], "#(( outer #(( inner #)) still #))");
    }

    #[test]
    fn unterminated_region_closes_at_end() {
        let source = "\"open";
        let h = plain(source);
        let s = h.scopes()[0];
        assert_eq!(s.span, 0..5);
        assert_eq!(s.close, None);
    }

    #[test]
    fn unmatched_text_is_passed_through() {
        let source = ": )";
        let h = plain(source);
        assert!(h.scopes().is_empty());
        assert_eq!(h.nodes, [Node::Text(": )".to_string())]);
    }

    #[test]
    fn repl_prompts_scope_their_line() {
        let source = ">>> 1 2 +\n... dup\n3";
        let h = repl(source);
        let found = scopes(&h, source);
        assert_eq!(found[0], ("prompt".to_string(), ">>> 1 2 +"));
        assert!(found.contains(&("continuation".to_string(), "... dup")));
        assert_eq!(found.last().unwrap(), &("number".to_string(), "3"));
    }

    #[test]
    fn repl_error_transcript() {
        let source = ">>> x\nKeyError: x\nType traceback? for complete Python traceback\n>>> 1";
        let h = repl(source);
        let error = h
            .scopes()
            .into_iter()
            .find(|s| s.class == Some(Class::Deletion))
            .unwrap();
        assert!(source[error.span.clone()].starts_with("KeyError"));
        assert!(source[error.span.clone()].ends_with("Python traceback"));
    }

    #[test]
    fn prompt_only_at_line_start() {
        let source = "a >>> b";
        let h = repl(source);
        assert!(h.scopes().iter().all(|s| s.name != "prompt"));
    }

    #[test]
    fn html_output_escapes_text() {
        let h = plain("<- \"<b>\"");
        assert_eq!(
            h.to_html(),
            "<span class=\"hljs-variable\">&lt;-</span> <span class=\"hljs-string\">\"&lt;b&gt;\"</span>"
        );
    }
}
