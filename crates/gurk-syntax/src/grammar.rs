//! Lexical rule sets for Gurklang source and REPL transcripts.
//!
//! A [`Grammar`] is an arena of [`Rule`]s addressed by [`RuleId`]. Nested
//! rules are listed as [`Contains`] references; [`Contains::Default`] stands
//! for the grammar's default rule set and is resolved when the grammar is
//! consumed, so a delimiter rule can contain the whole set (itself included)
//! without building a cyclic structure.
//!
//! Precedence is positional: among the rules that match at the same offset,
//! the one listed first wins.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// -- Patterns -----------------------------------------------------------------

const RE_BLOCK_COMMENT_BEGIN: &str = r"#\(\(";
const RE_BLOCK_COMMENT_END: &str = r"#\)\)";
const RE_LINE_COMMENT_BEGIN: &str = "#";
const RE_LINE_COMMENT_NOT_BEFORE: &str = r"\(\(|\)\)";
const RE_END_OF_LINE: &str = r"(?m)$";
const RE_NUMBER: &str = r"[+-]?[0-9]+";
const RE_NUMBER_TERMINATOR: &str = r#"[(){}"'#]|\s|$"#;
const RE_SYMBOL: &str = r#":[^"'(){}#\s]+"#;
const RE_IDENTIFIER: &str = r#"[^"'(){}#:\s][^"'(){}#\s]*"#;
const RE_ESCAPE: &str = r"(?s)\\.";
const RE_PROMPT: &str = r"(?m)^>>>";
const RE_CONTINUATION: &str = r"(?m)^\.\.\.";
const RE_ERROR_START: &str = r"(?:ValueError|RuntimeError|KeyError|Failure)";
const RE_ERROR_END: &str = r"Type traceback\? for complete Python traceback";

static PLAIN: LazyLock<Grammar> =
    LazyLock::new(|| build_plain().expect("built-in plain grammar is valid"));

static REPL: LazyLock<Grammar> =
    LazyLock::new(|| build_repl().expect("built-in REPL grammar is valid"));

// -- Types --------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid pattern for rule `{rule}`: {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule `{rule}` refers to unknown rule #{id}")]
    UnknownRule { rule: String, id: usize },
    #[error("grammar `{0}` has no top-level rules")]
    Empty(String),
}

/// Highlight class assigned to a rule's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Number,
    String,
    Symbol,
    Variable,
    Comment,
    Punctuation,
    Meta,
    Deletion,
}

impl Class {
    /// highlight.js class name (rendered as `hljs-<name>`).
    pub fn as_str(self) -> &'static str {
        match self {
            Class::Number => "number",
            Class::String => "string",
            Class::Symbol => "symbol",
            Class::Variable => "variable",
            Class::Comment => "comment",
            Class::Punctuation => "punctuation",
            Class::Meta => "meta",
            Class::Deletion => "deletion",
        }
    }

    /// Token name used in `gurklang--token--<name>` classes.
    pub fn token_name(self) -> &'static str {
        match self {
            Class::Number => "int",
            Class::String => "string",
            Class::Symbol => "atom",
            Class::Variable => "name",
            Class::Comment => "comment",
            Class::Punctuation => "paren",
            Class::Meta => "meta",
            Class::Deletion => "error",
        }
    }
}

/// Stable handle of a rule inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Reference to a nested rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contains {
    Rule(RuleId),
    /// The grammar's default rule set, resolved lazily.
    Default,
}

/// A compiled pattern that remembers the source it was built from.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn new(rule: &str, source: &str) -> Result<Self, GrammarError> {
        Self::compile(rule, source, source.to_string())
    }

    /// Anchored at the start of the haystack, for guards.
    fn anchored(rule: &str, source: &str) -> Result<Self, GrammarError> {
        Self::compile(rule, source, format!("^(?:{})", source))
    }

    fn compile(rule: &str, source: &str, compiled: String) -> Result<Self, GrammarError> {
        let regex = Regex::new(&compiled).map_err(|e| GrammarError::Pattern {
            rule: rule.to_string(),
            source: e,
        })?;
        Ok(Pattern {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Lookahead condition on the text right after a begin match.
#[derive(Debug, Clone)]
pub enum Guard {
    FollowedBy(Pattern),
    NotFollowedBy(Pattern),
}

impl Guard {
    pub fn allows(&self, rest: &str) -> bool {
        match self {
            Guard::FollowedBy(p) => p.regex.is_match(rest),
            Guard::NotFollowedBy(p) => !p.regex.is_match(rest),
        }
    }
}

/// A single lexical rule. Rules without an `end` cover just their begin match.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub class: Option<Class>,
    pub begin: Pattern,
    pub end: Option<Pattern>,
    pub guard: Option<Guard>,
    pub contains: Vec<Contains>,
    pub relevance: u32,
}

/// Uncompiled description of a rule, handed to [`GrammarBuilder::rule`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSpec<'a> {
    pub name: &'a str,
    pub class: Option<Class>,
    pub begin: &'a str,
    pub end: Option<&'a str>,
    pub followed_by: Option<&'a str>,
    pub not_followed_by: Option<&'a str>,
    pub relevance: u32,
}

/// An immutable rule set.
#[derive(Debug, Clone)]
pub struct Grammar {
    id: String,
    display_name: String,
    aliases: Vec<String>,
    rules: Vec<Rule>,
    default_set: Vec<RuleId>,
    top: Vec<Contains>,
}

impl Grammar {
    /// Grammar for plain Gurklang code.
    pub fn plain() -> &'static Grammar {
        &PLAIN
    }

    /// Grammar for REPL transcripts (`>>>` prompts, `...` continuations,
    /// error transcripts).
    pub fn repl() -> &'static Grammar {
        &REPL
    }

    /// Name the grammar is registered under.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    pub fn rule_by_name(&self, name: &str) -> Option<RuleId> {
        self.rules.iter().position(|r| r.name == name).map(RuleId)
    }

    pub fn default_set(&self) -> &[RuleId] {
        &self.default_set
    }

    pub fn top(&self) -> &[Contains] {
        &self.top
    }

    /// Expand a `contains` list into concrete rules, in precedence order.
    pub fn resolve(&self, contains: &[Contains]) -> Vec<RuleId> {
        let mut out = Vec::new();
        for c in contains {
            match c {
                Contains::Rule(id) => out.push(*id),
                Contains::Default => out.extend_from_slice(&self.default_set),
            }
        }
        out
    }
}

// -- Builder ------------------------------------------------------------------

pub struct GrammarBuilder {
    id: String,
    display_name: String,
    aliases: Vec<String>,
    rules: Vec<Rule>,
    default_set: Vec<RuleId>,
    top: Vec<Contains>,
}

impl GrammarBuilder {
    pub fn new(id: &str, display_name: &str) -> Self {
        GrammarBuilder {
            id: id.to_string(),
            display_name: display_name.to_string(),
            aliases: Vec::new(),
            rules: Vec::new(),
            default_set: Vec::new(),
            top: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn rule(&mut self, spec: RuleSpec<'_>) -> Result<RuleId, GrammarError> {
        let guard = match (spec.followed_by, spec.not_followed_by) {
            (Some(p), _) => Some(Guard::FollowedBy(Pattern::anchored(spec.name, p)?)),
            (None, Some(p)) => Some(Guard::NotFollowedBy(Pattern::anchored(spec.name, p)?)),
            (None, None) => None,
        };
        let end = spec.end.map(|e| Pattern::new(spec.name, e)).transpose()?;
        self.rules.push(Rule {
            name: spec.name.to_string(),
            class: spec.class,
            begin: Pattern::new(spec.name, spec.begin)?,
            end,
            guard,
            contains: Vec::new(),
            relevance: spec.relevance,
        });
        Ok(RuleId(self.rules.len() - 1))
    }

    pub fn contains(&mut self, id: RuleId, contains: Vec<Contains>) {
        self.rules[id.0].contains = contains;
    }

    pub fn default_set(&mut self, ids: Vec<RuleId>) {
        self.default_set = ids;
    }

    pub fn top(&mut self, top: Vec<Contains>) {
        self.top = top;
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        if self.top.is_empty() {
            return Err(GrammarError::Empty(self.id));
        }
        let known = self.rules.len();
        let check = |owner: &str, id: RuleId| {
            if id.0 >= known {
                Err(GrammarError::UnknownRule {
                    rule: owner.to_string(),
                    id: id.0,
                })
            } else {
                Ok(())
            }
        };
        for rule in &self.rules {
            for c in &rule.contains {
                if let Contains::Rule(id) = c {
                    check(&rule.name, *id)?;
                }
            }
        }
        for id in &self.default_set {
            check("<default>", *id)?;
        }
        for c in &self.top {
            if let Contains::Rule(id) = c {
                check("<top>", *id)?;
            }
        }
        Ok(Grammar {
            id: self.id,
            display_name: self.display_name,
            aliases: self.aliases,
            rules: self.rules,
            default_set: self.default_set,
            top: self.top,
        })
    }
}

// -- Built-in grammars --------------------------------------------------------

/// Registers the rules shared by both grammars and sets the default set.
fn add_default_rules(b: &mut GrammarBuilder) -> Result<(), GrammarError> {
    let block_comment = b.rule(RuleSpec {
        name: "block_comment",
        class: Some(Class::Comment),
        begin: RE_BLOCK_COMMENT_BEGIN,
        end: Some(RE_BLOCK_COMMENT_END),
        ..Default::default()
    })?;
    let line_comment = b.rule(RuleSpec {
        name: "line_comment",
        class: Some(Class::Comment),
        begin: RE_LINE_COMMENT_BEGIN,
        end: Some(RE_END_OF_LINE),
        not_followed_by: Some(RE_LINE_COMMENT_NOT_BEFORE),
        ..Default::default()
    })?;
    let number = b.rule(RuleSpec {
        name: "number",
        class: Some(Class::Number),
        begin: RE_NUMBER,
        followed_by: Some(RE_NUMBER_TERMINATOR),
        ..Default::default()
    })?;
    let symbol = b.rule(RuleSpec {
        name: "symbol",
        class: Some(Class::Symbol),
        begin: RE_SYMBOL,
        ..Default::default()
    })?;
    let escape = b.rule(RuleSpec {
        name: "escape",
        begin: RE_ESCAPE,
        ..Default::default()
    })?;
    let single_quoted = b.rule(RuleSpec {
        name: "single_quoted_string",
        class: Some(Class::String),
        begin: "'",
        end: Some("'"),
        ..Default::default()
    })?;
    let double_quoted = b.rule(RuleSpec {
        name: "double_quoted_string",
        class: Some(Class::String),
        begin: "\"",
        end: Some("\""),
        ..Default::default()
    })?;
    let vec_literal = b.rule(RuleSpec {
        name: "vec_literal",
        class: Some(Class::Punctuation),
        begin: r"\(",
        end: Some(r"\)"),
        ..Default::default()
    })?;
    let code_literal = b.rule(RuleSpec {
        name: "code_literal",
        class: Some(Class::Punctuation),
        begin: r"\{",
        end: Some(r"\}"),
        ..Default::default()
    })?;
    let identifier = b.rule(RuleSpec {
        name: "identifier",
        class: Some(Class::Variable),
        begin: RE_IDENTIFIER,
        ..Default::default()
    })?;

    b.contains(block_comment, vec![Contains::Default]);
    b.contains(single_quoted, vec![Contains::Rule(escape)]);
    b.contains(double_quoted, vec![Contains::Rule(escape)]);
    b.contains(vec_literal, vec![Contains::Default]);
    b.contains(code_literal, vec![Contains::Default]);

    b.default_set(vec![
        block_comment,
        line_comment,
        number,
        symbol,
        single_quoted,
        double_quoted,
        vec_literal,
        code_literal,
        identifier,
    ]);
    Ok(())
}

fn build_plain() -> Result<Grammar, GrammarError> {
    let mut b = GrammarBuilder::new("gurklang", "Gurklang").alias("gurk");
    add_default_rules(&mut b)?;
    b.top(vec![Contains::Default]);
    b.build()
}

fn build_repl() -> Result<Grammar, GrammarError> {
    let mut b = GrammarBuilder::new("gurkrepl", "Gurklang REPL").alias("gurklang-repl");
    add_default_rules(&mut b)?;

    let error = b.rule(RuleSpec {
        name: "error_transcript",
        class: Some(Class::Deletion),
        begin: RE_ERROR_START,
        end: Some(RE_ERROR_END),
        ..Default::default()
    })?;
    let prompt = b.rule(RuleSpec {
        name: "prompt",
        class: Some(Class::Meta),
        begin: RE_PROMPT,
        end: Some(RE_END_OF_LINE),
        relevance: 10,
        ..Default::default()
    })?;
    let continuation = b.rule(RuleSpec {
        name: "continuation",
        class: Some(Class::Meta),
        begin: RE_CONTINUATION,
        end: Some(RE_END_OF_LINE),
        relevance: 10,
        ..Default::default()
    })?;
    b.contains(prompt, vec![Contains::Default]);
    b.contains(continuation, vec![Contains::Default]);

    b.top(vec![
        Contains::Rule(error),
        Contains::Rule(prompt),
        Contains::Rule(continuation),
        Contains::Default,
    ]);
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(g: &Grammar, ids: &[RuleId]) -> Vec<String> {
        ids.iter().map(|id| g.rule(*id).name.clone()).collect()
    }

    #[test]
    fn plain_default_set_order() {
        let g = Grammar::plain();
        assert_eq!(
            names(g, g.default_set()),
            [
                "block_comment",
                "line_comment",
                "number",
                "symbol",
                "single_quoted_string",
                "double_quoted_string",
                "vec_literal",
                "code_literal",
                "identifier",
            ]
        );
    }

    #[test]
    fn delimiter_rules_contain_default_set() {
        let g = Grammar::plain();
        let vec_literal = g.rule_by_name("vec_literal").unwrap();
        let resolved = g.resolve(&g.rule(vec_literal).contains);
        assert!(resolved.contains(&vec_literal));
        assert_eq!(resolved, g.default_set());
    }

    #[test]
    fn repl_top_puts_transcript_rules_first() {
        let g = Grammar::repl();
        let top = g.resolve(g.top());
        assert_eq!(
            names(g, &top[..3]),
            ["error_transcript", "prompt", "continuation"]
        );
        assert_eq!(top.len(), 3 + g.default_set().len());
    }

    #[test]
    fn aliases() {
        assert_eq!(Grammar::plain().id(), "gurklang");
        assert_eq!(Grammar::plain().aliases(), ["gurk"]);
        assert_eq!(Grammar::repl().id(), "gurkrepl");
    }

    #[test]
    fn guard_checks_following_text() {
        let g = Grammar::plain();
        let number = g.rule(g.rule_by_name("number").unwrap());
        let guard = number.guard.as_ref().unwrap();
        assert!(guard.allows(" rest"));
        assert!(guard.allows(")"));
        assert!(guard.allows(""));
        assert!(!guard.allows("abc"));
    }

    #[test]
    fn builder_rejects_unknown_rule() {
        let mut b = GrammarBuilder::new("t", "T");
        let r = b
            .rule(RuleSpec {
                name: "r",
                begin: "x",
                ..Default::default()
            })
            .unwrap();
        b.contains(r, vec![Contains::Rule(RuleId(7))]);
        b.top(vec![Contains::Rule(r)]);
        let err = b.build().unwrap_err();
        assert!(matches!(err, GrammarError::UnknownRule { id: 7, .. }));
    }

    #[test]
    fn builder_rejects_bad_pattern() {
        let mut b = GrammarBuilder::new("t", "T");
        let err = b
            .rule(RuleSpec {
                name: "broken",
                begin: "(",
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn builder_rejects_empty_grammar() {
        let b = GrammarBuilder::new("t", "T");
        assert!(matches!(b.build(), Err(GrammarError::Empty(_))));
    }
}
