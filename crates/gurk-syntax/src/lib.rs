//! Gurklang syntax highlighting.
//!
//! - [`grammar`]: the lexical rule sets for plain code and REPL transcripts
//! - [`highlight`]: a highlight.js-compatible engine that applies a grammar
//! - [`hljs`]: export of the same grammars as a highlight.js plugin

pub mod grammar;
pub mod highlight;
pub mod hljs;

pub use grammar::{
    Class, Contains, Grammar, GrammarBuilder, GrammarError, Guard, Pattern, Rule, RuleId, RuleSpec,
};
pub use highlight::{Highlighted, Highlighter, Node, Scope};
