//! Definition table — documentation records for names in code samples.
//!
//! Every record is reachable by its bare name and by `module.name`. Both keys
//! share one `Arc`, so the two lookups always agree. When two modules define
//! the same bare name the later registration wins the bare key; the
//! qualified keys of both stay intact.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

const BUILTIN_DEFINITIONS: &str = include_str!("../assets/definitions.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub module: String,
    /// Explanation text with `*italic*` and `` `code` `` markup.
    pub explanation: String,
    pub stack_diagram: String,
}

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid definition file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed definition file: {0}")]
    Shape(String),
    #[error("malformed definition `{key}`: {reason}")]
    Malformed { key: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefinition {
    explanation: Option<String>,
    stack_diagram: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DefinitionTable {
    entries: HashMap<String, Arc<Definition>>,
    /// Bare-name registrations in order, replayed by [`DefinitionTable::merge`].
    registrations: Vec<(String, Arc<Definition>)>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with gurkdoc (prelude, boxes, math).
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_DEFINITIONS).expect("bundled definitions are well-formed")
    }

    /// Parse `{ module: { name: { explanation, stackDiagram, aliases? } } }`.
    pub fn from_json(source: &str) -> Result<Self, DefinitionError> {
        let value: Value = serde_json::from_str(source)?;
        let modules = value
            .as_object()
            .ok_or_else(|| DefinitionError::Shape("top level must be an object of modules".into()))?;

        let mut table = DefinitionTable::new();
        for (module, names) in modules {
            let names = names.as_object().ok_or_else(|| {
                DefinitionError::Shape(format!("module `{}` must be an object of names", module))
            })?;
            for (name, raw) in names {
                let key = format!("{}.{}", module, name);
                let raw: RawDefinition =
                    serde_json::from_value(raw.clone()).map_err(|e| DefinitionError::Malformed {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
                let explanation = raw.explanation.ok_or_else(|| missing(&key, "explanation"))?;
                let stack_diagram = raw.stack_diagram.ok_or_else(|| missing(&key, "stackDiagram"))?;
                let definition = Arc::new(Definition {
                    module: module.clone(),
                    explanation,
                    stack_diagram,
                });
                table.register(name, Arc::clone(&definition));
                for alias in &raw.aliases {
                    table.register(alias, Arc::clone(&definition));
                }
            }
        }
        tracing::debug!(names = table.registrations.len(), "loaded definitions");
        Ok(table)
    }

    pub fn insert(&mut self, name: &str, definition: Definition) {
        self.register(name, Arc::new(definition));
    }

    fn register(&mut self, name: &str, definition: Arc<Definition>) {
        if let Some(previous) = self.entries.get(name) {
            if previous.module != definition.module {
                tracing::warn!(
                    name,
                    shadowed = %previous.module,
                    by = %definition.module,
                    "definition shadows an earlier module's name"
                );
            }
        }
        let qualified = format!("{}.{}", definition.module, name);
        self.entries.insert(qualified, Arc::clone(&definition));
        self.entries.insert(name.to_string(), Arc::clone(&definition));
        self.registrations.push((name.to_string(), definition));
    }

    /// Add every registration of `other` after the ones already present.
    pub fn merge(&mut self, other: DefinitionTable) {
        for (name, definition) in other.registrations {
            self.register(&name, definition);
        }
    }

    /// Exact-match lookup by bare or qualified name.
    pub fn lookup(&self, name: &str) -> Option<&Definition> {
        self.entries.get(name).map(|d| d.as_ref())
    }

    /// Bare names in registration order (may repeat after shadowing).
    pub fn bare_names(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn missing(key: &str, field: &str) -> DefinitionError {
    DefinitionError::Malformed {
        key: key.to_string(),
        reason: format!("missing field `{}`", field),
    }
}

/// Display name of a definition; the prelude module is implicit.
pub fn qualified_name(name: &str, module: &str, prelude: &str) -> String {
    if module == prelude {
        name.to_string()
    } else {
        format!("{}.{}", module, name)
    }
}
