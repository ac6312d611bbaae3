// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Persona & Vow Rule Store
// ─────────────────────────────────────────────────────────────────────
//! Configuration-time source of personas and vow pattern rules.
//!
//! The in-memory backend carries the built-in `co-voice` persona and
//! rule set. Deployments can load a JSON document or plug any database
//! in via the `VowStore` trait.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use tonesoul_types::{KernelError, KernelResult, Persona, RuleSet, VowPatternRule};

/// Trait for persona and rule backends.
pub trait VowStore: Send + Sync {
    /// Look up a persona by id.
    fn persona(&self, id: &str) -> KernelResult<Persona>;

    /// All vow pattern rules, unvalidated.
    fn rules(&self) -> KernelResult<Vec<VowPatternRule>>;
}

/// In-memory store keyed by persona id.
pub struct InMemoryStore {
    personas: BTreeMap<String, Persona>,
    rules: Vec<VowPatternRule>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        let co_voice = Persona::co_voice();
        let mut personas = BTreeMap::new();
        personas.insert(co_voice.id.clone(), co_voice);
        Self {
            personas,
            rules: RuleSet::builtin().iter().cloned().collect(),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from explicit contents. Every persona is validated;
    /// rules are validated only when a [`RuleSet`] is built from them.
    pub fn with_contents(personas: Vec<Persona>, rules: Vec<VowPatternRule>) -> KernelResult<Self> {
        let mut store = Self {
            personas: BTreeMap::new(),
            rules,
        };
        for persona in personas {
            store.add_persona(persona)?;
        }
        Ok(store)
    }

    /// Validate and insert or replace a persona.
    pub fn add_persona(&mut self, persona: Persona) -> KernelResult<()> {
        persona.validate()?;
        self.personas.insert(persona.id.clone(), persona);
        Ok(())
    }

    pub fn add_rule(&mut self, rule: VowPatternRule) {
        self.rules.push(rule);
    }
}

impl VowStore for InMemoryStore {
    fn persona(&self, id: &str) -> KernelResult<Persona> {
        self.personas
            .get(id)
            .cloned()
            .ok_or_else(|| KernelError::UnknownPersona(id.to_string()))
    }

    fn rules(&self) -> KernelResult<Vec<VowPatternRule>> {
        Ok(self.rules.clone())
    }
}

#[derive(Debug, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    personas: Vec<Persona>,
    #[serde(default)]
    rules: Vec<VowPatternRule>,
}

/// Store backed by a JSON document `{ "personas": [...], "rules": [...] }`.
///
/// Personas are validated on load. Rules are parsed but validated only
/// when a [`RuleSet`] is built from them.
pub struct JsonStore {
    inner: InMemoryStore,
}

impl JsonStore {
    pub fn from_json(json: &str) -> KernelResult<Self> {
        let doc: StoreDocument = serde_json::from_str(json)
            .map_err(|e| KernelError::RuleLoad(format!("JSON parse error: {e}")))?;
        Ok(Self {
            inner: InMemoryStore::with_contents(doc.personas, doc.rules)?,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> KernelResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| KernelError::RuleLoad(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

impl VowStore for JsonStore {
    fn persona(&self, id: &str) -> KernelResult<Persona> {
        self.inner.persona(id)
    }

    fn rules(&self) -> KernelResult<Vec<VowPatternRule>> {
        self.inner.rules()
    }
}

/// Outcome of loading the rule set: the snapshot in use, plus the error
/// that forced the built-in fallback, if any.
#[derive(Debug, Clone)]
pub struct RuleLoad {
    pub rules: RuleSet,
    pub warning: Option<KernelError>,
}

impl RuleLoad {
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Load and validate the store's rules, substituting
/// [`RuleSet::builtin`] when either step fails.
pub fn load_rules_or_fallback(store: &dyn VowStore) -> RuleLoad {
    match store.rules().and_then(RuleSet::new) {
        Ok(rules) => RuleLoad {
            rules,
            warning: None,
        },
        Err(e) => {
            log::warn!("Vow rules unavailable, using built-in rule set: {e}");
            RuleLoad {
                rules: RuleSet::builtin(),
                warning: Some(e),
            }
        }
    }
}
