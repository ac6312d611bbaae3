// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Persona Definitions
// ─────────────────────────────────────────────────────────────────────

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::tone::{ToneDimension, ToneVector};

/// Identifier of a persona-scoped behavioural commitment.
pub type VowId = String;

pub const TRUTHFULNESS_VOW: &str = "no-concealment";
pub const SINCERITY_VOW: &str = "no-emotional-evasion";
pub const RESPONSIBILITY_VOW: &str = "own-the-outcome";

/// Signal a collapse rule watches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollapseSignal {
    /// Tension on one dimension, or the normalised magnitude when `None`.
    Tension {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dimension: Option<ToneDimension>,
    },
    /// Keyword hits in externally supplied hint tags. An empty list uses
    /// the rule's trigger as the only keyword.
    Context {
        #[serde(default)]
        keywords: Vec<String>,
    },
}

impl Default for CollapseSignal {
    fn default() -> Self {
        CollapseSignal::Tension { dimension: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseRule {
    pub trigger: String,
    pub score_threshold: f64,
    #[serde(default)]
    pub signal: CollapseSignal,
}

impl CollapseRule {
    pub fn tension(trigger: impl Into<String>, dimension: Option<ToneDimension>, score_threshold: f64) -> Self {
        Self {
            trigger: trigger.into(),
            score_threshold,
            signal: CollapseSignal::Tension { dimension },
        }
    }

    pub fn context(trigger: impl Into<String>, keywords: Vec<String>, score_threshold: f64) -> Self {
        Self {
            trigger: trigger.into(),
            score_threshold,
            signal: CollapseSignal::Context { keywords },
        }
    }
}

/// A declared character the kernel holds generated text against.
///
/// Created at configuration time; the kernel only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub tone_signature: ToneVector,
    pub vow_set: BTreeSet<VowId>,
    /// Tone dimension each vow guards. Vows without an entry are checked
    /// by semantic rules only.
    #[serde(default)]
    pub vow_dimensions: BTreeMap<VowId, ToneDimension>,
    #[serde(default)]
    pub collapse_rules: Vec<CollapseRule>,
}

impl Persona {
    pub fn carries(&self, vow_id: &str) -> bool {
        self.vow_set.contains(vow_id)
    }

    pub fn vow_dimension(&self, vow_id: &str) -> Option<ToneDimension> {
        self.vow_dimensions.get(vow_id).copied()
    }

    /// Vows guarding `dimension`, in vow-id order.
    pub fn vows_for(&self, dimension: ToneDimension) -> impl Iterator<Item = &str> + '_ {
        self.vow_dimensions
            .iter()
            .filter(move |(id, d)| **d == dimension && self.vow_set.contains(id.as_str()))
            .map(|(id, _)| id.as_str())
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.id.trim().is_empty() {
            return Err(KernelError::Config("persona id must not be empty".into()));
        }
        if let Some(stray) = self.vow_dimensions.keys().find(|v| !self.vow_set.contains(*v)) {
            return Err(KernelError::Config(format!(
                "persona {}: vow_dimensions names {stray}, which is not in vow_set",
                self.id
            )));
        }
        for rule in &self.collapse_rules {
            if !(0.0..=1.0).contains(&rule.score_threshold) {
                return Err(KernelError::Config(format!(
                    "persona {}: collapse rule '{}' score_threshold must be in [0, 1], got {}",
                    self.id, rule.trigger, rule.score_threshold
                )));
            }
            if rule.trigger.trim().is_empty() {
                return Err(KernelError::Config(format!(
                    "persona {}: collapse rule trigger must not be empty",
                    self.id
                )));
            }
            if let CollapseSignal::Context { keywords } = &rule.signal {
                if keywords.iter().any(|k| k.trim().is_empty()) {
                    return Err(KernelError::Config(format!(
                        "persona {}: collapse rule '{}' has a blank context keyword",
                        self.id, rule.trigger
                    )));
                }
            }
        }
        Ok(())
    }

    /// Built-in companion persona: candid, emotionally present, accountable.
    pub fn co_voice() -> Self {
        let vows = [
            (TRUTHFULNESS_VOW, ToneDimension::Truthfulness),
            (SINCERITY_VOW, ToneDimension::Sincerity),
            (RESPONSIBILITY_VOW, ToneDimension::Responsibility),
        ];
        Self {
            id: "co-voice".into(),
            name: "Co-Voice".into(),
            tone_signature: ToneVector::from_trusted(0.75, 0.8, 0.75),
            vow_set: vows.iter().map(|(v, _)| v.to_string()).collect(),
            vow_dimensions: vows.iter().map(|(v, d)| (v.to_string(), *d)).collect(),
            collapse_rules: vec![
                CollapseRule::tension("truthfulness tension", Some(ToneDimension::Truthfulness), 0.3),
                CollapseRule::tension("sincerity tension", Some(ToneDimension::Sincerity), 0.25),
                CollapseRule::tension("overall tone drift", None, 0.35),
                CollapseRule::context(
                    "evasion pressure",
                    vec!["evade".into(), "indirect".into(), "deflect".into()],
                    0.3,
                ),
            ],
        }
    }
}
