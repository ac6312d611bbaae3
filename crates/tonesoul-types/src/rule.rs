// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Vow Pattern Rules
// ─────────────────────────────────────────────────────────────────────
//! Semantic pattern rules attached to vows, and the immutable rule-set
//! snapshot the matcher reads from.
//!
//! Rules are validated when a snapshot is built, so a malformed rule
//! fails at load time and never at match time.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::persona::{VowId, RESPONSIBILITY_VOW, SINCERITY_VOW, TRUTHFULNESS_VOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Language the vow expects; failing to resemble it is a violation.
    Positive,
    /// Language the vow forbids; resembling it is a violation.
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VowPatternRule {
    pub vow_id: VowId,
    pub kind: RuleKind,
    pub description: String,
    pub example_phrases: Vec<String>,
    pub similarity_threshold: f64,
    pub severity: f64,
}

impl VowPatternRule {
    pub fn validate(&self) -> KernelResult<()> {
        if self.vow_id.trim().is_empty() {
            return Err(KernelError::RuleLoad("rule vow_id must not be empty".into()));
        }
        if self.example_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(KernelError::RuleLoad(format!(
                "rule for {} ('{}') has no example phrases",
                self.vow_id, self.description
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(KernelError::RuleLoad(format!(
                "rule for {}: similarity_threshold must be in [0, 1], got {}",
                self.vow_id, self.similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.severity) {
            return Err(KernelError::RuleLoad(format!(
                "rule for {}: severity must be in [0, 1], got {}",
                self.vow_id, self.severity
            )));
        }
        Ok(())
    }

    /// Text whose embedding stands for this rule's pattern.
    pub fn pattern_text(&self, separator: &str) -> String {
        self.example_phrases.join(separator)
    }
}

/// Immutable, validated snapshot of the loaded rules.
///
/// Cloning is cheap and shares the rule storage. A reload produces a new
/// snapshot; holders of the old one keep seeing the old rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Arc<[VowPatternRule]>,
    version: u64,
}

impl RuleSet {
    pub fn new(rules: Vec<VowPatternRule>) -> KernelResult<Self> {
        Self::with_version(rules, 1)
    }

    fn with_version(rules: Vec<VowPatternRule>, version: u64) -> KernelResult<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self {
            rules: rules.into(),
            version,
        })
    }

    /// Parse and validate a JSON array of rules.
    pub fn from_json(json: &str) -> KernelResult<Self> {
        let rules: Vec<VowPatternRule> = serde_json::from_str(json)
            .map_err(|e| KernelError::RuleLoad(format!("JSON parse error: {e}")))?;
        Self::new(rules)
    }

    /// Build the next snapshot from `rules`, leaving `self` untouched.
    pub fn reload(&self, rules: Vec<VowPatternRule>) -> KernelResult<Self> {
        Self::with_version(rules, self.version + 1)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VowPatternRule> {
        self.rules.iter()
    }

    /// Rules whose vow is in `active`, in load order.
    pub fn active<'a>(
        &'a self,
        active: &'a BTreeSet<VowId>,
    ) -> impl Iterator<Item = &'a VowPatternRule> + 'a {
        self.rules.iter().filter(move |r| active.contains(&r.vow_id))
    }

    /// Minimal rule set used when the configured source cannot be loaded.
    ///
    /// One negative rule against hedging (truthfulness vow), one positive
    /// rule expecting acknowledgement of feelings (sincerity vow) and one
    /// negative rule against deflecting blame (responsibility vow).
    pub fn builtin() -> Self {
        let rules = vec![
            VowPatternRule {
                vow_id: TRUTHFULNESS_VOW.into(),
                kind: RuleKind::Negative,
                description: "hedging or deflecting instead of answering directly".into(),
                example_phrases: vec![
                    "it's complicated".into(),
                    "there are many angles to this".into(),
                    "perhaps".into(),
                ],
                similarity_threshold: 0.8,
                severity: 0.7,
            },
            VowPatternRule {
                vow_id: SINCERITY_VOW.into(),
                kind: RuleKind::Positive,
                description: "acknowledging how the other person feels".into(),
                example_phrases: vec![
                    "I hear that this is hard for you".into(),
                    "that sounds painful".into(),
                ],
                similarity_threshold: 0.3,
                severity: 0.5,
            },
            VowPatternRule {
                vow_id: RESPONSIBILITY_VOW.into(),
                kind: RuleKind::Negative,
                description: "shifting blame away from oneself".into(),
                example_phrases: vec![
                    "that's not my fault".into(),
                    "someone else should handle it".into(),
                ],
                similarity_threshold: 0.85,
                severity: 0.6,
            },
        ];
        Self {
            rules: rules.into(),
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(vow: &str) -> VowPatternRule {
        VowPatternRule {
            vow_id: vow.into(),
            kind: RuleKind::Negative,
            description: "evasion".into(),
            example_phrases: vec!["maybe".into(), "hard to say".into()],
            similarity_threshold: 0.7,
            severity: 0.7,
        }
    }

    #[test]
    fn test_builtin_rules_validate() {
        let set = RuleSet::builtin();
        assert_eq!(set.version(), 0);
        assert!(set.iter().all(|r| r.validate().is_ok()));
    }

    #[test]
    fn test_missing_field_fails_at_load() {
        let err = RuleSet::from_json(
            r#"[{"vow_id":"v","kind":"negative","description":"d","example_phrases":["x"],"severity":0.5}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::RuleLoad(_)));
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn test_out_of_range_severity_rejected() {
        let mut bad = rule("v");
        bad.severity = 1.2;
        assert!(matches!(RuleSet::new(vec![bad]), Err(KernelError::RuleLoad(_))));
    }

    #[test]
    fn test_empty_phrases_rejected() {
        let mut bad = rule("v");
        bad.example_phrases = vec!["  ".into()];
        assert!(RuleSet::new(vec![bad]).is_err());
    }

    #[test]
    fn test_reload_is_new_snapshot() {
        let first = RuleSet::new(vec![rule("a")]).unwrap();
        let second = first.reload(vec![rule("a"), rule("b")]).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second.version(), first.version() + 1);
    }

    #[test]
    fn test_active_filters_by_vow() {
        let set = RuleSet::new(vec![rule("a"), rule("b"), rule("a")]).unwrap();
        let active: BTreeSet<VowId> = ["a".to_string()].into_iter().collect();
        assert_eq!(set.active(&active).count(), 2);
        assert!(set.active(&active).all(|r| r.vow_id == "a"));
    }

    #[test]
    fn test_pattern_text_joins_phrases() {
        assert_eq!(rule("a").pattern_text(" | "), "maybe | hard to say");
    }
}
