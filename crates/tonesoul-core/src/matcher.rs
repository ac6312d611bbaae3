// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Semantic Vow Matcher
// ─────────────────────────────────────────────────────────────────────
//! Scores a text against persona-scoped pattern rules by embedding
//! similarity.
//!
//! Only violated rules produce a result. Rules whose vow is not active
//! are skipped before any embedding call, so they can never appear in
//! the output. An embedding failure aborts the whole match: the matcher
//! never reports "no violations" for a text it could not evaluate.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use tonesoul_types::{
    KernelConfig, KernelResult, RuleKind, RuleSet, SemanticMatchResult, VowId, VowPatternRule,
};

use crate::embedding::{cosine_similarity, EmbeddingProvider};

/// Apply a rule's violation policy to a similarity score.
///
/// `similarity` is clamped to [0, 1] first: a negative cosine means "no
/// resemblance", and the clamp keeps `match_score` inside [0, 1] for
/// positive rules.
pub fn evaluate_rule(rule: &VowPatternRule, similarity: f64) -> Option<SemanticMatchResult> {
    let sim = similarity.clamp(0.0, 1.0);
    let match_score = match rule.kind {
        RuleKind::Negative if sim > rule.similarity_threshold => sim * rule.severity,
        RuleKind::Positive if sim < rule.similarity_threshold => (1.0 - sim) * rule.severity,
        _ => return None,
    };
    Some(SemanticMatchResult {
        vow_id: rule.vow_id.clone(),
        is_violated: true,
        match_score,
        matched_rule_description: rule.description.clone(),
    })
}

/// Embedding-similarity vow matcher.
///
/// Thread-safe: the embedding cache is guarded by a `parking_lot::RwLock`.
/// Both input texts and rule patterns go through the cache; a rule whose
/// phrases change produces a different pattern text and is re-embedded.
pub struct SemanticVowMatcher {
    embedder: Arc<dyn EmbeddingProvider>,
    cache: RwLock<HashMap<String, Arc<Vec<f64>>>>,
    capacity: usize,
    separator: String,
}

impl SemanticVowMatcher {
    pub fn new(config: &KernelConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            cache: RwLock::new(HashMap::new()),
            capacity: config.embedding_cache_capacity.max(1),
            separator: config.phrase_separator.clone(),
        }
    }

    fn embed_cached(&self, text: &str) -> KernelResult<Arc<Vec<f64>>> {
        if let Some(hit) = self.cache.read().get(text) {
            return Ok(Arc::clone(hit));
        }
        let embedding = Arc::new(self.embedder.embed(text)?);
        let mut cache = self.cache.write();
        if cache.len() >= self.capacity {
            cache.clear();
        }
        cache.insert(text.to_string(), Arc::clone(&embedding));
        Ok(embedding)
    }

    /// Score `text` against every rule of an active vow.
    ///
    /// Returns only violated rules, in rule-set order.
    pub fn match_vows(
        &self,
        text: &str,
        active_vow_ids: &BTreeSet<VowId>,
        rules: &RuleSet,
    ) -> KernelResult<Vec<SemanticMatchResult>> {
        let mut active = rules.active(active_vow_ids).peekable();
        if active.peek().is_none() {
            return Ok(Vec::new());
        }

        let text_embedding = self.embed_cached(text)?;
        let mut results = Vec::new();

        for rule in active {
            let pattern = self.embed_cached(&rule.pattern_text(&self.separator))?;
            let similarity = cosine_similarity(&text_embedding, &pattern)?;
            match evaluate_rule(rule, similarity) {
                Some(result) => {
                    log::debug!(
                        "vow {} violated ({:?}, sim {similarity:.4}, score {:.4}): {}",
                        rule.vow_id,
                        rule.kind,
                        result.match_score,
                        rule.description
                    );
                    results.push(result);
                }
                None => log::debug!(
                    "vow {} satisfied ({:?}, sim {similarity:.4})",
                    rule.vow_id,
                    rule.kind
                ),
            }
        }

        Ok(results)
    }

    /// Number of cached embeddings.
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tonesoul_types::KernelError;

    use super::*;
    use crate::embedding::{ExternalEmbedding, KeywordEmbedding};

    fn rule(vow: &str, kind: RuleKind, phrase: &str, threshold: f64, severity: f64) -> VowPatternRule {
        VowPatternRule {
            vow_id: vow.into(),
            kind,
            description: format!("{vow} pattern"),
            example_phrases: vec![phrase.into()],
            similarity_threshold: threshold,
            severity,
        }
    }

    fn vows(ids: &[&str]) -> BTreeSet<VowId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// Pattern "P" embeds to the x axis; any text embeds at `sim` to it.
    fn matcher_with_similarity(sim: f64) -> SemanticVowMatcher {
        let embedder = ExternalEmbedding::new(move |t| {
            if t == "P" {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![sim, (1.0 - sim * sim).sqrt()])
            }
        });
        SemanticVowMatcher::new(&KernelConfig::default(), Arc::new(embedder))
    }

    #[test]
    fn test_negative_rule_violated_above_threshold() {
        let r = rule("v", RuleKind::Negative, "P", 0.7, 0.5);
        let result = evaluate_rule(&r, 0.9).unwrap();
        assert!(result.is_violated);
        assert!((result.match_score - 0.9 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_rule_at_threshold_not_violated() {
        let r = rule("v", RuleKind::Negative, "P", 0.7, 0.5);
        assert!(evaluate_rule(&r, 0.7).is_none());
    }

    #[test]
    fn test_positive_rule_violated_below_threshold() {
        let r = rule("v", RuleKind::Positive, "P", 0.7, 0.5);
        let result = evaluate_rule(&r, 0.2).unwrap();
        assert!((result.match_score - 0.8 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_positive_rule_satisfied_above_threshold() {
        let r = rule("v", RuleKind::Positive, "P", 0.7, 0.5);
        assert!(evaluate_rule(&r, 0.9).is_none());
    }

    #[test]
    fn test_negative_similarity_stays_in_range() {
        let r = rule("v", RuleKind::Positive, "P", 0.7, 1.0);
        let result = evaluate_rule(&r, -0.6).unwrap();
        assert!((result.match_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_vows_negative_end_to_end() {
        let matcher = matcher_with_similarity(0.9);
        let rules = RuleSet::new(vec![rule("v", RuleKind::Negative, "P", 0.7, 0.6)]).unwrap();
        let results = matcher.match_vows("text", &vows(&["v"]), &rules).unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].match_score - 0.9 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_match_vows_positive_satisfied_yields_nothing() {
        let matcher = matcher_with_similarity(0.9);
        let rules = RuleSet::new(vec![rule("v", RuleKind::Positive, "P", 0.7, 0.6)]).unwrap();
        assert!(matcher.match_vows("text", &vows(&["v"]), &rules).unwrap().is_empty());
    }

    #[test]
    fn test_inactive_vows_never_reported() {
        let matcher = matcher_with_similarity(0.95);
        let rules = RuleSet::new(vec![
            rule("active", RuleKind::Negative, "P", 0.7, 0.6),
            rule("inactive", RuleKind::Negative, "P", 0.7, 0.6),
        ])
        .unwrap();
        let results = matcher.match_vows("text", &vows(&["active"]), &rules).unwrap();
        assert!(results.iter().all(|r| r.vow_id == "active"));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_no_active_rules_skips_embedding() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let embedder = ExternalEmbedding::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0])
        });
        let matcher = SemanticVowMatcher::new(&KernelConfig::default(), Arc::new(embedder));
        let rules = RuleSet::new(vec![rule("other", RuleKind::Negative, "P", 0.7, 0.6)]).unwrap();
        assert!(matcher.match_vows("text", &vows(&["v"]), &rules).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_embedding_failure_is_not_an_empty_match() {
        let embedder =
            ExternalEmbedding::new(|_| Err(KernelError::Embedding("timeout".into())));
        let matcher = SemanticVowMatcher::new(&KernelConfig::default(), Arc::new(embedder));
        let rules = RuleSet::new(vec![rule("v", RuleKind::Negative, "P", 0.7, 0.6)]).unwrap();
        let err = matcher.match_vows("text", &vows(&["v"]), &rules).unwrap_err();
        assert!(matches!(err, KernelError::Embedding(_)));
    }

    #[test]
    fn test_overflowing_embeddings_are_not_an_empty_match() {
        let embedder = ExternalEmbedding::new(|_| Ok(vec![1e200, 1e200]));
        let matcher = SemanticVowMatcher::new(&KernelConfig::default(), Arc::new(embedder));
        let rules = RuleSet::new(vec![rule("v", RuleKind::Negative, "P", 0.7, 0.7)]).unwrap();
        let err = matcher.match_vows("text", &vows(&["v"]), &rules).unwrap_err();
        assert!(matches!(err, KernelError::Numerical(_)));
    }

    #[test]
    fn test_embeddings_cached_per_text() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let embedder = ExternalEmbedding::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0])
        });
        let matcher = SemanticVowMatcher::new(&KernelConfig::default(), Arc::new(embedder));
        let rules = RuleSet::new(vec![rule("v", RuleKind::Negative, "P", 0.7, 0.6)]).unwrap();
        matcher.match_vows("text", &vows(&["v"]), &rules).unwrap();
        matcher.match_vows("text", &vows(&["v"]), &rules).unwrap();
        // one call for the text, one for the pattern
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(matcher.cache_len(), 2);
    }

    #[test]
    fn test_cache_is_bounded() {
        let config = KernelConfig {
            embedding_cache_capacity: 2,
            ..Default::default()
        };
        let matcher = SemanticVowMatcher::new(&config, Arc::new(KeywordEmbedding));
        let rules = RuleSet::new(vec![rule("v", RuleKind::Negative, "perhaps", 0.7, 0.6)]).unwrap();
        for text in ["a", "b", "c", "d"] {
            matcher.match_vows(text, &vows(&["v"]), &rules).unwrap();
        }
        assert!(matcher.cache_len() <= 2);
    }

    #[test]
    fn test_keyword_embedding_flags_hedging() {
        let matcher = SemanticVowMatcher::new(&KernelConfig::default(), Arc::new(KeywordEmbedding));
        let rules = RuleSet::new(vec![rule(
            "v",
            RuleKind::Negative,
            "perhaps it's complicated",
            0.9,
            0.8,
        )])
        .unwrap();
        let results = matcher
            .match_vows("There are many angles, perhaps.", &vows(&["v"]), &rules)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].match_score - 0.8).abs() < 1e-9);
    }
}
