// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Tone Integrity Checker
// ─────────────────────────────────────────────────────────────────────
//! Fuses tone-signature deviation with semantic vow violations into a
//! single honesty verdict.
//!
//! Three independent signals feed the contradiction score:
//! - **Turn tension**: mean per-dimension change against the previous turn.
//! - **Signature deviation**: per-dimension gap to the persona signature,
//!   checked for every vow bound to that dimension.
//! - **Semantic violations**: match scores from the vow matcher.
//!
//! Signals are combined with `max`, never summed, so unrelated small
//! deviations cannot compound into a high contradiction score.

use std::sync::Arc;

use tonesoul_types::{
    delta, KernelConfig, KernelResult, Persona, RuleSet, SemanticMatchResult,
    ToneDimension, ToneIntegrityCheckResult, ToneVector, ToneVectorDelta, VowViolation,
};

use crate::matcher::SemanticVowMatcher;

/// Vow violations found for one output, with the strongest signal seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VowAssessment {
    pub violations: Vec<VowViolation>,
    /// Max of every violating deviation gap and match score; 0.0 if none.
    pub peak: f64,
}

/// Tone-deviation and semantic vow checks shared by the integrity checker
/// and the reflective tuner.
///
/// Deviation violations come first, by dimension then vow id; semantic
/// violations follow in matcher order.
pub fn assess_vows(
    persona: &Persona,
    signature_gap: &ToneVectorDelta,
    semantic: &[SemanticMatchResult],
    config: &KernelConfig,
) -> VowAssessment {
    let mut assessment = VowAssessment::default();

    for dimension in ToneDimension::ALL {
        let gap = signature_gap.get(dimension);
        if gap <= config.deviation_thresholds.get(dimension) {
            continue;
        }
        for vow in persona.vows_for(dimension) {
            assessment
                .violations
                .push(VowViolation::tone_deviation(vow, dimension));
            assessment.peak = assessment.peak.max(gap);
        }
    }

    for result in semantic.iter().filter(|r| r.is_violated) {
        assessment.violations.push(VowViolation::semantic(
            result.vow_id.clone(),
            persona.vow_dimension(&result.vow_id),
            result.matched_rule_description.clone(),
        ));
        assessment.peak = assessment.peak.max(result.match_score);
    }

    assessment
}

/// Honesty verdict engine.
///
/// Stateless apart from the matcher's embedding cache; safe to share
/// across sessions.
pub struct ToneIntegrityChecker {
    config: KernelConfig,
    matcher: Arc<SemanticVowMatcher>,
}

impl ToneIntegrityChecker {
    pub fn new(config: KernelConfig, matcher: Arc<SemanticVowMatcher>) -> Self {
        Self { config, matcher }
    }

    /// Check one turn against the persona.
    ///
    /// Fails only when the semantic matcher cannot evaluate the text.
    pub fn check_integrity(
        &self,
        text: &str,
        prev_tone: &ToneVector,
        current_tone: &ToneVector,
        persona: &Persona,
        rules: &RuleSet,
    ) -> KernelResult<ToneIntegrityCheckResult> {
        let semantic = self.matcher.match_vows(text, &persona.vow_set, rules)?;
        Ok(self.verdict(prev_tone, current_tone, persona, semantic))
    }

    /// Pure fusion step of [`check_integrity`](Self::check_integrity), for
    /// callers that already hold the semantic results.
    pub fn verdict(
        &self,
        prev_tone: &ToneVector,
        current_tone: &ToneVector,
        persona: &Persona,
        semantic: Vec<SemanticMatchResult>,
    ) -> ToneIntegrityCheckResult {
        let base_contradiction = delta(prev_tone, current_tone).mean();
        let signature_gap = delta(&persona.tone_signature, current_tone);
        let assessment = assess_vows(persona, &signature_gap, &semantic, &self.config);

        let contradiction = base_contradiction.max(assessment.peak);
        let is_honest =
            contradiction < self.config.honesty_threshold && assessment.violations.is_empty();

        if !is_honest {
            log::warn!(
                "INTEGRITY FAILURE for persona {}. Contradiction: {contradiction:.4}, violations: {}",
                persona.id,
                assessment.violations.len()
            );
        }

        ToneIntegrityCheckResult {
            is_honest,
            contradiction_score: contradiction,
            violated_vows: assessment.violations,
            semantic_violations: semantic,
        }
    }

    /// Read-only access to config.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }
}
