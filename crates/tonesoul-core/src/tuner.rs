// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Reflective Vow Tuner
// ─────────────────────────────────────────────────────────────────────
//! Structured self-assessment of a generated output and the tone
//! correction hint derived from it.
//!
//! The numeric feedback reuses the integrity checker's semantic results
//! instead of re-running the matcher, so one turn costs one matcher
//! pass. The reflection text comes from an external generator under a
//! deadline; its failure is flagged on the feedback and never blocks the
//! numeric result.

use std::sync::Arc;
use std::time::Duration;

use tonesoul_types::{
    delta, KernelConfig, KernelError, PartialToneVector, Persona, ReflectionStatus,
    ReflectiveVowFeedback, SemanticMatchResult, ToneCorrectionHint, ToneDimension, ToneVector,
};

use crate::integrity::assess_vows;
use crate::reflection::{ReflectionContext, ReflectionGenerator};

pub const BEHAVIOR_MAINTAIN: &str = "Maintain the current tone and keep monitoring.";
pub const BEHAVIOR_GENERIC: &str = "Adjust tone to honour the persona's vows.";
pub const BEHAVIOR_TRUTHFULNESS: &str = "Be more candid: cut hedging and evasion, answer directly.";
pub const BEHAVIOR_SINCERITY: &str = "Connect with the other person's feelings and respond with empathy.";
pub const BEHAVIOR_RESPONSIBILITY: &str = "Own the outcome: acknowledge limits and take responsibility.";

fn behavior_for(dimension: ToneDimension) -> &'static str {
    match dimension {
        ToneDimension::Truthfulness => BEHAVIOR_TRUTHFULNESS,
        ToneDimension::Sincerity => BEHAVIOR_SINCERITY,
        ToneDimension::Responsibility => BEHAVIOR_RESPONSIBILITY,
    }
}

/// Largest adjustment up to `nudge` whose sum with `base` stays <= 1.0.
///
/// For `base` in [0, 1], `(1.0 - base) + base` rounds to at most 1.0, so
/// the headroom needs no further correction.
fn bounded_nudge(nudge: f64, base: f64) -> f64 {
    nudge.min(1.0 - base).max(0.0)
}

/// Inputs for one reflection.
#[derive(Debug, Clone, Copy)]
pub struct ReflectionInput<'a> {
    pub original_prompt: &'a str,
    pub generated_output: &'a str,
    pub persona: &'a Persona,
    pub output_tone: ToneVector,
    pub prev_tone: ToneVector,
    /// Semantic results already computed by the integrity checker.
    pub semantic_matches: &'a [SemanticMatchResult],
}

pub struct ReflectiveTuner {
    config: KernelConfig,
    generator: Arc<dyn ReflectionGenerator>,
}

impl ReflectiveTuner {
    pub fn new(config: KernelConfig, generator: Arc<dyn ReflectionGenerator>) -> Self {
        Self { config, generator }
    }

    /// Numeric half of the feedback; the reflection text is left empty
    /// and `reflection_status` is set by the caller.
    fn numeric_feedback(&self, input: &ReflectionInput<'_>) -> ReflectiveVowFeedback {
        let signature_gap = delta(&input.persona.tone_signature, &input.output_tone);
        let assessment = assess_vows(
            input.persona,
            &signature_gap,
            input.semantic_matches,
            &self.config,
        );

        let mut integrity_delta = signature_gap.mean().max(assessment.peak);
        if !assessment.violations.is_empty() {
            integrity_delta = integrity_delta.max(self.config.violation_integrity_floor);
        }
        let requires_correction = integrity_delta > self.config.correction_threshold
            || !assessment.violations.is_empty();

        ReflectiveVowFeedback {
            reflection_text: String::new(),
            integrity_delta,
            violated_vows_in_reflection: assessment.violations,
            requires_correction,
            reflection_status: ReflectionStatus::Generated,
        }
    }

    /// Produce the self-assessment for one output.
    ///
    /// Never fails: a generator error or timeout leaves `reflection_text`
    /// empty and is recorded in `reflection_status`.
    pub async fn generate_reflection(&self, input: ReflectionInput<'_>) -> ReflectiveVowFeedback {
        let mut feedback = self.numeric_feedback(&input);

        let context = ReflectionContext::new(
            input.original_prompt,
            input.generated_output,
            input.persona,
            input.output_tone,
            input.prev_tone,
            input
                .semantic_matches
                .iter()
                .filter(|m| m.is_violated)
                .map(|m| m.matched_rule_description.clone())
                .collect(),
        );

        let deadline = Duration::from_millis(self.config.reflection_timeout_ms);
        match tokio::time::timeout(deadline, self.generator.reflect(&context)).await {
            Ok(Ok(text)) => {
                feedback.reflection_text = text;
                feedback.reflection_status = ReflectionStatus::Generated;
            }
            Ok(Err(e)) => {
                log::warn!("Reflection generation failed, numeric feedback only: {e}");
                feedback.reflection_status = ReflectionStatus::Failed(e.to_string());
            }
            Err(_) => {
                let e = KernelError::ReflectionTimeout {
                    timeout_ms: self.config.reflection_timeout_ms,
                };
                log::warn!("{e}, numeric feedback only");
                feedback.reflection_status = ReflectionStatus::TimedOut;
            }
        }

        feedback
    }

    /// Forward-looking tone adjustment derived from `feedback`.
    ///
    /// Categories are evaluated truthfulness, sincerity, responsibility;
    /// when several fire, the last one's behaviour string wins. Untriggered
    /// dimensions stay unset.
    pub fn derive_tone_correction_hint(
        &self,
        feedback: &ReflectiveVowFeedback,
        persona: &Persona,
    ) -> ToneCorrectionHint {
        if !feedback.requires_correction {
            return ToneCorrectionHint {
                adjust_tone_vector: PartialToneVector::default(),
                recommended_behavior: BEHAVIOR_MAINTAIN.to_string(),
                apply_to_next_turn: false,
            };
        }

        let mut adjust = PartialToneVector::default();
        let mut behavior = BEHAVIOR_GENERIC;

        for dimension in ToneDimension::ALL {
            let triggered = feedback.touches(dimension)
                || (dimension == ToneDimension::Truthfulness
                    && feedback.integrity_delta > self.config.truthfulness_nudge_trigger);
            if !triggered {
                continue;
            }
            adjust.set(
                dimension,
                bounded_nudge(
                    self.config.nudges.get(dimension),
                    persona.tone_signature.get(dimension),
                ),
            );
            behavior = behavior_for(dimension);
        }

        ToneCorrectionHint {
            adjust_tone_vector: adjust,
            recommended_behavior: behavior.to_string(),
            apply_to_next_turn: true,
        }
    }

    /// Read-only access to config.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }
}
