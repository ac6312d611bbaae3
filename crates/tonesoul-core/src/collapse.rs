// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Collapse Predictor
// ─────────────────────────────────────────────────────────────────────
//! Turns tone tension and optional context hint tags into collapse-risk
//! hotspots using the persona's declared collapse rules.
//!
//! Each rule is evaluated independently. A hotspot is emitted only when
//! the rule's signal strictly exceeds its threshold; absence means "not
//! currently at risk". Output follows rule order; use
//! [`rank_hotspots`](tonesoul_types::rank_hotspots) for a ranked view.

use tonesoul_types::{
    delta, CollapseHotspot, CollapseRule, CollapseSignal, Persona, ToneVector, ToneVectorDelta,
};

/// Signal value in [0, 1] a collapse rule watches.
pub fn rule_signal(rule: &CollapseRule, tension: &ToneVectorDelta, external_hints: &[String]) -> f64 {
    match &rule.signal {
        CollapseSignal::Tension { dimension: Some(d) } => tension.get(*d),
        CollapseSignal::Tension { dimension: None } => tension.magnitude(),
        CollapseSignal::Context { keywords } => {
            let keywords: Vec<String> = if keywords.is_empty() {
                vec![rule.trigger.trim().to_lowercase()]
            } else {
                keywords.iter().map(|k| k.trim().to_lowercase()).collect()
            };
            // a blank keyword is a substring of every hint
            let keywords: Vec<String> = keywords.into_iter().filter(|k| !k.is_empty()).collect();
            if keywords.is_empty() {
                return 0.0;
            }
            let hints: Vec<String> = external_hints.iter().map(|h| h.to_lowercase()).collect();
            let hits = keywords
                .iter()
                .filter(|k| hints.iter().any(|h| h.contains(k.as_str())))
                .count();
            hits as f64 / keywords.len() as f64
        }
    }
}

/// Collapse-risk predictor. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapsePredictor;

impl CollapsePredictor {
    pub fn new() -> Self {
        Self
    }

    /// Tension between two turns; the same operator as [`delta`].
    pub fn calculate_tension(&self, prev: &ToneVector, current: &ToneVector) -> ToneVectorDelta {
        delta(prev, current)
    }

    pub fn predict_collapse(
        &self,
        tension: &ToneVectorDelta,
        persona: &Persona,
        external_hints: &[String],
    ) -> Vec<CollapseHotspot> {
        persona
            .collapse_rules
            .iter()
            .filter_map(|rule| {
                let signal = rule_signal(rule, tension, external_hints);
                if signal > rule.score_threshold {
                    log::debug!(
                        "collapse hotspot '{}' ({signal:.4} > {})",
                        rule.trigger,
                        rule.score_threshold
                    );
                    Some(CollapseHotspot {
                        cause: rule.trigger.clone(),
                        collapse_score: signal,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}
