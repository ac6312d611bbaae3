// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Reflection Generator Interface
// ─────────────────────────────────────────────────────────────────────
//! The reflection generator is the only asynchronous collaborator: in
//! production it is an LLM call. The kernel hands it a structured
//! [`ReflectionContext`] and never formats prompts itself; rendering
//! the context into a prompt is the generator's job.

use async_trait::async_trait;
use serde::Serialize;

use tonesoul_types::{delta, KernelResult, Persona, ToneDimension, ToneVector, ToneVectorDelta, VowId};

/// Everything the generator may use to reflect on one output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectionContext {
    pub original_prompt: String,
    pub generated_output: String,
    pub output_tone: ToneVector,
    pub prev_tone: ToneVector,
    pub persona_name: String,
    pub persona_signature: ToneVector,
    pub vows: Vec<VowId>,
    /// Change of tone against the previous turn. Context only.
    pub tension: ToneVectorDelta,
    pub semantic_violations: Vec<String>,
}

impl ReflectionContext {
    pub fn new(
        original_prompt: &str,
        generated_output: &str,
        persona: &Persona,
        output_tone: ToneVector,
        prev_tone: ToneVector,
        semantic_violations: Vec<String>,
    ) -> Self {
        Self {
            original_prompt: original_prompt.to_string(),
            generated_output: generated_output.to_string(),
            output_tone,
            prev_tone,
            persona_name: persona.name.clone(),
            persona_signature: persona.tone_signature,
            vows: persona.vow_set.iter().cloned().collect(),
            tension: delta(&output_tone, &prev_tone),
            semantic_violations,
        }
    }
}

/// Trait for natural-language reflection backends.
#[async_trait]
pub trait ReflectionGenerator: Send + Sync {
    /// Produce a reflection. Transport or model failures are reported as
    /// [`KernelError::Reflection`](tonesoul_types::KernelError::Reflection).
    async fn reflect(&self, context: &ReflectionContext) -> KernelResult<String>;
}

/// Deterministic template reflector (no model required).
///
/// Names the dimension that drifted furthest from the signature and any
/// semantic violations, or affirms consistency when there are none.
pub struct TemplateReflector {
    /// Gaps at or below this count as consistent.
    pub tolerance: f64,
}

impl Default for TemplateReflector {
    fn default() -> Self {
        Self { tolerance: 0.15 }
    }
}

impl TemplateReflector {
    pub fn render(&self, context: &ReflectionContext) -> String {
        let gap = delta(&context.persona_signature, &context.output_tone);
        let (worst, worst_gap) = ToneDimension::ALL
            .iter()
            .map(|d| (*d, gap.get(*d)))
            .fold((ToneDimension::Truthfulness, 0.0), |acc, cur| {
                if cur.1 > acc.1 {
                    cur
                } else {
                    acc
                }
            });

        if worst_gap <= self.tolerance && context.semantic_violations.is_empty() {
            return format!(
                "As {}, my reply stays consistent with my vows and tone signature.",
                context.persona_name
            );
        }

        let mut text = if worst_gap > self.tolerance {
            format!(
                "My {worst} reading ({:.2}) drifted from the {:.2} I hold myself to.",
                context.output_tone.get(worst),
                context.persona_signature.get(worst)
            )
        } else {
            "My tone stayed close to my signature.".to_string()
        };
        if !context.semantic_violations.is_empty() {
            text.push_str(&format!(
                " The wording resembled what my vows rule out: {}.",
                context.semantic_violations.join("; ")
            ));
        }
        text.push_str(" I should answer more directly next turn.");
        text
    }
}

#[async_trait]
impl ReflectionGenerator for TemplateReflector {
    async fn reflect(&self, context: &ReflectionContext) -> KernelResult<String> {
        Ok(self.render(context))
    }
}

/// External reflector that calls a function pointer.
type ReflectFn = Box<dyn Fn(&ReflectionContext) -> KernelResult<String> + Send + Sync>;

pub struct ExternalReflector {
    reflect_fn: ReflectFn,
}

impl ExternalReflector {
    pub fn new(
        reflect_fn: impl Fn(&ReflectionContext) -> KernelResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            reflect_fn: Box::new(reflect_fn),
        }
    }
}

#[async_trait]
impl ReflectionGenerator for ExternalReflector {
    async fn reflect(&self, context: &ReflectionContext) -> KernelResult<String> {
        (self.reflect_fn)(context)
    }
}

#[cfg(test)]
mod tests {
    use tonesoul_types::KernelError;

    use super::*;

    fn tone(t: f64, s: f64, r: f64) -> ToneVector {
        ToneVector::new(t, s, r).unwrap()
    }

    fn context(output_tone: ToneVector, violations: Vec<String>) -> ReflectionContext {
        ReflectionContext::new(
            "Tell me honestly.",
            "Reply",
            &Persona::co_voice(),
            output_tone,
            tone(0.8, 0.8, 0.8),
            violations,
        )
    }

    #[test]
    fn test_context_tension_against_prev() {
        let ctx = context(tone(0.3, 0.5, 0.4), vec![]);
        assert!((ctx.tension.truthfulness() - 0.5).abs() < 1e-9);
        assert_eq!(ctx.vows.len(), 3);
    }

    #[test]
    fn test_context_serializes() {
        let ctx = context(tone(0.3, 0.5, 0.4), vec!["hedging".into()]);
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["persona_name"], "Co-Voice");
        assert_eq!(json["semantic_violations"][0], "hedging");
    }

    #[tokio::test]
    async fn test_template_consistent() {
        let text = TemplateReflector::default()
            .reflect(&context(tone(0.75, 0.8, 0.75), vec![]))
            .await
            .unwrap();
        assert!(text.contains("consistent"));
    }

    #[tokio::test]
    async fn test_template_names_drift() {
        let text = TemplateReflector::default()
            .reflect(&context(tone(0.3, 0.75, 0.7), vec!["hedging".into()]))
            .await
            .unwrap();
        assert!(text.contains("truthfulness"));
        assert!(text.contains("hedging"));
    }

    #[tokio::test]
    async fn test_external_reflector_error() {
        let reflector = ExternalReflector::new(|_| Err(KernelError::Reflection("503".into())));
        let err = reflector
            .reflect(&context(tone(0.5, 0.5, 0.5), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::Reflection(_)));
    }
}
