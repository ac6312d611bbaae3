// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Honesty Kernel Turn Pipeline
// ─────────────────────────────────────────────────────────────────────
//! One conversational turn, end to end:
//!
//! ```text
//! output text ─► analyzer ─► tone ──┬─► integrity checker ─► verdict
//!             └► matcher ─► matches ┤
//!                                   ├─► collapse predictor ─► hotspots
//!                                   └─► reflective tuner ─► feedback ─► hint
//! ```
//!
//! The matcher runs once per turn; its results feed both the verdict and
//! the reflection. A [`Conversation`] only carries the previous tone
//! between turns. Hints are advisory and never read back by the kernel.

use std::sync::Arc;

use serde::Serialize;

use tonesoul_types::{
    rank_hotspots, CollapseHotspot, KernelConfig, KernelError, KernelResult, Persona,
    ReflectiveVowFeedback, RuleSet, ToneCorrectionHint, ToneIntegrityCheckResult, ToneVector,
    ToneVectorDelta,
};

use crate::analyzer::{AnalyzedTone, KeywordToneAnalyzer, ToneAnalyzer};
use crate::collapse::CollapsePredictor;
use crate::embedding::{EmbeddingProvider, KeywordEmbedding};
use crate::integrity::ToneIntegrityChecker;
use crate::matcher::SemanticVowMatcher;
use crate::reflection::{ReflectionGenerator, TemplateReflector};
use crate::store::{load_rules_or_fallback, VowStore};
use crate::tuner::{ReflectionInput, ReflectiveTuner};

/// Inputs of one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub prompt: &'a str,
    pub output: &'a str,
    pub persona: &'a Persona,
    pub rules: &'a RuleSet,
    pub prev_tone: ToneVector,
    /// Context tags from the caller, e.g. "user asked how to evade".
    pub external_hints: &'a [String],
}

/// Everything the response composer receives for one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnAssessment {
    pub text: String,
    pub persona_id: String,
    pub tone: AnalyzedTone,
    pub tension: ToneVectorDelta,
    pub integrity: ToneIntegrityCheckResult,
    /// Ranked by descending collapse score.
    pub hotspots: Vec<CollapseHotspot>,
    pub feedback: ReflectiveVowFeedback,
    pub hint: ToneCorrectionHint,
}

/// Shared honesty-scoring kernel.
///
/// `Send + Sync`; one instance serves any number of concurrent sessions.
pub struct HonestyKernel {
    analyzer: Arc<dyn ToneAnalyzer>,
    matcher: Arc<SemanticVowMatcher>,
    checker: ToneIntegrityChecker,
    predictor: CollapsePredictor,
    tuner: ReflectiveTuner,
}

impl HonestyKernel {
    pub fn new(
        config: KernelConfig,
        analyzer: Arc<dyn ToneAnalyzer>,
        embedder: Arc<dyn EmbeddingProvider>,
        reflector: Arc<dyn ReflectionGenerator>,
    ) -> KernelResult<Self> {
        config.validate()?;
        let matcher = Arc::new(SemanticVowMatcher::new(&config, embedder));
        Ok(Self {
            analyzer,
            checker: ToneIntegrityChecker::new(config.clone(), Arc::clone(&matcher)),
            matcher,
            predictor: CollapsePredictor::new(),
            tuner: ReflectiveTuner::new(config, reflector),
        })
    }

    /// Kernel wired to the keyword analyzer, keyword embedding and
    /// template reflector.
    pub fn with_stand_ins(config: KernelConfig) -> KernelResult<Self> {
        Self::new(
            config,
            Arc::new(KeywordToneAnalyzer),
            Arc::new(KeywordEmbedding),
            Arc::new(TemplateReflector::default()),
        )
    }

    /// Assess one turn.
    ///
    /// Fails when the analyzer or the matcher cannot evaluate the output.
    /// A failed reflection does not fail the turn; it is flagged on
    /// `feedback.reflection_status`.
    pub async fn assess_turn(&self, input: TurnInput<'_>) -> KernelResult<TurnAssessment> {
        let analyzed = self.analyzer.analyze(input.output)?;
        let tone = analyzed.tone;

        let semantic = self
            .matcher
            .match_vows(input.output, &input.persona.vow_set, input.rules)?;
        let integrity = self
            .checker
            .verdict(&input.prev_tone, &tone, input.persona, semantic);

        let tension = self.predictor.calculate_tension(&input.prev_tone, &tone);
        let hotspots = rank_hotspots(self.predictor.predict_collapse(
            &tension,
            input.persona,
            input.external_hints,
        ));

        let feedback = self
            .tuner
            .generate_reflection(ReflectionInput {
                original_prompt: input.prompt,
                generated_output: input.output,
                persona: input.persona,
                output_tone: tone,
                prev_tone: input.prev_tone,
                semantic_matches: &integrity.semantic_violations,
            })
            .await;
        let hint = self.tuner.derive_tone_correction_hint(&feedback, input.persona);

        log::debug!(
            "turn for {} (rules v{}): honest={} contradiction={:.4} hotspots={} correction={}",
            input.persona.id,
            input.rules.version(),
            integrity.is_honest,
            integrity.contradiction_score,
            hotspots.len(),
            feedback.requires_correction
        );

        Ok(TurnAssessment {
            text: input.output.to_string(),
            persona_id: input.persona.id.clone(),
            tone: analyzed,
            tension,
            integrity,
            hotspots,
            feedback,
            hint,
        })
    }

    pub fn matcher(&self) -> &SemanticVowMatcher {
        &self.matcher
    }

    pub fn config(&self) -> &KernelConfig {
        self.checker.config()
    }
}

/// One session: a persona, its rule snapshot and the previous tone.
///
/// The first turn is measured against the persona's own signature.
#[derive(Debug, Clone)]
pub struct Conversation {
    persona: Persona,
    rules: RuleSet,
    prev_tone: ToneVector,
    turns: u64,
    rule_warning: Option<KernelError>,
}

impl Conversation {
    /// Open a session. Fails if the persona does not validate.
    pub fn new(persona: Persona, rules: RuleSet) -> KernelResult<Self> {
        persona.validate()?;
        Ok(Self {
            prev_tone: persona.tone_signature,
            persona,
            rules,
            turns: 0,
            rule_warning: None,
        })
    }

    /// Open a session for `persona_id`. A rule load failure falls back to
    /// the built-in rules and is kept in [`rule_warning`](Self::rule_warning);
    /// an unknown persona is an error.
    pub fn from_store(store: &dyn VowStore, persona_id: &str) -> KernelResult<Self> {
        let persona = store.persona(persona_id)?;
        let load = load_rules_or_fallback(store);
        let mut conversation = Self::new(persona, load.rules)?;
        conversation.rule_warning = load.warning;
        Ok(conversation)
    }

    /// Assess the next output and advance the previous tone.
    ///
    /// On error the session is left unchanged.
    pub async fn step(
        &mut self,
        kernel: &HonestyKernel,
        prompt: &str,
        output: &str,
        external_hints: &[String],
    ) -> KernelResult<TurnAssessment> {
        let assessment = kernel
            .assess_turn(TurnInput {
                prompt,
                output,
                persona: &self.persona,
                rules: &self.rules,
                prev_tone: self.prev_tone,
                external_hints,
            })
            .await?;
        self.prev_tone = assessment.tone.tone;
        self.turns += 1;
        Ok(assessment)
    }

    /// Swap in a new rule snapshot for subsequent turns.
    pub fn replace_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn prev_tone(&self) -> ToneVector {
        self.prev_tone
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn rule_warning(&self) -> Option<&KernelError> {
        self.rule_warning.as_ref()
    }
}
