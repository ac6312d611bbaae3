// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Tone Analyzer Interface
// ─────────────────────────────────────────────────────────────────────
//! Tone analyzer trait and a keyword fallback implementation.
//!
//! A real deployment puts an NLP model behind [`ToneAnalyzer`]; the
//! scoring core only needs bounded, deterministic vectors.

use serde::{Deserialize, Serialize};

use tonesoul_types::{KernelResult, ToneVector};

use crate::embedding::contains_any;

/// Analyzer output: the tone vector plus an optional strategy tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedTone {
    pub tone: ToneVector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Trait for tone-analysis backends.
pub trait ToneAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> KernelResult<AnalyzedTone>;
}

const EVASIVE: [&str; 4] = ["evade", "vague", "many angles", "complicated"];
const CANDID: [&str; 3] = ["honest", "frankly", "i think"];
const LIMITS: [&str; 4] = ["dilemma", "cannot", "must admit", "unable"];

/// Deterministic keyword tone analyzer (no model required).
pub struct KeywordToneAnalyzer;

impl KeywordToneAnalyzer {
    fn classify(lower: &str) -> ((f64, f64, f64), &'static str) {
        if contains_any(lower, &EVASIVE) {
            ((0.3, 0.5, 0.4), "evasion")
        } else if contains_any(lower, &CANDID) {
            ((0.9, 0.8, 0.7), "directness")
        } else if contains_any(lower, &LIMITS) {
            ((0.6, 0.7, 0.9), "acknowledgment of limits")
        } else {
            ((0.7, 0.7, 0.7), "neutral")
        }
    }
}

impl ToneAnalyzer for KeywordToneAnalyzer {
    fn analyze(&self, text: &str) -> KernelResult<AnalyzedTone> {
        let ((t, s, r), strategy) = Self::classify(&text.to_lowercase());
        Ok(AnalyzedTone {
            tone: ToneVector::new(t, s, r)?,
            strategy: Some(strategy.to_string()),
        })
    }
}

/// External analyzer that calls a function pointer returning raw
/// `(truthfulness, sincerity, responsibility)` readings.
///
/// Backend errors pass through unchanged; transport failures should be
/// reported as [`KernelError::Analysis`]. Readings are validated, so an
/// out-of-range dimension surfaces as [`KernelError::Invariant`] instead
/// of being clamped.
///
/// [`KernelError::Analysis`]: tonesoul_types::KernelError::Analysis
/// [`KernelError::Invariant`]: tonesoul_types::KernelError::Invariant
type AnalyzeFn = Box<dyn Fn(&str) -> KernelResult<(f64, f64, f64)> + Send + Sync>;

pub struct ExternalToneAnalyzer {
    analyze_fn: AnalyzeFn,
}

impl ExternalToneAnalyzer {
    pub fn new(
        analyze_fn: impl Fn(&str) -> KernelResult<(f64, f64, f64)> + Send + Sync + 'static,
    ) -> Self {
        Self {
            analyze_fn: Box::new(analyze_fn),
        }
    }
}

impl ToneAnalyzer for ExternalToneAnalyzer {
    fn analyze(&self, text: &str) -> KernelResult<AnalyzedTone> {
        let (t, s, r) = (self.analyze_fn)(text)?;
        Ok(AnalyzedTone {
            tone: ToneVector::new(t, s, r)?,
            strategy: None,
        })
    }
}
