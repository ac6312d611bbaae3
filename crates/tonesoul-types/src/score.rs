// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Honesty Kernel Result Types
// ─────────────────────────────────────────────────────────────────────

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::persona::VowId;
use crate::tone::{PartialToneVector, ToneDimension};

/// One violated semantic rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMatchResult {
    pub vow_id: VowId,
    pub is_violated: bool,
    /// Resemblance to a forbidden pattern, or distance from an expected
    /// one, scaled by rule severity. In [0, 1].
    pub match_score: f64,
    pub matched_rule_description: String,
}

/// Where a vow violation was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationSource {
    ToneDeviation,
    Semantic { description: String },
}

/// A violated vow with provenance.
///
/// `Display` renders the label form, e.g. `no-concealment (tone deviation)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowViolation {
    pub vow_id: VowId,
    /// Tone dimension the vow guards, if the persona declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<ToneDimension>,
    pub source: ViolationSource,
}

impl VowViolation {
    pub fn tone_deviation(vow_id: impl Into<VowId>, dimension: ToneDimension) -> Self {
        Self {
            vow_id: vow_id.into(),
            dimension: Some(dimension),
            source: ViolationSource::ToneDeviation,
        }
    }

    pub fn semantic(
        vow_id: impl Into<VowId>,
        dimension: Option<ToneDimension>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            vow_id: vow_id.into(),
            dimension,
            source: ViolationSource::Semantic {
                description: description.into(),
            },
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VowViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ViolationSource::ToneDeviation => write!(f, "{} (tone deviation)", self.vow_id),
            ViolationSource::Semantic { description } => {
                write!(f, "{} (semantic violation: {description})", self.vow_id)
            }
        }
    }
}

/// Verdict of the tone integrity checker for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneIntegrityCheckResult {
    pub is_honest: bool,
    pub contradiction_score: f64,
    pub violated_vows: Vec<VowViolation>,
    pub semantic_violations: Vec<SemanticMatchResult>,
}

impl ToneIntegrityCheckResult {
    pub fn labels(&self) -> Vec<String> {
        self.violated_vows.iter().map(VowViolation::label).collect()
    }
}

/// A named risk that the persona's tone is breaking down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseHotspot {
    pub cause: String,
    pub collapse_score: f64,
}

/// Sort hotspots by `collapse_score`, highest first. Ties keep their
/// producer order.
pub fn rank_hotspots(mut hotspots: Vec<CollapseHotspot>) -> Vec<CollapseHotspot> {
    hotspots.sort_by(|a, b| {
        b.collapse_score
            .partial_cmp(&a.collapse_score)
            .unwrap_or(Ordering::Equal)
    });
    hotspots
}

/// Outcome of the external reflection-generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ReflectionStatus {
    Generated,
    Failed(String),
    TimedOut,
}

/// Structured self-assessment of one generated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectiveVowFeedback {
    /// Generator text, verbatim. Empty unless `reflection_status` is
    /// `Generated`.
    pub reflection_text: String,
    pub integrity_delta: f64,
    pub violated_vows_in_reflection: Vec<VowViolation>,
    pub requires_correction: bool,
    pub reflection_status: ReflectionStatus,
}

impl ReflectiveVowFeedback {
    pub fn has_reflection(&self) -> bool {
        self.reflection_status == ReflectionStatus::Generated
    }

    /// Whether any violation guards `dimension`.
    pub fn touches(&self, dimension: ToneDimension) -> bool {
        self.violated_vows_in_reflection
            .iter()
            .any(|v| v.dimension == Some(dimension))
    }
}

/// Forward-looking tone adjustment for the next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneCorrectionHint {
    pub adjust_tone_vector: PartialToneVector,
    pub recommended_behavior: String,
    pub apply_to_next_turn: bool,
}
