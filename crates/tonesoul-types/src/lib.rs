// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Honesty Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! ToneSoul honesty kernel, the scoring core that decides whether a
//! generated utterance stays honest and in character.

pub mod config;
pub mod error;
pub mod persona;
pub mod rule;
pub mod score;
pub mod tone;

pub use config::{DimensionPolicy, KernelConfig};
pub use error::{KernelError, KernelResult};
pub use persona::{CollapseRule, CollapseSignal, Persona, VowId};
pub use rule::{RuleKind, RuleSet, VowPatternRule};
pub use score::{
    rank_hotspots, CollapseHotspot, ReflectionStatus, ReflectiveVowFeedback,
    SemanticMatchResult, ToneCorrectionHint, ToneIntegrityCheckResult, ViolationSource,
    VowViolation,
};
pub use tone::{delta, PartialToneVector, ToneDimension, ToneVector, ToneVectorDelta};
