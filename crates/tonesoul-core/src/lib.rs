// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Honesty Kernel Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Scoring engine that holds a conversational persona to its declared
//! tone signature and vows.
//!
//! Per turn the kernel produces an honesty verdict, ranked collapse-risk
//! hotspots, a reflective self-assessment and an advisory tone
//! correction hint for the next turn.
//!
//! # Invariants
//!
//! 1. **Determinism**: identical inputs, rules and embeddings yield
//!    bit-identical verdicts. Nothing in the scoring path is random.
//!
//! 2. **No silent passes**: an embedding or analyzer failure fails the
//!    turn. The matcher never reports "no violations" for a text it
//!    could not evaluate.
//!
//! 3. **Max, not sum**: contradiction and integrity scores combine their
//!    signals with `max`, so every score stays in [0, 1].
//!
//! 4. **Hints are advisory**: a correction hint never makes an adjusted
//!    dimension exceed 1.0, and no later turn's verdict reads it.

pub mod analyzer;
pub mod collapse;
pub mod embedding;
pub mod integrity;
pub mod matcher;
pub mod pipeline;
pub mod reflection;
pub mod store;
pub mod tuner;

pub use analyzer::{AnalyzedTone, ExternalToneAnalyzer, KeywordToneAnalyzer, ToneAnalyzer};
pub use collapse::CollapsePredictor;
pub use embedding::{cosine_similarity, EmbeddingProvider, ExternalEmbedding, KeywordEmbedding};
pub use integrity::{assess_vows, ToneIntegrityChecker, VowAssessment};
pub use matcher::SemanticVowMatcher;
pub use pipeline::{Conversation, HonestyKernel, TurnAssessment, TurnInput};
pub use reflection::{ExternalReflector, ReflectionContext, ReflectionGenerator, TemplateReflector};
pub use store::{load_rules_or_fallback, InMemoryStore, JsonStore, RuleLoad, VowStore};
pub use tuner::{ReflectionInput, ReflectiveTuner};
