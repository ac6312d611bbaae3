// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Embedding Provider Interface
// ─────────────────────────────────────────────────────────────────────
//! Embedding provider trait, cosine similarity, and a keyword
//! fallback implementation.
//!
//! In production a sentence-embedding service runs behind this trait.
//! The keyword fallback provides deterministic vectors for testing.

use tonesoul_types::{KernelError, KernelResult};

/// Trait for text-embedding backends.
///
/// Implementations must return vectors of one fixed dimensionality and
/// be deterministic for identical input within a session. Transport
/// failures are reported as [`KernelError::Embedding`].
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> KernelResult<Vec<f64>>;
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`.
///
/// Defined as 0.0 when either vector has zero magnitude. Mismatched
/// dimensionality is an embedding failure; non-finite components, or
/// components large enough to overflow the norms, are a numerical failure.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> KernelResult<f64> {
    if a.len() != b.len() {
        return Err(KernelError::Embedding(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(KernelError::Numerical(
            "embedding contains NaN or Inf".to_string(),
        ));
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    let similarity = dot / (norm_a * norm_b);
    if !similarity.is_finite() {
        return Err(KernelError::Numerical(format!(
            "cosine similarity overflowed to {similarity}"
        )));
    }
    Ok(similarity)
}

/// Deterministic keyword embedding (no model required).
///
/// Maps hedging, blame-shifting, empathetic, candid and accountable
/// wording to fixed 3-d vectors; everything else is neutral. Hedging and
/// blame sit on their own axes so candid text never resembles them.
pub struct KeywordEmbedding;

const HEDGING: [&str; 4] = ["many angles", "complicated", "perhaps", "hard to say"];
const BLAME: [&str; 3] = ["not my fault", "someone else", "blame"];
const EMPATHY: [&str; 3] = ["i hear", "sounds painful", "hard for you"];
const CANDID: [&str; 3] = ["i think", "frankly", "honestly"];
const ACCOUNTABLE: [&str; 3] = ["i admit", "i will take responsibility", "my mistake"];

pub(crate) fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

impl EmbeddingProvider for KeywordEmbedding {
    fn embed(&self, text: &str) -> KernelResult<Vec<f64>> {
        let lower = text.to_lowercase();

        let v = if contains_any(&lower, &HEDGING) {
            [0.9, 0.1, 0.1]
        } else if contains_any(&lower, &BLAME) {
            [0.1, 0.9, 0.1]
        } else if contains_any(&lower, &EMPATHY) {
            [0.2, 0.3, 0.9]
        } else if contains_any(&lower, &CANDID) {
            [0.1, 0.1, 0.9]
        } else if contains_any(&lower, &ACCOUNTABLE) {
            [0.3, 0.1, 0.9]
        } else {
            [0.5, 0.5, 0.5]
        };
        Ok(v.to_vec())
    }
}

/// External embedding backend that calls a function pointer.
///
/// Used to plug in a real embedding service without the kernel knowing
/// its transport.
type EmbedFn = Box<dyn Fn(&str) -> KernelResult<Vec<f64>> + Send + Sync>;

pub struct ExternalEmbedding {
    embed_fn: EmbedFn,
}

impl ExternalEmbedding {
    pub fn new(embed_fn: impl Fn(&str) -> KernelResult<Vec<f64>> + Send + Sync + 'static) -> Self {
        Self {
            embed_fn: Box::new(embed_fn),
        }
    }
}

impl EmbeddingProvider for ExternalEmbedding {
    fn embed(&self, text: &str) -> KernelResult<Vec<f64>> {
        (self.embed_fn)(text)
    }
}
