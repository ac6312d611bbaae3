// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Tone Vector Model
// ─────────────────────────────────────────────────────────────────────
//! Three-dimensional tone vectors and the delta operator shared by the
//! integrity checker, the collapse predictor and the reflective tuner.
//!
//! A `ToneVector` can only be built through [`ToneVector::new`] (or its
//! validating `Deserialize`), so every vector reaching a scoring function
//! has all dimensions in [0, 1]. Out-of-range input is rejected with
//! [`KernelError::Invariant`], never clamped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// One axis of a tone vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneDimension {
    Truthfulness,
    Sincerity,
    Responsibility,
}

impl ToneDimension {
    /// Evaluation order used wherever dimensions are iterated.
    pub const ALL: [ToneDimension; 3] = [
        ToneDimension::Truthfulness,
        ToneDimension::Sincerity,
        ToneDimension::Responsibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneDimension::Truthfulness => "truthfulness",
            ToneDimension::Sincerity => "sincerity",
            ToneDimension::Responsibility => "responsibility",
        }
    }
}

impl fmt::Display for ToneDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize)]
struct RawToneVector {
    truthfulness: f64,
    sincerity: f64,
    responsibility: f64,
}

/// Point-in-time characterization of an utterance's tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToneVector", into = "RawToneVector")]
pub struct ToneVector {
    truthfulness: f64,
    sincerity: f64,
    responsibility: f64,
}

fn check_unit(name: &str, value: f64) -> KernelResult<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(KernelError::Invariant(format!(
            "tone dimension {name} must be in [0, 1], got {value}"
        )))
    }
}

impl ToneVector {
    pub fn new(truthfulness: f64, sincerity: f64, responsibility: f64) -> KernelResult<Self> {
        Ok(Self {
            truthfulness: check_unit("truthfulness", truthfulness)?,
            sincerity: check_unit("sincerity", sincerity)?,
            responsibility: check_unit("responsibility", responsibility)?,
        })
    }

    /// Built-in constants only; every value must already be in [0, 1].
    pub(crate) const fn from_trusted(truthfulness: f64, sincerity: f64, responsibility: f64) -> Self {
        Self {
            truthfulness,
            sincerity,
            responsibility,
        }
    }

    pub fn truthfulness(&self) -> f64 {
        self.truthfulness
    }

    pub fn sincerity(&self) -> f64 {
        self.sincerity
    }

    pub fn responsibility(&self) -> f64 {
        self.responsibility
    }

    pub fn get(&self, dimension: ToneDimension) -> f64 {
        match dimension {
            ToneDimension::Truthfulness => self.truthfulness,
            ToneDimension::Sincerity => self.sincerity,
            ToneDimension::Responsibility => self.responsibility,
        }
    }

    /// Per-dimension absolute difference. See [`delta`].
    pub fn delta(&self, other: &ToneVector) -> ToneVectorDelta {
        delta(self, other)
    }
}

impl TryFrom<RawToneVector> for ToneVector {
    type Error = KernelError;

    fn try_from(raw: RawToneVector) -> KernelResult<Self> {
        ToneVector::new(raw.truthfulness, raw.sincerity, raw.responsibility)
    }
}

impl From<ToneVector> for RawToneVector {
    fn from(tone: ToneVector) -> Self {
        Self {
            truthfulness: tone.truthfulness,
            sincerity: tone.sincerity,
            responsibility: tone.responsibility,
        }
    }
}

impl fmt::Display for ToneVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T:{:.2} S:{:.2} R:{:.2}",
            self.truthfulness, self.sincerity, self.responsibility
        )
    }
}

/// Per-dimension absolute difference between two tone vectors.
///
/// Used both as turn-to-turn tension and as deviation from a persona
/// signature. Deserialization applies the same [0, 1] check as
/// [`ToneVector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToneVector", into = "RawToneVector")]
pub struct ToneVectorDelta {
    truthfulness: f64,
    sincerity: f64,
    responsibility: f64,
}

impl TryFrom<RawToneVector> for ToneVectorDelta {
    type Error = KernelError;

    fn try_from(raw: RawToneVector) -> KernelResult<Self> {
        Ok(Self {
            truthfulness: check_unit("truthfulness", raw.truthfulness)?,
            sincerity: check_unit("sincerity", raw.sincerity)?,
            responsibility: check_unit("responsibility", raw.responsibility)?,
        })
    }
}

impl From<ToneVectorDelta> for RawToneVector {
    fn from(d: ToneVectorDelta) -> Self {
        Self {
            truthfulness: d.truthfulness,
            sincerity: d.sincerity,
            responsibility: d.responsibility,
        }
    }
}

impl ToneVectorDelta {
    pub fn truthfulness(&self) -> f64 {
        self.truthfulness
    }

    pub fn sincerity(&self) -> f64 {
        self.sincerity
    }

    pub fn responsibility(&self) -> f64 {
        self.responsibility
    }

    pub fn get(&self, dimension: ToneDimension) -> f64 {
        match dimension {
            ToneDimension::Truthfulness => self.truthfulness,
            ToneDimension::Sincerity => self.sincerity,
            ToneDimension::Responsibility => self.responsibility,
        }
    }

    pub fn mean(&self) -> f64 {
        (self.truthfulness + self.sincerity + self.responsibility) / 3.0
    }

    pub fn max_component(&self) -> f64 {
        self.truthfulness.max(self.sincerity).max(self.responsibility)
    }

    /// Euclidean norm scaled by 1/√3 so the result stays in [0, 1].
    pub fn magnitude(&self) -> f64 {
        let sum_sq = self.truthfulness.powi(2) + self.sincerity.powi(2) + self.responsibility.powi(2);
        (sum_sq / 3.0).sqrt()
    }
}

impl fmt::Display for ToneVectorDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ΔT:{:.2} ΔS:{:.2} ΔR:{:.2}",
            self.truthfulness, self.sincerity, self.responsibility
        )
    }
}

/// `abs(a_i - b_i)` per dimension. Pure and total.
pub fn delta(a: &ToneVector, b: &ToneVector) -> ToneVectorDelta {
    ToneVectorDelta {
        truthfulness: (a.truthfulness - b.truthfulness).abs(),
        sincerity: (a.sincerity - b.sincerity).abs(),
        responsibility: (a.responsibility - b.responsibility).abs(),
    }
}

/// A tone vector where only some dimensions carry a value.
///
/// An absent dimension means "no opinion", which is distinct from an
/// explicit `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialToneVector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truthfulness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sincerity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsibility: Option<f64>,
}

impl PartialToneVector {
    pub fn get(&self, dimension: ToneDimension) -> Option<f64> {
        match dimension {
            ToneDimension::Truthfulness => self.truthfulness,
            ToneDimension::Sincerity => self.sincerity,
            ToneDimension::Responsibility => self.responsibility,
        }
    }

    pub fn set(&mut self, dimension: ToneDimension, value: f64) {
        let slot = match dimension {
            ToneDimension::Truthfulness => &mut self.truthfulness,
            ToneDimension::Sincerity => &mut self.sincerity,
            ToneDimension::Responsibility => &mut self.responsibility,
        };
        *slot = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        ToneDimension::ALL.iter().all(|d| self.get(*d).is_none())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn tone(t: f64, s: f64, r: f64) -> ToneVector {
        ToneVector::new(t, s, r).unwrap()
    }

    #[test]
    fn test_delta_deserialize_rejects_out_of_range() {
        let err = serde_json::from_str::<ToneVectorDelta>(
            r#"{"truthfulness": -0.2, "sincerity": 0.1, "responsibility": 0.1}"#,
        );
        assert!(err.is_err());
        let err = serde_json::from_str::<ToneVectorDelta>(
            r#"{"truthfulness": 0.2, "sincerity": 1.4, "responsibility": 0.1}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_delta_deserialize_accepts_valid() {
        let d = delta(&tone(0.8, 0.8, 0.8), &tone(0.3, 0.5, 0.4));
        let json = serde_json::to_string(&d).unwrap();
        let back: ToneVectorDelta = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            ToneVector::new(1.2, 0.5, 0.5),
            Err(KernelError::Invariant(_))
        ));
        assert!(ToneVector::new(0.5, -0.01, 0.5).is_err());
        assert!(ToneVector::new(0.5, 0.5, f64::NAN).is_err());
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert!(ToneVector::new(0.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_delta_components() {
        let d = delta(&tone(0.8, 0.8, 0.8), &tone(0.3, 0.5, 0.4));
        assert!((d.truthfulness() - 0.5).abs() < 1e-9);
        assert!((d.sincerity() - 0.3).abs() < 1e-9);
        assert!((d.responsibility() - 0.4).abs() < 1e-9);
        assert!((d.mean() - 0.4).abs() < 1e-9);
        assert!((d.max_component() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_delta_identical_is_zero() {
        let a = tone(0.7, 0.2, 0.9);
        let d = a.delta(&a);
        assert_eq!(d.mean(), 0.0);
        assert_eq!(d.magnitude(), 0.0);
    }

    #[test]
    fn test_magnitude_of_full_swing_is_one() {
        let d = delta(&tone(0.0, 0.0, 0.0), &tone(1.0, 1.0, 1.0));
        assert!((d.magnitude() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let err = serde_json::from_str::<ToneVector>(
            r#"{"truthfulness":1.5,"sincerity":0.5,"responsibility":0.5}"#,
        );
        assert!(err.is_err());
        let ok: ToneVector = serde_json::from_str(
            r#"{"truthfulness":0.75,"sincerity":0.8,"responsibility":0.75}"#,
        )
        .unwrap();
        assert_eq!(ok, tone(0.75, 0.8, 0.75));
    }

    #[test]
    fn test_partial_unset_is_not_zero() {
        let mut p = PartialToneVector::default();
        assert!(p.is_empty());
        p.set(ToneDimension::Sincerity, 0.0);
        assert!(!p.is_empty());
        assert_eq!(p.get(ToneDimension::Sincerity), Some(0.0));
        assert_eq!(p.get(ToneDimension::Truthfulness), None);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"sincerity":0.0}"#);
    }

    proptest! {
        #[test]
        fn prop_delta_symmetric_and_bounded(
            a in (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
            b in (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
        ) {
            let va = tone(a.0, a.1, a.2);
            let vb = tone(b.0, b.1, b.2);
            let ab = delta(&va, &vb);
            let ba = delta(&vb, &va);
            prop_assert_eq!(ab, ba);
            for d in ToneDimension::ALL {
                prop_assert!((0.0..=1.0).contains(&ab.get(d)));
            }
            prop_assert!((0.0..=1.0).contains(&ab.mean()));
            prop_assert!((0.0..=1.0).contains(&ab.magnitude()));
        }
    }
}
