// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Honesty Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::tone::ToneDimension;

/// Per-dimension amounts, used for deviation thresholds and nudges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionPolicy {
    pub truthfulness: f64,
    pub sincerity: f64,
    pub responsibility: f64,
}

impl DimensionPolicy {
    pub fn get(&self, dimension: ToneDimension) -> f64 {
        match dimension {
            ToneDimension::Truthfulness => self.truthfulness,
            ToneDimension::Sincerity => self.sincerity,
            ToneDimension::Responsibility => self.responsibility,
        }
    }
}

/// Runtime configuration for the honesty kernel.
///
/// Every policy constant of the scoring pipeline lives here. None of
/// them are derived; they are tunable policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// A turn is honest only if its contradiction score is below this.
    /// Default: 0.6.
    pub honesty_threshold: f64,

    /// Signature gap above which a dimension-bound vow counts as violated.
    /// Default: truthfulness 0.4, sincerity 0.3, responsibility 0.4.
    pub deviation_thresholds: DimensionPolicy,

    /// Reflection requires correction when integrity delta exceeds this.
    /// Default: 0.3.
    pub correction_threshold: f64,

    /// Integrity delta is raised to at least this when any vow is violated.
    /// Default: 0.5.
    pub violation_integrity_floor: f64,

    /// Integrity delta above which the truthfulness nudge fires even
    /// without a truthfulness violation. Default: 0.4.
    pub truthfulness_nudge_trigger: f64,

    /// Fixed adjustment proposed per triggered category.
    /// Default: truthfulness 0.10, sincerity 0.15, responsibility 0.10.
    pub nudges: DimensionPolicy,

    /// Deadline for the reflection generator in milliseconds.
    /// Default: 2000.
    pub reflection_timeout_ms: u64,

    /// Maximum number of distinct texts whose embeddings are cached.
    /// Default: 1024.
    pub embedding_cache_capacity: usize,

    /// Joins a rule's example phrases before embedding them.
    /// Default: a single space.
    pub phrase_separator: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            honesty_threshold: 0.6,
            deviation_thresholds: DimensionPolicy {
                truthfulness: 0.4,
                sincerity: 0.3,
                responsibility: 0.4,
            },
            correction_threshold: 0.3,
            violation_integrity_floor: 0.5,
            truthfulness_nudge_trigger: 0.4,
            nudges: DimensionPolicy {
                truthfulness: 0.10,
                sincerity: 0.15,
                responsibility: 0.10,
            },
            reflection_timeout_ms: 2000,
            embedding_cache_capacity: 1024,
            phrase_separator: " ".to_string(),
        }
    }
}

fn check_unit(name: &str, value: f64) -> KernelResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(KernelError::Config(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

impl KernelConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> KernelResult<()> {
        check_unit("honesty_threshold", self.honesty_threshold)?;
        check_unit("correction_threshold", self.correction_threshold)?;
        check_unit("violation_integrity_floor", self.violation_integrity_floor)?;
        check_unit("truthfulness_nudge_trigger", self.truthfulness_nudge_trigger)?;
        for dimension in ToneDimension::ALL {
            check_unit(
                &format!("deviation_thresholds.{dimension}"),
                self.deviation_thresholds.get(dimension),
            )?;
            check_unit(&format!("nudges.{dimension}"), self.nudges.get(dimension))?;
        }
        if self.reflection_timeout_ms == 0 {
            return Err(KernelError::Config(
                "reflection_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.embedding_cache_capacity == 0 {
            return Err(KernelError::Config(
                "embedding_cache_capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string. Absent fields take their defaults.
    pub fn from_json(json: &str) -> KernelResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| KernelError::Config(format!("JSON parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        KernelConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_threshold_out_of_range() {
        let config = KernelConfig {
            honesty_threshold: 1.2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(KernelError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_nudge() {
        let mut config = KernelConfig::default();
        config.nudges.sincerity = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nudges.sincerity"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = KernelConfig {
            reflection_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = KernelConfig::from_json(r#"{"honesty_threshold": 0.5}"#).unwrap();
        assert!((config.honesty_threshold - 0.5).abs() < 1e-9);
        assert_eq!(config.reflection_timeout_ms, 2000);
    }

    #[test]
    fn test_from_json_garbage() {
        assert!(KernelConfig::from_json("not json").is_err());
    }
}
