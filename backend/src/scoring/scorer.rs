//! Probability scorer
//!
//! Turns the active flags of a transaction into a raw score (sum of active
//! weights) and a risk probability in `[0, 1]`.
//!
//! # Critical Invariants
//!
//! 1. Probability is non-decreasing in the raw score
//! 2. Probability is always within `[0, 1]`
//! 3. Configured and sanction-derived flags are scored the same way
//! 4. Same inputs give the same score id

use crate::flags::EvaluatedFlag;
use crate::models::metadata::FieldMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Normalization curve from raw score to probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum ScoreCurve {
    /// `raw / ceiling`, clamped to `[0, 1]`
    Linear { ceiling: f64 },

    /// `1 / (1 + e^(-steepness * (raw - midpoint)))`
    Logistic { midpoint: f64, steepness: f64 },
}

impl Default for ScoreCurve {
    fn default() -> Self {
        ScoreCurve::Linear { ceiling: 2.0 }
    }
}

impl ScoreCurve {
    /// Map a raw score into `[0, 1]`
    ///
    /// ```rust
    /// use cryptopix_risk_core::scoring::ScoreCurve;
    ///
    /// let curve = ScoreCurve::Linear { ceiling: 2.0 };
    /// assert_eq!(curve.normalize(0.7), 0.35);
    /// assert_eq!(curve.normalize(5.0), 1.0);
    /// assert_eq!(curve.normalize(-1.0), 0.0);
    /// ```
    pub fn normalize(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return 0.0;
        }

        let p = match *self {
            ScoreCurve::Linear { ceiling } => {
                let ceiling = if ceiling.is_finite() && ceiling > 0.0 { ceiling } else { 1.0 };
                raw / ceiling
            }
            ScoreCurve::Logistic { midpoint, steepness } => {
                // a negative steepness would flip the curve
                let k = steepness.abs();
                1.0 / (1.0 + (-k * (raw - midpoint)).exp())
            }
        };

        if p.is_nan() {
            0.0
        } else {
            // + 0.0 turns a negative zero positive
            p.clamp(0.0, 1.0) + 0.0
        }
    }
}

/// Scorer configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(flatten)]
    pub curve: ScoreCurve,
}

/// Output of the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Derived from the inputs; identical inputs give the identical id
    pub id: Uuid,
    pub entity_id: String,
    pub raw_score: f64,
    pub probability_score: f64,
    /// Exactly the flags with `is_active == true` that entered the sum
    pub flags_used: Vec<EvaluatedFlag>,
    pub summary: String,
}

impl ScoreResult {
    pub fn has_active_flag(&self, name: &str) -> Option<&EvaluatedFlag> {
        self.flags_used.iter().find(|f| f.name == name && f.is_active)
    }
}

/// Score a set of flags
///
/// # Arguments
///
/// * `entity_id` - Transaction being scored
/// * `flags` - Configured and derived flags; inactive ones are ignored
/// * `metadata` - Field map the flags were evaluated against
/// * `config` - Normalization curve
///
/// # Example
///
/// ```rust
/// use cryptopix_risk_core::flags::{EvaluatedFlag, FlagOrigin};
/// use cryptopix_risk_core::models::FieldMap;
/// use cryptopix_risk_core::scoring::{score, ScoringConfig};
///
/// let flag = EvaluatedFlag {
///     name: "large_transaction_volume".into(),
///     is_active: true,
///     weight: 0.7,
///     value: true.into(),
///     reason: String::new(),
///     origin: FlagOrigin::Configured { matched_rules: vec![] },
/// };
/// let result = score("tx-1", &[flag], &FieldMap::new(), &ScoringConfig::default());
/// assert_eq!(result.raw_score, 0.7);
/// assert_eq!(result.flags_used.len(), 1);
/// ```
pub fn score(
    entity_id: &str,
    flags: &[EvaluatedFlag],
    metadata: &FieldMap,
    config: &ScoringConfig,
) -> ScoreResult {
    let flags_used: Vec<EvaluatedFlag> = flags.iter().filter(|f| f.is_active).cloned().collect();

    // fold from +0.0; an empty f64 sum() is -0.0
    let raw_score = flags_used.iter().fold(0.0, |acc, f| acc + f.weight);
    let probability_score = config.curve.normalize(raw_score);

    ScoreResult {
        id: score_id(entity_id, &flags_used, metadata),
        entity_id: entity_id.to_string(),
        raw_score,
        probability_score,
        summary: format!("Risk score for {entity_id} is {probability_score:.4}."),
        flags_used,
    }
}

/// UUID v5 over the scoring inputs
fn score_id(entity_id: &str, flags_used: &[EvaluatedFlag], metadata: &FieldMap) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(entity_id.as_bytes());
    for flag in flags_used {
        hasher.update([0u8]);
        hasher.update(flag.name.as_bytes());
        hasher.update(flag.weight.to_le_bytes());
    }
    // FieldMap serializes with sorted keys
    if let Ok(json) = serde_json::to_vec(metadata) {
        hasher.update(&json);
    }
    Uuid::new_v5(&Uuid::NAMESPACE_OID, &hasher.finalize())
}
