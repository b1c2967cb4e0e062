//! Risk trigger configuration and assessment types
//!
//! Triggers are configured in the policy snapshot and evaluated
//! independently of each other. Each one that fires contributes its risk
//! level; the assessment's level is the maximum.
//!
//! # Design Principles
//!
//! 1. **Total order**: `RiskLevel` derives `Ord` (LOW < MEDIUM < HIGH < CRITICAL)
//! 2. **Self-contained**: a trigger carries everything needed to evaluate it
//! 3. **Tolerant**: unknown trigger types deserialize to `Unsupported`

use crate::flags::Rule;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate risk severity
///
/// Variant order defines the severity order used by `max()`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

/// Which score a threshold trigger looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMetric {
    #[default]
    Probability,
    RawScore,
}

impl ScoreMetric {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreMetric::Probability => "Probability score",
            ScoreMetric::RawScore => "Raw score",
        }
    }
}

/// Side of the bound that fires a threshold trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    Above,
    #[default]
    AtOrAbove,
    Below,
    AtOrBelow,
}

impl ThresholdDirection {
    pub fn crosses(&self, value: f64, bound: f64) -> bool {
        match self {
            ThresholdDirection::Above => value > bound,
            ThresholdDirection::AtOrAbove => value >= bound,
            ThresholdDirection::Below => value < bound,
            ThresholdDirection::AtOrBelow => value <= bound,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            ThresholdDirection::Above => "above",
            ThresholdDirection::AtOrAbove => "at or above",
            ThresholdDirection::Below => "below",
            ThresholdDirection::AtOrBelow => "at or below",
        }
    }
}

/// Condition checked by a trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger_type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Fires if the named flag was active upstream (configured or derived)
    FlagPresence { flag_name: String },

    /// Fires if the chosen score crosses the bound
    ScoreThreshold {
        #[serde(default)]
        metric: ScoreMetric,
        #[serde(default)]
        direction: ThresholdDirection,
        threshold: f64,
    },

    /// Fires if every rule holds against the trigger context
    ContextRule { rules: Vec<Rule> },

    /// Fires on a low probability score with enough recent volume
    CustomLogic {
        #[serde(default)]
        custom_logic_params: Option<CustomLogicParams>,
    },

    /// Unrecognised `trigger_type`; never fires
    #[serde(other)]
    Unsupported,
}

/// Bounds for a `custom_logic` trigger
///
/// An absent `max_score` is 1.0 and an absent `min_recent_volume` is 0.0.
/// With neither set the trigger never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomLogicParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_recent_volume: Option<f64>,
}

impl CustomLogicParams {
    pub fn is_empty(&self) -> bool {
        self.max_score.is_none() && self.min_recent_volume.is_none()
    }

    pub fn max_score(&self) -> f64 {
        self.max_score.unwrap_or(1.0)
    }

    pub fn min_recent_volume(&self) -> f64 {
        self.min_recent_volume.unwrap_or(0.0)
    }
}

fn default_active() -> bool {
    true
}

/// Configured risk trigger
///
/// # Example
///
/// ```rust
/// use cryptopix_risk_core::risk::{RiskLevel, RiskTrigger, TriggerCondition};
///
/// let json = r#"{
///     "name": "sanction_presence",
///     "trigger_type": "flag_presence",
///     "flag_name": "sherlock_sanction_flag_sanctioned",
///     "risk_level": "CRITICAL"
/// }"#;
/// let trigger: RiskTrigger = serde_json::from_str(json).unwrap();
/// assert_eq!(trigger.risk_level, RiskLevel::Critical);
/// assert!(trigger.is_active);
/// assert!(matches!(trigger.condition, TriggerCondition::FlagPresence { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTrigger {
    /// Unique trigger name
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(flatten)]
    pub condition: TriggerCondition,

    /// Level assigned when the trigger fires
    pub risk_level: RiskLevel,

    /// Inactive triggers are ignored by the engine
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl RiskTrigger {
    pub fn new(name: impl Into<String>, condition: TriggerCondition, risk_level: RiskLevel) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            condition,
            risk_level,
            is_active: true,
        }
    }

    pub fn flag_presence(name: impl Into<String>, flag_name: impl Into<String>, risk_level: RiskLevel) -> Self {
        Self::new(
            name,
            TriggerCondition::FlagPresence {
                flag_name: flag_name.into(),
            },
            risk_level,
        )
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A trigger that fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub trigger_name: String,
    pub risk_level: RiskLevel,
    pub reason: String,
}

/// Output of the trigger engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub entity_id: String,
    pub score_id: Uuid,
    /// Max over fired triggers, LOW if none fired
    pub overall_risk_level: RiskLevel,
    /// In trigger configuration order; equal levels are all kept
    pub triggered_rules: Vec<TriggeredRule>,
    pub summary_message: String,
}
