// Flag definitions and evaluated flags
//
// JSON rule format for externally managed flag definitions.
// All types deserialize from the policy snapshot file; unknown operators
// are kept as `Unsupported` so a single bad rule can be skipped instead of
// rejecting the whole file.

use crate::models::verdict::{SanctionStatus, SanctionVerdict};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// RULES
// ============================================================================

/// Comparison operator of a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleCondition {
    /// Equal (with epsilon tolerance for numbers)
    Eq,
    /// Not equal
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring of a string field, or element of an array field
    Contains,
    NotContains,
    /// Field value is one of the listed values
    In,
    NotIn,
    /// Operator name not recognised; always evaluates false
    Unsupported(String),
}

impl RuleCondition {
    pub fn as_str(&self) -> &str {
        match self {
            RuleCondition::Eq => "eq",
            RuleCondition::Ne => "ne",
            RuleCondition::Gt => "gt",
            RuleCondition::Gte => "gte",
            RuleCondition::Lt => "lt",
            RuleCondition::Lte => "lte",
            RuleCondition::Contains => "contains",
            RuleCondition::NotContains => "not_contains",
            RuleCondition::In => "in",
            RuleCondition::NotIn => "not_in",
            RuleCondition::Unsupported(op) => op,
        }
    }

    /// Operators that only make sense between two numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            RuleCondition::Gt | RuleCondition::Gte | RuleCondition::Lt | RuleCondition::Lte
        )
    }
}

impl From<String> for RuleCondition {
    fn from(op: String) -> Self {
        match op.as_str() {
            "eq" | "==" => RuleCondition::Eq,
            "ne" | "!=" => RuleCondition::Ne,
            "gt" | ">" => RuleCondition::Gt,
            "gte" | ">=" => RuleCondition::Gte,
            "lt" | "<" => RuleCondition::Lt,
            "lte" | "<=" => RuleCondition::Lte,
            "contains" => RuleCondition::Contains,
            "not_contains" => RuleCondition::NotContains,
            "in" => RuleCondition::In,
            "not_in" => RuleCondition::NotIn,
            _ => RuleCondition::Unsupported(op),
        }
    }
}

impl From<RuleCondition> for String {
    fn from(cond: RuleCondition) -> Self {
        cond.as_str().to_string()
    }
}

/// A single `(field, operator, expected value)` check
///
/// # Example
///
/// ```rust
/// use cryptopix_risk_core::flags::{Rule, RuleCondition};
///
/// let rule: Rule = serde_json::from_str(
///     r#"{"field": "amount_fiat", "condition": "gte", "value": 10000.0}"#,
/// ).unwrap();
/// assert_eq!(rule.condition, RuleCondition::Gte);
/// assert_eq!(rule.to_string(), "amount_fiat gte 10000.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Field looked up in the metadata map
    pub field: String,

    pub condition: RuleCondition,

    /// Value to compare against
    pub value: Value,
}

impl Rule {
    pub fn new(field: impl Into<String>, condition: RuleCondition, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            condition,
            value: value.into(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.condition.as_str(), self.value)
    }
}

// ============================================================================
// FLAG DEFINITIONS
// ============================================================================

/// What value an active flag carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// Active flag carries `true`
    #[default]
    Boolean,
    /// Active flag carries the value of its first rule's field
    Numeric,
    Category,
}

/// Named rule set with a scoring weight
///
/// All rules must hold for the flag to be active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDefinition {
    /// Unique name (e.g. "large_transaction_volume")
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type")]
    pub kind: FlagKind,

    /// Value reported while the flag is inactive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Contribution to the raw score when active
    #[serde(default)]
    pub weight: f64,

    /// Optional grouping (e.g. "compliance", "fraud")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl FlagDefinition {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>, weight: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: FlagKind::Boolean,
            default_value: None,
            rules,
            weight,
            category: None,
        }
    }

    pub fn with_kind(mut self, kind: FlagKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

// ============================================================================
// EVALUATED FLAGS
// ============================================================================

/// Where an evaluated flag came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FlagOrigin {
    /// Produced by evaluating a configured definition
    Configured {
        /// Rules that held, rendered as text; empty when inactive
        #[serde(default)]
        matched_rules: Vec<String>,
    },

    /// Synthesised from the screener's sanction status
    Derived { status: SanctionStatus },
}

/// One flag after evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedFlag {
    pub name: String,
    pub is_active: bool,
    pub weight: f64,
    pub value: Value,
    pub reason: String,
    pub origin: FlagOrigin,
}

impl EvaluatedFlag {
    /// Synthetic flag for SANCTIONED and HIGH_RISK verdicts
    ///
    /// Weight is the verdict's risk score. Other statuses yield `None`.
    pub fn from_verdict(verdict: &SanctionVerdict) -> Option<Self> {
        if !verdict.status.derives_flag() {
            return None;
        }

        Some(Self {
            name: sanction_flag_name(verdict.status),
            is_active: true,
            weight: verdict.risk_score,
            value: Value::Bool(true),
            reason: format!(
                "Screener reported {} with risk score {:.4}.",
                verdict.status.as_str(),
                verdict.risk_score
            ),
            origin: FlagOrigin::Derived {
                status: verdict.status,
            },
        })
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.origin, FlagOrigin::Derived { .. })
    }
}

/// Name of the synthetic flag for a sanction status
///
/// ```rust
/// use cryptopix_risk_core::flags::sanction_flag_name;
/// use cryptopix_risk_core::models::SanctionStatus;
///
/// assert_eq!(sanction_flag_name(SanctionStatus::HighRisk), "sherlock_sanction_flag_high_risk");
/// ```
pub fn sanction_flag_name(status: SanctionStatus) -> String {
    format!("sherlock_sanction_flag_{}", status.as_str().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_operator_is_preserved() {
        let rule: Rule =
            serde_json::from_str(r#"{"field": "x", "condition": "regex", "value": ".*"}"#).unwrap();
        assert_eq!(rule.condition, RuleCondition::Unsupported("regex".to_string()));
        assert_eq!(serde_json::to_value(&rule).unwrap()["condition"], json!("regex"));
    }

    #[test]
    fn test_symbolic_operators_accepted() {
        let cond: RuleCondition = serde_json::from_str(r#"">=""#).unwrap();
        assert_eq!(cond, RuleCondition::Gte);
    }

    #[test]
    fn test_definition_defaults() {
        let def: FlagDefinition = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert_eq!(def.kind, FlagKind::Boolean);
        assert!(def.rules.is_empty());
        assert_eq!(def.weight, 0.0);
    }

    #[test]
    fn test_derived_flag_only_for_flaggable_status() {
        let mut verdict = SanctionVerdict::clean("0xabc", 0.1);
        assert!(EvaluatedFlag::from_verdict(&verdict).is_none());

        verdict.status = SanctionStatus::Unknown;
        assert!(EvaluatedFlag::from_verdict(&verdict).is_none());

        verdict.status = SanctionStatus::Sanctioned;
        verdict.risk_score = 1.0;
        let flag = EvaluatedFlag::from_verdict(&verdict).unwrap();
        assert_eq!(flag.name, "sherlock_sanction_flag_sanctioned");
        assert_eq!(flag.weight, 1.0);
        assert!(flag.is_active);
        assert!(flag.is_derived());
    }
}
