// Flag Evaluator
//
// Evaluates flag definitions against a transaction's field map.
// Evaluation is total: missing fields, type mismatches and malformed
// definitions all evaluate to false instead of returning an error.

use crate::flags::types::{EvaluatedFlag, FlagDefinition, FlagKind, FlagOrigin, Rule, RuleCondition};
use crate::models::metadata::FieldMap;
use crate::models::verdict::SanctionVerdict;
use crate::policy::validation::{describe, validate_flag};
use serde_json::Value;
use tracing::{debug, warn};

/// Epsilon for floating point equality comparison
const FLOAT_EPSILON: f64 = 1e-9;

// ============================================================================
// RULE EVALUATION
// ============================================================================

/// Evaluate a single rule against the field map
///
/// Returns false when the field is absent, when the operands have types the
/// operator cannot compare, or when the operator is unsupported.
///
/// # Example
///
/// ```rust
/// use cryptopix_risk_core::flags::{evaluate_rule, Rule, RuleCondition};
/// use cryptopix_risk_core::models::FieldMap;
///
/// let fields = FieldMap::new().with("amount_fiat", 15_000.0);
/// assert!(evaluate_rule(&Rule::new("amount_fiat", RuleCondition::Gte, 10_000.0), &fields));
/// assert!(!evaluate_rule(&Rule::new("country_iso", RuleCondition::Eq, "IR"), &fields));
/// ```
pub fn evaluate_rule(rule: &Rule, fields: &FieldMap) -> bool {
    let Some(actual) = fields.get(&rule.field) else {
        return false;
    };
    let expected = &rule.value;

    match &rule.condition {
        RuleCondition::Eq => values_equal(actual, expected).unwrap_or(false),
        RuleCondition::Ne => values_equal(actual, expected).map(|eq| !eq).unwrap_or(false),

        RuleCondition::Gt => compare_numbers(actual, expected, |a, b| a > b),
        RuleCondition::Gte => {
            compare_numbers(actual, expected, |a, b| a >= b || (a - b).abs() < FLOAT_EPSILON)
        }
        RuleCondition::Lt => compare_numbers(actual, expected, |a, b| a < b),
        RuleCondition::Lte => {
            compare_numbers(actual, expected, |a, b| a <= b || (a - b).abs() < FLOAT_EPSILON)
        }

        RuleCondition::Contains => contains(actual, expected).unwrap_or(false),
        RuleCondition::NotContains => contains(actual, expected).map(|c| !c).unwrap_or(false),

        RuleCondition::In => member_of(actual, expected).unwrap_or(false),
        RuleCondition::NotIn => member_of(actual, expected).map(|m| !m).unwrap_or(false),

        RuleCondition::Unsupported(_) => false,
    }
}

/// Logical AND over a rule set
///
/// Returns false for an empty rule set: a condition with nothing to check
/// must not fire. Rule-less flag definitions are handled by
/// [`evaluate_flags`] through their default value.
pub fn evaluate_rules(rules: &[Rule], fields: &FieldMap) -> bool {
    !rules.is_empty() && rules.iter().all(|rule| evaluate_rule(rule, fields))
}

/// Equality between two JSON values of the same type
///
/// Returns `None` on a type mismatch so callers can treat it as false for
/// both `eq` and `ne`.
fn values_equal(actual: &Value, expected: &Value) -> Option<bool> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64()?, b.as_f64()?);
            Some((a - b).abs() < FLOAT_EPSILON)
        }
        (Value::String(a), Value::String(b)) => Some(a == b),
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            Some(actual == expected)
        }
        _ => None,
    }
}

fn compare_numbers(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn contains(haystack: &Value, needle: &Value) -> Option<bool> {
    match (haystack, needle) {
        (Value::String(h), Value::String(n)) => Some(h.contains(n.as_str())),
        (Value::Array(items), n) => Some(items.iter().any(|item| values_equal(item, n) == Some(true))),
        _ => None,
    }
}

fn member_of(value: &Value, list: &Value) -> Option<bool> {
    match list {
        Value::Array(items) => Some(items.iter().any(|item| values_equal(value, item) == Some(true))),
        _ => None,
    }
}

// ============================================================================
// FLAG EVALUATION
// ============================================================================

/// Evaluate every definition against the field map
///
/// Produces exactly one [`EvaluatedFlag`] per definition, in definition
/// order. Definitions that fail validation are reported inactive with the
/// validation errors as the reason.
pub fn evaluate_flags(fields: &FieldMap, definitions: &[FlagDefinition]) -> Vec<EvaluatedFlag> {
    definitions
        .iter()
        .map(|def| evaluate_definition(def, fields))
        .collect()
}

fn evaluate_definition(def: &FlagDefinition, fields: &FieldMap) -> EvaluatedFlag {
    let inactive = |reason: String| EvaluatedFlag {
        name: def.name.clone(),
        is_active: false,
        weight: def.weight,
        value: def.default_value.clone().unwrap_or(Value::Null),
        reason,
        origin: FlagOrigin::Configured {
            matched_rules: Vec::new(),
        },
    };

    if let Err(errors) = validate_flag(def) {
        let reason = describe(&errors);
        warn!(flag = %def.name, %reason, "Skipping malformed flag definition");
        return inactive(format!("Skipped: {reason}"));
    }

    if def.rules.is_empty() {
        // a rule-less definition with a default is always on and reports the default
        return match &def.default_value {
            Some(value) => EvaluatedFlag {
                name: def.name.clone(),
                is_active: true,
                weight: def.weight,
                value: value.clone(),
                reason: "No rules defined; default value applies.".to_string(),
                origin: FlagOrigin::Configured {
                    matched_rules: Vec::new(),
                },
            },
            None => inactive("No rules defined.".to_string()),
        };
    }

    if !evaluate_rules(&def.rules, fields) {
        return inactive("Not all rules matched.".to_string());
    }

    let value = match def.kind {
        FlagKind::Boolean => Value::Bool(true),
        FlagKind::Numeric | FlagKind::Category => {
            fields.get(&def.rules[0].field).cloned().unwrap_or(Value::Bool(true))
        }
    };
    let matched_rules: Vec<String> = def.rules.iter().map(ToString::to_string).collect();
    debug!(flag = %def.name, weight = def.weight, "Flag active");

    EvaluatedFlag {
        name: def.name.clone(),
        is_active: true,
        weight: def.weight,
        value,
        reason: format!("Rules matched: {}.", matched_rules.join(", ")),
        origin: FlagOrigin::Configured { matched_rules },
    }
}

/// Union configured flags with the flag derived from the sanction verdict
///
/// Configured flags keep their order; the derived flag, if any, comes last.
pub fn collect_scoring_flags(
    configured: Vec<EvaluatedFlag>,
    verdict: &SanctionVerdict,
) -> Vec<EvaluatedFlag> {
    let mut flags = configured;
    flags.extend(EvaluatedFlag::from_verdict(verdict));
    flags
}
