// Definition validation
//
// Checks run against every flag definition and risk trigger before use:
// - Names are non-empty
// - Operators are recognised and their operands have a usable shape
// - Weights and thresholds are finite
// - Trigger types are recognised and carry what they need
//
// A definition that fails is skipped (and evaluates false); it never aborts
// an assessment.

use crate::flags::{FlagDefinition, Rule, RuleCondition};
use crate::risk::{RiskTrigger, TriggerCondition};
use thiserror::Error;

/// Problems with a stored flag or trigger definition
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Definition at position {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("Definition name is empty")]
    EmptyName,

    #[error("Duplicate flag definition: {0}")]
    DuplicateFlag(String),

    #[error("Duplicate risk trigger: {0}")]
    DuplicateTrigger(String),

    #[error("'{owner}' uses unsupported operator '{operator}'")]
    UnsupportedOperator { owner: String, operator: String },

    #[error("'{owner}' rule on '{field}' expects {expected} for operator '{operator}'")]
    InvalidOperand {
        owner: String,
        field: String,
        operator: String,
        expected: &'static str,
    },

    #[error("Flag '{0}' has a non-finite weight")]
    NonFiniteWeight(String),

    #[error("Trigger '{0}' has an unsupported trigger type")]
    UnsupportedTriggerType(String),

    #[error("Trigger '{0}' does not name a flag")]
    MissingFlagName(String),

    #[error("Trigger '{0}' has a non-finite threshold")]
    NonFiniteThreshold(String),

    #[error("'{0}' has no rules")]
    NoRules(String),
}

/// Validation result
pub type ValidationResult = Result<(), Vec<ConfigError>>;

/// Validate a flag definition
///
/// A definition without rules is valid; it is active only when it carries a default value.
pub fn validate_flag(def: &FlagDefinition) -> ValidationResult {
    let mut errors = Vec::new();

    if def.name.trim().is_empty() {
        errors.push(ConfigError::EmptyName);
    }
    if !def.weight.is_finite() {
        errors.push(ConfigError::NonFiniteWeight(def.name.clone()));
    }
    validate_rules(&def.name, &def.rules, &mut errors);

    into_result(errors)
}

/// Validate a risk trigger
pub fn validate_trigger(trigger: &RiskTrigger) -> ValidationResult {
    let mut errors = Vec::new();

    if trigger.name.trim().is_empty() {
        errors.push(ConfigError::EmptyName);
    }

    match &trigger.condition {
        TriggerCondition::FlagPresence { flag_name } => {
            if flag_name.trim().is_empty() {
                errors.push(ConfigError::MissingFlagName(trigger.name.clone()));
            }
        }
        TriggerCondition::ScoreThreshold { threshold, .. } => {
            if !threshold.is_finite() {
                errors.push(ConfigError::NonFiniteThreshold(trigger.name.clone()));
            }
        }
        TriggerCondition::ContextRule { rules } => {
            if rules.is_empty() {
                errors.push(ConfigError::NoRules(trigger.name.clone()));
            }
            validate_rules(&trigger.name, rules, &mut errors);
        }
        TriggerCondition::CustomLogic {
            custom_logic_params: Some(params),
        } => {
            let bounds = [params.max_score, params.min_recent_volume];
            if bounds.iter().flatten().any(|b| !b.is_finite()) {
                errors.push(ConfigError::NonFiniteThreshold(trigger.name.clone()));
            }
        }
        TriggerCondition::CustomLogic { custom_logic_params: None } => {}
        TriggerCondition::Unsupported => {
            errors.push(ConfigError::UnsupportedTriggerType(trigger.name.clone()));
        }
    }

    into_result(errors)
}

fn validate_rules(owner: &str, rules: &[Rule], errors: &mut Vec<ConfigError>) {
    for rule in rules {
        let invalid_operand = |expected: &'static str| ConfigError::InvalidOperand {
            owner: owner.to_string(),
            field: rule.field.clone(),
            operator: rule.condition.as_str().to_string(),
            expected,
        };

        match &rule.condition {
            RuleCondition::Unsupported(op) => {
                errors.push(ConfigError::UnsupportedOperator {
                    owner: owner.to_string(),
                    operator: op.clone(),
                });
            }
            cond if cond.is_numeric() => {
                if !rule.value.as_f64().is_some_and(f64::is_finite) {
                    errors.push(invalid_operand("a finite number"));
                }
            }
            RuleCondition::In | RuleCondition::NotIn => {
                if !rule.value.is_array() {
                    errors.push(invalid_operand("a list"));
                }
            }
            _ => {}
        }
    }
}

fn into_result(errors: Vec<ConfigError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Join errors into one log-friendly line
pub fn describe(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
