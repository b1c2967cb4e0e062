//! Dynamic flags
//!
//! - types.rs: Rule, FlagDefinition, EvaluatedFlag (configured or derived)
//! - evaluator.rs: rule matching and flag evaluation over a field map

pub mod evaluator;
pub mod types;

pub use evaluator::{collect_scoring_flags, evaluate_flags, evaluate_rule, evaluate_rules};
pub use types::{
    sanction_flag_name, EvaluatedFlag, FlagDefinition, FlagKind, FlagOrigin, Rule, RuleCondition,
};
