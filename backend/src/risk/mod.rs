//! Risk triggers and assessment
//!
//! - types.rs: RiskLevel, RiskTrigger, TriggeredRule, RiskAssessment
//! - engine.rs: trigger evaluation and severity aggregation

pub mod engine;
pub mod types;

pub use engine::{assess, build_trigger_context};
pub use types::{
    CustomLogicParams, RiskAssessment, RiskLevel, RiskTrigger, ScoreMetric, ThresholdDirection, TriggerCondition,
    TriggeredRule,
};
