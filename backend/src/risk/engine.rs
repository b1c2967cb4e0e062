// Risk Trigger Engine
//
// Evaluates every active trigger against the score result and the combined
// context (transaction metadata, sanction summary, score fields) and
// aggregates the fired triggers into one risk level.

use crate::flags::evaluate_rules;
use crate::models::metadata::FieldMap;
use crate::models::verdict::SanctionVerdict;
use crate::policy::validation::{describe, validate_trigger};
use crate::risk::types::{
    RiskAssessment, RiskLevel, RiskTrigger, ScoreMetric, TriggerCondition, TriggeredRule,
};
use crate::scoring::ScoreResult;
use serde_json::Value;
use tracing::{debug, warn};

/// Context field read by `custom_logic` triggers; absent counts as zero
const RECENT_VOLUME_FIELD: &str = "recent_transaction_volume_usd";

/// Build the context triggers are evaluated against
///
/// Starts from the transaction metadata and adds:
/// - sherlock_overall_sanction_status, sherlock_overall_risk_score, sherlock_flags_count
/// - probability_score, raw_score, active_flag_count
/// - original_user_id, original_ip_address (when present)
pub fn build_trigger_context(
    metadata: &FieldMap,
    verdict: &SanctionVerdict,
    score: &ScoreResult,
) -> FieldMap {
    let mut context = metadata.clone();

    context.insert("sherlock_overall_sanction_status", verdict.status.as_str());
    context.insert("sherlock_overall_risk_score", verdict.risk_score);
    context.insert("sherlock_flags_count", verdict.flags.len());

    context.insert("probability_score", score.probability_score);
    context.insert("raw_score", score.raw_score);
    context.insert("active_flag_count", score.flags_used.len());

    if let Some(user_id) = metadata.get("user_id").cloned() {
        context.insert("original_user_id", user_id);
    }
    if let Some(ip) = metadata.get("ip_address").cloned() {
        context.insert("original_ip_address", ip);
    }

    context
}

/// Assess the risk of one entity
///
/// Each active trigger is evaluated on its own. The overall level is the
/// maximum level among fired triggers; with nothing fired it is LOW and the
/// triggered list is empty. Malformed triggers are skipped with a warning.
///
/// # Arguments
///
/// * `entity_id` - Transaction being assessed
/// * `score` - Scorer output (its `flags_used` are checked by flag triggers)
/// * `context` - Combined context from [`build_trigger_context`]
/// * `triggers` - Trigger configuration, evaluated in order
pub fn assess(
    entity_id: &str,
    score: &ScoreResult,
    context: &FieldMap,
    triggers: &[RiskTrigger],
) -> RiskAssessment {
    let mut triggered_rules = Vec::new();
    let mut overall = RiskLevel::Low;

    for trigger in triggers.iter().filter(|t| t.is_active) {
        if let Err(errors) = validate_trigger(trigger) {
            warn!(trigger = %trigger.name, reason = %describe(&errors), "Skipping malformed risk trigger");
            continue;
        }

        if let Some(reason) = evaluate_trigger(trigger, score, context) {
            debug!(trigger = %trigger.name, level = trigger.risk_level.as_str(), "Trigger fired");
            overall = overall.max(trigger.risk_level);
            triggered_rules.push(TriggeredRule {
                trigger_name: trigger.name.clone(),
                risk_level: trigger.risk_level,
                reason,
            });
        }
    }

    let mut summary_message = format!(
        "Risk assessment for {}: Overall {}.",
        entity_id,
        overall.as_str()
    );
    if !triggered_rules.is_empty() {
        summary_message.push_str(&format!(" ({} rules triggered).", triggered_rules.len()));
    }

    RiskAssessment {
        entity_id: entity_id.to_string(),
        score_id: score.id,
        overall_risk_level: overall,
        triggered_rules,
        summary_message,
    }
}

/// Evaluate one trigger; returns the reason text when it fires
fn evaluate_trigger(trigger: &RiskTrigger, score: &ScoreResult, context: &FieldMap) -> Option<String> {
    match &trigger.condition {
        TriggerCondition::FlagPresence { flag_name } => score
            .has_active_flag(flag_name)
            .map(|flag| format!("Flag '{}' is active with weight {:.4}.", flag_name, flag.weight)),

        TriggerCondition::ScoreThreshold {
            metric,
            direction,
            threshold,
        } => {
            let value = match metric {
                ScoreMetric::Probability => score.probability_score,
                ScoreMetric::RawScore => score.raw_score,
            };
            direction.crosses(value, *threshold).then(|| {
                format!(
                    "{} ({:.4}) is {} threshold ({:.4}).",
                    metric.label(),
                    value,
                    direction.phrase(),
                    threshold
                )
            })
        }

        TriggerCondition::ContextRule { rules } => evaluate_rules(rules, context).then(|| {
            let rendered: Vec<String> = rules.iter().map(ToString::to_string).collect();
            format!("Context rules matched: {}.", rendered.join(", "))
        }),

        TriggerCondition::CustomLogic { custom_logic_params } => {
            let params = custom_logic_params.filter(|p| !p.is_empty())?;
            let volume = match context.get(RECENT_VOLUME_FIELD) {
                None | Some(Value::Null) => 0.0,
                Some(value) => value.as_f64()?,
            };
            let (max_score, min_volume) = (params.max_score(), params.min_recent_volume());
            (score.probability_score <= max_score && volume >= min_volume).then(|| {
                format!(
                    "Custom logic: Score ({:.4}) <= {:?} and recent volume ({:?}) >= {:?}.",
                    score.probability_score, max_score, volume, min_volume
                )
            })
        }

        TriggerCondition::Unsupported => None,
    }
}
