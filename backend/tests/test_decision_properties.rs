//! Property-based tests for scoring and decision precedence
//!
//! Uses proptest to check the ordering guarantees over arbitrary weights,
//! severities and sanction hints.

use cryptopix_risk_core::decision::decide;
use cryptopix_risk_core::flags::{EvaluatedFlag, FlagOrigin};
use cryptopix_risk_core::models::{Disposition, FieldMap, SanctionAction};
use cryptopix_risk_core::risk::{
    assess, RiskAssessment, RiskLevel, RiskTrigger, ScoreMetric, ThresholdDirection,
    TriggerCondition,
};
use cryptopix_risk_core::scoring::{score, ScoreCurve, ScoringConfig};
use proptest::prelude::*;
use uuid::Uuid;

fn arb_level() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![
        Just(RiskLevel::Low),
        Just(RiskLevel::Medium),
        Just(RiskLevel::High),
        Just(RiskLevel::Critical),
    ]
}

fn arb_hint() -> impl Strategy<Value = SanctionAction> {
    prop_oneof![
        Just(SanctionAction::Allow),
        Just(SanctionAction::Review),
        Just(SanctionAction::Block),
    ]
}

fn arb_curve() -> impl Strategy<Value = ScoreCurve> {
    prop_oneof![
        (0.1f64..10.0).prop_map(|ceiling| ScoreCurve::Linear { ceiling }),
        (0.0f64..3.0, 0.1f64..10.0)
            .prop_map(|(midpoint, steepness)| ScoreCurve::Logistic { midpoint, steepness }),
    ]
}

fn flag(name: String, weight: f64, is_active: bool) -> EvaluatedFlag {
    EvaluatedFlag {
        name,
        is_active,
        weight,
        value: is_active.into(),
        reason: String::new(),
        origin: FlagOrigin::Configured { matched_rules: vec![] },
    }
}

fn flags_from(weights: &[(f64, bool)]) -> Vec<EvaluatedFlag> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &(w, active))| flag(format!("flag_{i}"), w, active))
        .collect()
}

fn assessment(level: RiskLevel) -> RiskAssessment {
    RiskAssessment {
        entity_id: "tx".into(),
        score_id: Uuid::nil(),
        overall_risk_level: level,
        triggered_rules: vec![],
        summary_message: String::new(),
    }
}

/// APPROVE < REVIEW_MANUAL < REJECT
fn rank(disposition: Disposition) -> u8 {
    match disposition {
        Disposition::Approve => 0,
        Disposition::Pending | Disposition::ReviewManual => 1,
        Disposition::Reject => 2,
    }
}

proptest! {
    /// Property: raising one weight never lowers the probability
    #[test]
    fn probability_monotonic_in_weight(
        weights in prop::collection::vec((0.0f64..2.0, any::<bool>()), 1..8),
        pick in any::<prop::sample::Index>(),
        bump in 0.0f64..3.0,
        curve in arb_curve(),
    ) {
        let config = ScoringConfig { curve };
        let base = flags_from(&weights);

        let mut raised = base.clone();
        let i = pick.index(raised.len());
        raised[i].weight += bump;

        let before = score("tx", &base, &FieldMap::new(), &config);
        let after = score("tx", &raised, &FieldMap::new(), &config);

        prop_assert!(after.probability_score >= before.probability_score);
    }

    /// Property: probability stays within [0, 1] and only active flags count
    #[test]
    fn probability_bounded(
        weights in prop::collection::vec((-5.0f64..5.0, any::<bool>()), 0..10),
        curve in arb_curve(),
    ) {
        let result = score("tx", &flags_from(&weights), &FieldMap::new(), &ScoringConfig { curve });

        prop_assert!((0.0..=1.0).contains(&result.probability_score));
        let active = weights.iter().filter(|(_, a)| *a).count();
        prop_assert_eq!(result.flags_used.len(), active);
    }

    /// Property: a block hint always rejects at CRITICAL
    #[test]
    fn block_always_rejects(level in arb_level()) {
        let decision = decide(&assessment(level), SanctionAction::Block);

        prop_assert_eq!(decision.disposition, Disposition::Reject);
        prop_assert_eq!(decision.severity, RiskLevel::Critical);
    }

    /// Property: non-block hints never change severity or lower the disposition
    #[test]
    fn hints_never_downgrade(level in arb_level(), hint in arb_hint()) {
        let plain = decide(&assessment(level), SanctionAction::Allow);
        let hinted = decide(&assessment(level), hint);

        prop_assert!(rank(hinted.disposition) >= rank(plain.disposition));
        if hint != SanctionAction::Block {
            prop_assert_eq!(hinted.severity, level);
        }
    }

    /// Property: overall severity is the max over fired triggers, all kept
    #[test]
    fn severity_is_max_of_fired(levels in prop::collection::vec(arb_level(), 0..8)) {
        let triggers: Vec<RiskTrigger> = levels
            .iter()
            .enumerate()
            .map(|(i, &level)| {
                RiskTrigger::new(
                    format!("always_{i}"),
                    TriggerCondition::ScoreThreshold {
                        metric: ScoreMetric::RawScore,
                        direction: ThresholdDirection::AtOrAbove,
                        threshold: 0.0,
                    },
                    level,
                )
            })
            .collect();
        let scored = score("tx", &[], &FieldMap::new(), &ScoringConfig::default());

        let result = assess("tx", &scored, &FieldMap::new(), &triggers);

        let expected = levels.iter().copied().max().unwrap_or(RiskLevel::Low);
        prop_assert_eq!(result.overall_risk_level, expected);
        prop_assert_eq!(result.triggered_rules.len(), levels.len());
    }
}

#[test]
fn test_no_trigger_means_low_and_approve() {
    let scored = score("tx", &[], &FieldMap::new(), &ScoringConfig::default());
    let result = assess("tx", &scored, &FieldMap::new(), &[]);

    assert_eq!(result.overall_risk_level, RiskLevel::Low);
    assert!(result.triggered_rules.is_empty());
    assert_eq!(decide(&result, SanctionAction::Allow).disposition, Disposition::Approve);
}
