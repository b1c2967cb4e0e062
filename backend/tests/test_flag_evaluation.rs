//! Flag evaluation against real transaction metadata
//!
//! Definitions come from policy JSON; the field map is built from a
//! validated transaction and a sanction verdict, the same way the pipeline
//! builds it.

use cryptopix_risk_core::flags::{collect_scoring_flags, evaluate_flags, FlagOrigin};
use cryptopix_risk_core::models::{
    FieldMap, SanctionAction, SanctionStatus, SanctionVerdict, TransactionContext,
};
use cryptopix_risk_core::policy::PolicySnapshot;
use serde_json::json;

fn context(amount_fiat: f64, blockchain: &str, pix_key_type: &str) -> TransactionContext {
    let body = json!({
        "transaction_id": "tx-flags",
        "crypto_details": {
            "transaction_hash": "0xhash",
            "blockchain": blockchain,
            "from_address": "0xfrom",
            "to_address": "0xto",
            "asset_ticker": "USDT",
            "amount_crypto": 900.0,
            "timestamp": "2024-05-01T12:00:00Z"
        },
        "pix_details": {
            "pix_key": "key",
            "pix_key_type": pix_key_type,
            "receiver_name": "Ana",
            "bank_name": "Banco",
            "bank_ispb": "87654321",
            "amount_fiat": amount_fiat
        }
    });
    TransactionContext::from_json(&body.to_string()).unwrap()
}

fn policy() -> PolicySnapshot {
    let json = r#"{
        "flags": [
            {"name": "large_transaction_volume", "weight": 0.7,
             "rules": [{"field": "amount_fiat", "condition": "gte", "value": 10000.0}]},
            {"name": "tron_stablecoin", "weight": 0.2,
             "rules": [
                {"field": "blockchain", "condition": "eq", "value": "Tron"},
                {"field": "asset_ticker", "condition": "in", "value": ["USDT", "USDC"]}
             ]},
            {"name": "anonymous_key", "weight": 0.3,
             "rules": [{"field": "pix_key_type", "condition": "eq", "value": "EVP"}]},
            {"name": "geo_block", "weight": 0.9,
             "rules": [{"field": "country_iso", "condition": "eq", "value": "KP"}]},
            {"name": "fuzzy_receiver", "weight": 0.4,
             "rules": [{"field": "receiver_name", "condition": "sounds_like", "value": "Anna"}]},
            {"name": "fiat_amount", "type": "numeric", "default_value": 0, "weight": 0.1,
             "rules": [{"field": "amount_fiat", "condition": ">", "value": 1000}]}
        ]
    }"#;
    PolicySnapshot::from_json(json).unwrap().snapshot
}

fn fields(ctx: &TransactionContext) -> FieldMap {
    FieldMap::for_transaction(ctx, &SanctionVerdict::clean(ctx.screened_address(), 0.1))
}

#[test]
fn test_one_flag_per_definition_in_order() {
    let ctx = context(5000.0, "Ethereum", "CPF");
    let flags = evaluate_flags(&fields(&ctx), &policy().flags);

    let names: Vec<&str> = flags.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "large_transaction_volume",
            "tron_stablecoin",
            "anonymous_key",
            "geo_block",
            "fuzzy_receiver",
            "fiat_amount"
        ]
    );
}

#[test]
fn test_and_semantics_across_rules() {
    let eth = evaluate_flags(&fields(&context(50.0, "Ethereum", "CPF")), &policy().flags);
    let tron = evaluate_flags(&fields(&context(50.0, "Tron", "CPF")), &policy().flags);

    assert!(!eth[1].is_active);
    assert!(tron[1].is_active);
    match &tron[1].origin {
        FlagOrigin::Configured { matched_rules } => assert_eq!(matched_rules.len(), 2),
        other => panic!("unexpected origin {other:?}"),
    }
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    let flags = evaluate_flags(&fields(&context(10_000.0, "Ethereum", "CPF")), &policy().flags);
    assert!(flags[0].is_active);
    assert_eq!(flags[0].value, json!(true));
}

#[test]
fn test_absent_field_is_inactive() {
    let flags = evaluate_flags(&fields(&context(50_000.0, "Ethereum", "EVP")), &policy().flags);
    let geo = &flags[3];

    assert!(!geo.is_active);
    assert_eq!(geo.reason, "Not all rules matched.");
}

#[test]
fn test_unsupported_operator_is_skipped_not_fatal() {
    let flags = evaluate_flags(&fields(&context(50_000.0, "Ethereum", "EVP")), &policy().flags);
    let fuzzy = &flags[4];

    assert!(!fuzzy.is_active);
    assert!(fuzzy.reason.starts_with("Skipped:"));
    // the rest of the policy still evaluates
    assert!(flags[0].is_active);
    assert!(flags[2].is_active);
}

#[test]
fn test_numeric_flag_values() {
    let active = evaluate_flags(&fields(&context(2500.0, "Ethereum", "CPF")), &policy().flags);
    assert_eq!(active[5].value, json!(2500.0));

    let inactive = evaluate_flags(&fields(&context(500.0, "Ethereum", "CPF")), &policy().flags);
    assert!(!inactive[5].is_active);
    assert_eq!(inactive[5].value, json!(0));
}

#[test]
fn test_derived_flag_joins_configured_flags() {
    let ctx = context(15_000.0, "Ethereum", "CPF");
    let verdict = SanctionVerdict {
        status: SanctionStatus::Sanctioned,
        suggested_action: SanctionAction::Block,
        ..SanctionVerdict::clean("0xfrom", 0.95)
    };
    let metadata = FieldMap::for_transaction(&ctx, &verdict);

    let configured = evaluate_flags(&metadata, &policy().flags);
    let count = configured.len();
    let all = collect_scoring_flags(configured, &verdict);

    assert_eq!(all.len(), count + 1);
    let derived = all.last().unwrap();
    assert_eq!(derived.name, "sherlock_sanction_flag_sanctioned");
    assert_eq!(derived.weight, 0.95);
    assert!(derived.is_active && derived.is_derived());
}

#[test]
fn test_clean_verdict_adds_no_flag() {
    let ctx = context(15_000.0, "Ethereum", "CPF");
    let verdict = SanctionVerdict::clean("0xfrom", 0.1);
    let configured = evaluate_flags(&fields(&ctx), &policy().flags);
    let count = configured.len();

    assert_eq!(collect_scoring_flags(configured, &verdict).len(), count);
}
