//! Tests for the transaction context
//!
//! CRITICAL: both legs must carry a strictly positive amount; a context is
//! only ever built from a validated request.

use cryptopix_risk_core::models::{PixKeyType, TransactionContext, ValidationError};
use serde_json::{json, Value};

fn request() -> Value {
    json!({
        "transaction_id": "tx-100",
        "crypto_details": {
            "transaction_hash": "0xhash",
            "blockchain": "Ethereum",
            "from_address": "0xFromAddress",
            "to_address": "0xToAddress",
            "asset_ticker": "USDT",
            "amount_crypto": 1000.0,
            "timestamp": "2024-05-01T12:00:00Z",
            "contract_address": "0xdac17f958d2ee523a2206206994597c13d831ec7"
        },
        "pix_details": {
            "pix_key": "11122233344",
            "pix_key_type": "CPF",
            "receiver_name": "Joao Souza",
            "bank_name": "Banco Exemplo",
            "bank_ispb": "12345678",
            "amount_fiat": 5000.0
        },
        "user_id": "user-1"
    })
}

#[test]
fn test_context_from_valid_request() {
    let ctx = TransactionContext::from_json(&request().to_string()).unwrap();

    assert_eq!(ctx.transaction_id(), "tx-100");
    assert_eq!(ctx.crypto().blockchain, "Ethereum");
    assert_eq!(ctx.fiat().pix_key_type, PixKeyType::Cpf);
    assert_eq!(ctx.fiat().amount_fiat, 5000.0);
    assert_eq!(ctx.user_id(), Some("user-1"));
    assert_eq!(ctx.ip_address(), None);
    assert_eq!(ctx.screened_address(), "0xFromAddress");
}

#[test]
fn test_zero_fiat_amount_rejected() {
    let mut body = request();
    body["pix_details"]["amount_fiat"] = json!(0.0);

    let err = TransactionContext::from_json(&body.to_string()).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::NonPositiveAmount { field: "pix_details.amount_fiat", .. }
    ));
}

#[test]
fn test_negative_crypto_amount_rejected() {
    let mut body = request();
    body["crypto_details"]["amount_crypto"] = json!(-1.5);

    let err = TransactionContext::from_json(&body.to_string()).unwrap_err();
    assert!(matches!(err, ValidationError::NonPositiveAmount { .. }));
}

#[test]
fn test_blank_transaction_id_rejected() {
    let mut body = request();
    body["transaction_id"] = json!("   ");

    assert_eq!(
        TransactionContext::from_json(&body.to_string()).unwrap_err(),
        ValidationError::MissingField("transaction_id")
    );
}

#[test]
fn test_unknown_pix_key_type_is_malformed() {
    let mut body = request();
    body["pix_details"]["pix_key_type"] = json!("IBAN");

    assert!(matches!(
        TransactionContext::from_json(&body.to_string()),
        Err(ValidationError::Malformed(_))
    ));
}

#[test]
fn test_missing_leg_is_malformed() {
    let mut body = request();
    body.as_object_mut().unwrap().remove("pix_details");

    assert!(matches!(
        TransactionContext::from_json(&body.to_string()),
        Err(ValidationError::Malformed(_))
    ));
}

#[test]
fn test_context_serializes_flat_request() {
    let ctx = TransactionContext::from_json(&request().to_string()).unwrap();
    let value = serde_json::to_value(&ctx).unwrap();

    assert_eq!(value["transaction_id"], "tx-100");
    assert_eq!(value["pix_details"]["pix_key_type"], "CPF");
}
