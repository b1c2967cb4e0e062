//! Field map used for rule evaluation
//!
//! Flattens a transaction (plus the screener's verdict) into a
//! `field name → JSON value` mapping. Flag rules and context-rule triggers
//! look fields up by name; a field that is not present simply makes the
//! rule false.
//!
//! Keys are kept in a `BTreeMap` so serialized output is stable across runs.

use crate::models::transaction::TransactionContext;
use crate::models::verdict::SanctionVerdict;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field name → value mapping
///
/// # Field Categories
///
/// **Crypto leg**: transaction_hash, blockchain, from_address, to_address,
/// asset_ticker, amount_crypto, timestamp, contract_address?, transaction_type?
///
/// **Fiat leg**: pix_key, pix_key_type, receiver_name, receiver_document?,
/// bank_name, bank_ispb, amount_fiat, pix_transaction_id?
///
/// **Requester**: user_id?, ip_address?, device_fingerprint?
///
/// **Screening**: sherlock_sanction_status, sherlock_risk_score
///
/// Fields marked `?` are only present when the request carried them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    fields: BTreeMap<String, Value>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the metadata consumed by the flag evaluator
    pub fn for_transaction(ctx: &TransactionContext, verdict: &SanctionVerdict) -> Self {
        let crypto = ctx.crypto();
        let fiat = ctx.fiat();
        let mut map = Self::new();

        // Crypto leg
        map.insert("transaction_hash", crypto.transaction_hash.as_str());
        map.insert("blockchain", crypto.blockchain.as_str());
        map.insert("from_address", crypto.from_address.as_str());
        map.insert("to_address", crypto.to_address.as_str());
        map.insert("asset_ticker", crypto.asset_ticker.as_str());
        map.insert("amount_crypto", crypto.amount_crypto);
        map.insert("timestamp", crypto.timestamp.to_rfc3339());
        map.insert_opt("contract_address", crypto.contract_address.as_deref());
        map.insert_opt("transaction_type", crypto.transaction_type.as_deref());

        // Fiat leg
        map.insert("pix_key", fiat.pix_key.as_str());
        map.insert("pix_key_type", fiat.pix_key_type.as_str());
        map.insert("receiver_name", fiat.receiver_name.as_str());
        map.insert_opt("receiver_document", fiat.receiver_document.as_deref());
        map.insert("bank_name", fiat.bank_name.as_str());
        map.insert("bank_ispb", fiat.bank_ispb.as_str());
        map.insert("amount_fiat", fiat.amount_fiat);
        map.insert_opt("pix_transaction_id", fiat.pix_transaction_id.as_deref());

        // Requester
        map.insert_opt("user_id", ctx.user_id());
        map.insert_opt("ip_address", ctx.ip_address());
        map.insert_opt("device_fingerprint", ctx.device_fingerprint());

        // Screening
        map.insert("sherlock_sanction_status", verdict.status.as_str());
        map.insert("sherlock_risk_score", verdict.risk_score);

        map
    }

    /// Insert a value; `null` is treated as absent and not stored
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if !value.is_null() {
            self.fields.insert(field.into(), value);
        }
    }

    pub fn insert_opt(&mut self, field: impl Into<String>, value: Option<&str>) {
        if let Some(v) = value {
            self.insert(field, v);
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Overlay another map; keys in `other` win
    pub fn extend(&mut self, other: &FieldMap) {
        for (k, v) in other.iter() {
            self.fields.insert(k.clone(), v.clone());
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_not_stored() {
        let mut map = FieldMap::new();
        map.insert("a", Value::Null);
        map.insert("b", 1.5);
        assert!(!map.contains("a"));
        assert_eq!(map.get("b"), Some(&json!(1.5)));
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = FieldMap::new().with("x", 1).with("y", "keep");
        let overlay = FieldMap::new().with("x", 2);
        base.extend(&overlay);
        assert_eq!(base.get("x"), Some(&json!(2)));
        assert_eq!(base.get("y"), Some(&json!("keep")));
    }

    #[test]
    fn test_serializes_in_key_order() {
        let map: FieldMap = vec![("b", json!(1)), ("a", json!(2))].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"a":2,"b":1}"#);
    }
}
