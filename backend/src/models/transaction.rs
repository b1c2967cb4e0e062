//! Transaction model
//!
//! Represents one Crypto-to-Pix operation: an on-chain transfer paired with
//! a Pix payout in BRL. Each transaction has:
//! - A crypto leg (hash, chain, addresses, asset, amount, timestamp)
//! - A fiat leg (Pix key, receiver identity, bank identifiers, amount)
//! - Optional requester metadata (user id, IP address, device fingerprint)
//!
//! CRITICAL: Both legs' amounts must be strictly positive. A
//! `TransactionContext` only exists once that has been checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating an inbound transaction
///
/// Validation happens before the pipeline starts, so none of these have
/// side effects.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required field '{0}' is empty")]
    MissingField(&'static str),

    #[error("Amount for '{field}' must be positive, got {amount}")]
    NonPositiveAmount { field: &'static str, amount: f64 },

    #[error("Malformed transaction payload: {0}")]
    Malformed(String),
}

/// Type of Pix key used by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixKeyType {
    Cpf,
    Cnpj,
    Email,
    Phone,
    Evp,
}

impl PixKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixKeyType::Cpf => "CPF",
            PixKeyType::Cnpj => "CNPJ",
            PixKeyType::Email => "EMAIL",
            PixKeyType::Phone => "PHONE",
            PixKeyType::Evp => "EVP",
        }
    }
}

/// Crypto leg of the operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoLeg {
    /// Hash of the on-chain transaction
    pub transaction_hash: String,

    /// Chain name (e.g. "Ethereum", "Bitcoin", "Polygon")
    pub blockchain: String,

    /// Sender address, the entity that gets screened
    pub from_address: String,

    /// Receiver address (usually an exchange or bridge)
    pub to_address: String,

    /// Asset ticker (e.g. "USDT", "ETH")
    pub asset_ticker: String,

    pub amount_crypto: f64,

    pub timestamp: DateTime<Utc>,

    /// Token contract address, for token transfers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    /// e.g. "ERC20 Transfer"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
}

/// Fiat (Pix) leg of the operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiatLeg {
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
    pub receiver_name: String,

    /// CPF or CNPJ of the receiver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_document: Option<String>,

    pub bank_name: String,

    /// ISPB code of the receiver's bank
    pub bank_ispb: String,

    /// Amount in BRL
    pub amount_fiat: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_transaction_id: Option<String>,
}

/// Inbound request as received from the caller, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub transaction_id: String,
    pub crypto_details: CryptoLeg,
    pub pix_details: FiatLeg,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_fingerprint: Option<String>,
}

/// Validated, immutable view of one transaction
///
/// Constructed once from a [`TransactionRequest`] and read by every stage
/// of the pipeline. There are no setters.
///
/// # Example
/// ```
/// use cryptopix_risk_core::models::transaction::TransactionContext;
///
/// let json = r#"{
///     "transaction_id": "tx-1",
///     "crypto_details": {
///         "transaction_hash": "0xabc",
///         "blockchain": "Ethereum",
///         "from_address": "0xsender",
///         "to_address": "0xexchange",
///         "asset_ticker": "USDT",
///         "amount_crypto": 950.0,
///         "timestamp": "2024-05-01T12:00:00Z"
///     },
///     "pix_details": {
///         "pix_key": "12345678900",
///         "pix_key_type": "CPF",
///         "receiver_name": "Maria Silva",
///         "bank_name": "Banco Exemplo",
///         "bank_ispb": "12345678",
///         "amount_fiat": 5000.0
///     }
/// }"#;
/// let ctx = TransactionContext::from_json(json).unwrap();
/// assert_eq!(ctx.transaction_id(), "tx-1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionContext {
    #[serde(flatten)]
    request: TransactionRequest,
}

impl TransactionContext {
    /// Validate a request and freeze it into a context
    ///
    /// # Errors
    /// Returns [`ValidationError`] if an identifier or address is blank or
    /// if either amount is not a finite, strictly positive number.
    pub fn new(request: TransactionRequest) -> Result<Self, ValidationError> {
        require_non_empty("transaction_id", &request.transaction_id)?;
        require_non_empty("crypto_details.transaction_hash", &request.crypto_details.transaction_hash)?;
        require_non_empty("crypto_details.from_address", &request.crypto_details.from_address)?;
        require_non_empty("crypto_details.to_address", &request.crypto_details.to_address)?;
        require_non_empty("pix_details.pix_key", &request.pix_details.pix_key)?;
        require_non_empty("pix_details.bank_ispb", &request.pix_details.bank_ispb)?;

        require_positive("crypto_details.amount_crypto", request.crypto_details.amount_crypto)?;
        require_positive("pix_details.amount_fiat", request.pix_details.amount_fiat)?;

        Ok(Self { request })
    }

    /// Parse and validate a JSON request body
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let request: TransactionRequest =
            serde_json::from_str(json).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::new(request)
    }

    pub fn transaction_id(&self) -> &str {
        &self.request.transaction_id
    }

    pub fn crypto(&self) -> &CryptoLeg {
        &self.request.crypto_details
    }

    pub fn fiat(&self) -> &FiatLeg {
        &self.request.pix_details
    }

    pub fn user_id(&self) -> Option<&str> {
        self.request.user_id.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.request.ip_address.as_deref()
    }

    pub fn device_fingerprint(&self) -> Option<&str> {
        self.request.device_fingerprint.as_deref()
    }

    /// Address handed to the sanction screener
    pub fn screened_address(&self) -> &str {
        &self.request.crypto_details.from_address
    }

    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }
}

impl TryFrom<TransactionRequest> for TransactionContext {
    type Error = ValidationError;

    fn try_from(request: TransactionRequest) -> Result<Self, Self::Error> {
        Self::new(request)
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn require_positive(field: &'static str, amount: f64) -> Result<(), ValidationError> {
    // NaN fails the comparison as well
    if !(amount.is_finite() && amount > 0.0) {
        return Err(ValidationError::NonPositiveAmount { field, amount });
    }
    Ok(())
}
