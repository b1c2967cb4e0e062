//! Policy snapshot
//!
//! Immutable set of flag definitions and risk triggers used for one
//! pipeline run.
//!
//! # Critical Invariants
//!
//! - **Isolation**: a run holds one `Arc<PolicySnapshot>` from start to end
//! - **Tolerant loading**: each definition is parsed on its own; a malformed
//!   one is reported and left out, the rest still load
//! - **Traceability**: `fingerprint()` identifies the exact configuration

use crate::flags::FlagDefinition;
use crate::policy::validation::{validate_flag, validate_trigger, ConfigError};
use crate::risk::RiskTrigger;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors loading or editing policy definitions
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Failed to read policy file: {0}")]
    LoadError(#[from] std::io::Error),

    #[error("Failed to parse policy JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Flag definition '{0}' already exists")]
    DuplicateFlag(String),

    #[error("Risk trigger '{0}' already exists")]
    DuplicateTrigger(String),

    #[error("Flag definition '{0}' not found")]
    FlagNotFound(String),

    #[error("Risk trigger '{0}' not found")]
    TriggerNotFound(String),

    #[error("Definition rejected: {0:?}")]
    Invalid(Vec<ConfigError>),
}

/// Flag definitions and risk triggers, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default)]
    pub flags: Vec<FlagDefinition>,

    #[serde(default)]
    pub triggers: Vec<RiskTrigger>,
}

/// Result of loading a snapshot from JSON
#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    pub snapshot: PolicySnapshot,

    /// Entries that could not be parsed or were duplicates
    pub rejected: Vec<ConfigError>,
}

#[derive(Deserialize)]
struct RawPolicy {
    #[serde(default)]
    flags: Vec<Value>,
    #[serde(default)]
    triggers: Vec<Value>,
}

impl PolicySnapshot {
    pub fn new(flags: Vec<FlagDefinition>, triggers: Vec<RiskTrigger>) -> Self {
        Self { flags, triggers }
    }

    /// Parse a policy document
    ///
    /// The document must be a JSON object with `flags` and `triggers`
    /// arrays. Entries are parsed one by one; failures land in
    /// [`LoadedPolicy::rejected`] instead of failing the load. A repeated
    /// name keeps the first definition.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cryptopix_risk_core::policy::PolicySnapshot;
    ///
    /// let json = r#"{
    ///   "flags": [
    ///     {"name": "large_transaction_volume", "weight": 0.7,
    ///      "rules": [{"field": "amount_fiat", "condition": "gte", "value": 10000.0}]},
    ///     {"name": "broken", "rules": "not-a-list"}
    ///   ],
    ///   "triggers": []
    /// }"#;
    /// let loaded = PolicySnapshot::from_json(json).unwrap();
    /// assert_eq!(loaded.snapshot.flags.len(), 1);
    /// assert_eq!(loaded.rejected.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<LoadedPolicy, PolicyError> {
        let raw: RawPolicy = serde_json::from_str(json)?;
        let mut rejected = Vec::new();

        let flags = parse_entries::<FlagDefinition>(raw.flags, &mut rejected, |f| &f.name, ConfigError::DuplicateFlag);
        let triggers =
            parse_entries::<RiskTrigger>(raw.triggers, &mut rejected, |t| &t.name, ConfigError::DuplicateTrigger);

        for err in &rejected {
            warn!(error = %err, "Policy entry rejected");
        }

        Ok(LoadedPolicy {
            snapshot: Self { flags, triggers },
            rejected,
        })
    }

    /// Load a policy document from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<LoadedPolicy, PolicyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn flag(&self, name: &str) -> Option<&FlagDefinition> {
        self.flags.iter().find(|f| f.name == name)
    }

    pub fn trigger(&self, name: &str) -> Option<&RiskTrigger> {
        self.triggers.iter().find(|t| t.name == name)
    }

    /// Validation problems of loaded definitions
    ///
    /// These definitions stay in the snapshot and are skipped at
    /// evaluation time.
    pub fn issues(&self) -> Vec<ConfigError> {
        let flag_issues = self.flags.iter().filter_map(|f| validate_flag(f).err());
        let trigger_issues = self.triggers.iter().filter_map(|t| validate_trigger(t).err());
        flag_issues.chain(trigger_issues).flatten().collect()
    }

    /// SHA-256 of the snapshot's JSON form, hex encoded
    pub fn fingerprint(&self) -> String {
        // serde_json maps are sorted, so equal snapshots hash equally
        let json = serde_json::to_string(self).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn parse_entries<T: for<'de> Deserialize<'de>>(
    raw: Vec<Value>,
    rejected: &mut Vec<ConfigError>,
    name_of: impl Fn(&T) -> &String,
    duplicate: impl Fn(String) -> ConfigError,
) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(raw.len());

    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(item) => {
                let name = name_of(&item).clone();
                if seen.insert(name.clone()) {
                    parsed.push(item);
                } else {
                    rejected.push(duplicate(name));
                }
            }
            Err(e) => rejected.push(ConfigError::Malformed {
                index,
                reason: e.to_string(),
            }),
        }
    }

    parsed
}
