//! Watchlist screener
//!
//! In-process implementation of [`Screener`] backed by reputation provider
//! lists. Each provider maps case-insensitive address patterns to findings;
//! the first matching entry wins for that provider. Provider outcomes are
//! then aggregated into one verdict:
//!
//! - overall score: max over providers that answered
//! - any pending provider: base status UNKNOWN, otherwise CLEAN
//! - sanctions/CFT finding: SANCTIONED
//! - PEP/watchlist finding, or AML/illicit finding with severity >= 0.7: HIGH_RISK
//! - CLEAN with overall score >= 0.7: HIGH_RISK
//!
//! Hint: SANCTIONED → block, HIGH_RISK/UNKNOWN → review, CLEAN → allow.

use crate::models::verdict::{
    ComplianceFlag, EntityType, SanctionAction, SanctionStatus, SanctionVerdict,
};
use crate::screening::{Screener, ScreeningError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Score at or above which an otherwise clean entity is high risk
const HIGH_RISK_SCORE: f64 = 0.7;

/// Minimum severity for an AML/illicit finding to count as high risk
const HIGH_RISK_SEVERITY: f64 = 0.7;

/// Errors loading watchlists
#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("Failed to read watchlist file: {0}")]
    LoadError(#[from] std::io::Error),

    #[error("Failed to parse watchlist JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Provider '{provider}' lists an entry with an empty pattern")]
    EmptyPattern { provider: String },
}

/// One listed pattern and what a provider reports for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Case-insensitive substring of the screened address
    pub pattern: String,

    /// Provider score, 0.0 to 1.0
    pub score: f64,

    #[serde(default)]
    pub flags: Vec<ComplianceFlag>,

    /// Entity is under investigation; provider gives no final answer
    #[serde(default)]
    pub pending: bool,

    #[serde(default)]
    pub message: String,
}

fn default_baseline() -> f64 {
    0.1
}

/// One reputation provider's list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderList {
    pub provider: String,

    /// Score reported when no entry matches
    #[serde(default = "default_baseline")]
    pub baseline_score: f64,

    #[serde(default)]
    pub entries: Vec<WatchlistEntry>,
}

/// Whether a provider gave a final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Success,
    Pending,
}

/// What one provider said about an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider: String,
    pub status: ProviderStatus,
    pub score: f64,
    pub flags: Vec<ComplianceFlag>,
    pub message: String,
}

/// Screener over static provider lists
#[derive(Debug, Clone, Default)]
pub struct WatchlistScreener {
    providers: Vec<ProviderList>,
}

impl WatchlistScreener {
    pub fn new(providers: Vec<ProviderList>) -> Self {
        Self { providers }
    }

    /// Parse a JSON array of provider lists
    ///
    /// # Errors
    /// [`WatchlistError::EmptyPattern`] if an entry's pattern is blank; an
    /// empty substring would match every address.
    pub fn from_json(json: &str) -> Result<Self, WatchlistError> {
        let providers: Vec<ProviderList> = serde_json::from_str(json)?;
        if let Some(list) = providers
            .iter()
            .find(|list| list.entries.iter().any(|e| e.pattern.trim().is_empty()))
        {
            return Err(WatchlistError::EmptyPattern {
                provider: list.provider.clone(),
            });
        }
        Ok(Self::new(providers))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WatchlistError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn providers(&self) -> &[ProviderList] {
        &self.providers
    }

    /// Ask every provider about the entity
    pub fn check(&self, entity_id: &str) -> Vec<ProviderOutcome> {
        let needle = entity_id.to_lowercase();

        self.providers
            .iter()
            .map(|list| {
                let hit = list
                    .entries
                    .iter()
                    .filter(|entry| !entry.pattern.trim().is_empty())
                    .find(|entry| needle.contains(&entry.pattern.to_lowercase()));

                match hit {
                    Some(entry) => ProviderOutcome {
                        provider: list.provider.clone(),
                        status: if entry.pending {
                            ProviderStatus::Pending
                        } else {
                            ProviderStatus::Success
                        },
                        score: entry.score,
                        flags: entry.flags.clone(),
                        message: entry.message.clone(),
                    },
                    None => ProviderOutcome {
                        provider: list.provider.clone(),
                        status: ProviderStatus::Success,
                        score: list.baseline_score,
                        flags: Vec::new(),
                        message: format!("No red flags from {}.", list.provider),
                    },
                }
            })
            .collect()
    }
}

/// Fold provider outcomes into one verdict
pub fn aggregate(entity_id: &str, outcomes: &[ProviderOutcome]) -> SanctionVerdict {
    let any_pending = outcomes.iter().any(|o| o.status == ProviderStatus::Pending);
    let mut status = if any_pending {
        SanctionStatus::Unknown
    } else {
        SanctionStatus::Clean
    };

    let mut risk_score: f64 = 0.0;
    let mut flags = Vec::new();
    let mut sanction_hit = false;
    let mut high_risk_hit = false;

    for outcome in outcomes.iter().filter(|o| o.status == ProviderStatus::Success) {
        risk_score = risk_score.max(outcome.score);

        for flag in &outcome.flags {
            let name = flag.flag_name.to_lowercase();
            if name.contains("sanction") || name.contains("cft") {
                sanction_hit = true;
            }
            if name.contains("pep") || name.contains("watchlist") {
                high_risk_hit = true;
            }
            if matches!(flag.category.as_str(), "AML" | "Illicit Activities")
                && flag.severity >= HIGH_RISK_SEVERITY
            {
                high_risk_hit = true;
            }
            flags.push(flag.clone());
        }
    }

    if sanction_hit {
        status = SanctionStatus::Sanctioned;
    } else if high_risk_hit {
        status = SanctionStatus::HighRisk;
    } else if status == SanctionStatus::Clean && risk_score >= HIGH_RISK_SCORE {
        status = SanctionStatus::HighRisk;
    }

    let suggested_action = match status {
        SanctionStatus::Sanctioned => SanctionAction::Block,
        SanctionStatus::HighRisk | SanctionStatus::Unknown => SanctionAction::Review,
        SanctionStatus::Clean => SanctionAction::Allow,
    };

    SanctionVerdict {
        entity_id: entity_id.to_string(),
        entity_type: EntityType::WalletAddress,
        status,
        risk_score,
        suggested_action,
        flags,
    }
}

#[async_trait]
impl Screener for WatchlistScreener {
    async fn screen(
        &self,
        entity_id: &str,
        _entity_type: EntityType,
    ) -> Result<SanctionVerdict, ScreeningError> {
        let outcomes = self.check(entity_id);
        let verdict = aggregate(entity_id, &outcomes);
        debug!(
            entity_id,
            status = verdict.status.as_str(),
            risk_score = verdict.risk_score,
            "Watchlist screening complete"
        );
        Ok(verdict)
    }
}
