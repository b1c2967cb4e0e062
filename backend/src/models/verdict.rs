//! Sanction screening verdict
//!
//! Output of the screener for one on-chain address. Produced once per
//! transaction and never modified afterwards.

use serde::{Deserialize, Serialize};

/// Overall sanction/reputation status of a screened entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SanctionStatus {
    Clean,
    HighRisk,
    Sanctioned,
    /// At least one provider could not give a final answer yet
    Unknown,
}

impl SanctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SanctionStatus::Clean => "CLEAN",
            SanctionStatus::HighRisk => "HIGH_RISK",
            SanctionStatus::Sanctioned => "SANCTIONED",
            SanctionStatus::Unknown => "UNKNOWN",
        }
    }

    /// Statuses that inject a synthetic flag before scoring
    pub fn derives_flag(&self) -> bool {
        matches!(self, SanctionStatus::Sanctioned | SanctionStatus::HighRisk)
    }
}

/// Screener's recommended action, independent of the severity pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanctionAction {
    #[serde(alias = "proceed")]
    Allow,
    #[serde(alias = "review_manual")]
    Review,
    Block,
}

impl SanctionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SanctionAction::Allow => "allow",
            SanctionAction::Review => "review",
            SanctionAction::Block => "block",
        }
    }
}

/// Kind of entity submitted for screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EntityType {
    WalletAddress,
}

/// Supporting finding reported by a reputation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFlag {
    pub flag_name: String,
    pub category: String,
    pub value: String,
    /// 0.0 to 1.0
    pub severity: f64,
}

/// Verdict for one screened entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionVerdict {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub status: SanctionStatus,
    /// Highest provider score, 0.0 to 1.0
    pub risk_score: f64,
    pub suggested_action: SanctionAction,
    #[serde(default)]
    pub flags: Vec<ComplianceFlag>,
}

impl SanctionVerdict {
    /// A verdict with no findings
    pub fn clean(entity_id: impl Into<String>, risk_score: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type: EntityType::WalletAddress,
            status: SanctionStatus::Clean,
            risk_score,
            suggested_action: SanctionAction::Allow,
            flags: Vec::new(),
        }
    }
}
