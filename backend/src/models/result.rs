//! Analysis result
//!
//! The only entity that gets persisted. Created once per transaction and
//! never updated.

use crate::models::verdict::{SanctionStatus, SanctionVerdict};
use crate::risk::{RiskLevel, TriggeredRule};
use crate::scoring::ScoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final recommended action for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Approve,
    ReviewManual,
    Reject,
    /// Valid value with no producer in the current pipeline
    Pending,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Approve => "APPROVE",
            Disposition::ReviewManual => "REVIEW_MANUAL",
            Disposition::Reject => "REJECT",
            Disposition::Pending => "PENDING",
        }
    }
}

/// Scorer output as reported to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub probability_score: f64,
    pub raw_score: f64,
    pub flags_used_count: usize,
    pub summary: String,
}

impl From<&ScoreResult> for ScoreSummary {
    fn from(score: &ScoreResult) -> Self {
        Self {
            probability_score: score.probability_score,
            raw_score: score.raw_score,
            flags_used_count: score.flags_used.len(),
            summary: score.summary.clone(),
        }
    }
}

/// Screener output as reported to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionSummary {
    pub overall_sanction_status: SanctionStatus,
    pub overall_risk_score: f64,
    pub sherlock_flags_count: usize,
}

impl From<&SanctionVerdict> for SanctionSummary {
    fn from(verdict: &SanctionVerdict) -> Self {
        Self {
            overall_sanction_status: verdict.status,
            overall_risk_score: verdict.risk_score,
            sherlock_flags_count: verdict.flags.len(),
        }
    }
}

/// Outbound response for one analyzed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub transaction_id: String,
    pub overall_risk_level: RiskLevel,
    pub suggested_action: Disposition,
    pub score_result_summary: ScoreSummary,
    pub sherlock_result_summary: SanctionSummary,
    pub triggered_rules: Vec<TriggeredRule>,
    pub analysis_timestamp: DateTime<Utc>,
    pub message: String,
    /// SHA-256 of the policy snapshot the decision was made with
    pub policy_fingerprint: String,
}
