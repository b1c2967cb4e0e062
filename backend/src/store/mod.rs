//! Analysis result persistence
//!
//! Results are write-once per transaction id. Persistence failures never
//! change a decision; the pipeline reports them as warnings.

pub mod jsonl;
pub mod memory;

use crate::models::result::AnalysisResult;
use async_trait::async_trait;
use thiserror::Error;

pub use jsonl::JsonLinesResultStore;
pub use memory::InMemoryResultStore;

/// Errors from a result store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Result for transaction '{0}' already stored")]
    DuplicateTransaction(String),

    #[error("Result store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Result serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Result store unavailable: {0}")]
    Unavailable(String),
}

/// Write-once storage of analysis results
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store a result; a second insert for the same transaction id fails
    async fn insert(&self, result: &AnalysisResult) -> Result<(), StoreError>;

    async fn get(&self, transaction_id: &str) -> Result<Option<AnalysisResult>, StoreError>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::result::{AnalysisResult, Disposition, SanctionSummary, ScoreSummary};
    use crate::models::verdict::SanctionStatus;
    use crate::risk::RiskLevel;
    use chrono::{TimeZone, Utc};

    pub fn result(transaction_id: &str) -> AnalysisResult {
        AnalysisResult {
            transaction_id: transaction_id.to_string(),
            overall_risk_level: RiskLevel::Low,
            suggested_action: Disposition::Approve,
            score_result_summary: ScoreSummary {
                probability_score: 0.0,
                raw_score: 0.0,
                flags_used_count: 0,
                summary: String::new(),
            },
            sherlock_result_summary: SanctionSummary {
                overall_sanction_status: SanctionStatus::Clean,
                overall_risk_score: 0.1,
                sherlock_flags_count: 0,
            },
            triggered_rules: vec![],
            analysis_timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            message: "Transaction appears low risk.".into(),
            policy_fingerprint: "0".repeat(64),
        }
    }
}
