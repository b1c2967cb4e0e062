//! Analyzer
//!
//! Wires the collaborators (screener, policy store, result store) around
//! the pure decision stages.
//!
//! # Critical Invariants
//!
//! 1. **Fail closed**: a screener error or timeout aborts the run; no
//!    verdict is ever substituted
//! 2. **Snapshot isolation**: the policy `Arc` is taken once per run
//! 3. **Decision first**: persistence happens after the decision and its
//!    failure only adds a warning
//! 4. **Determinism**: same context, verdict and snapshot give the same
//!    result apart from `analysis_timestamp`

use crate::config::AnalyzerSettings;
use crate::decision::decide;
use crate::flags::{collect_scoring_flags, evaluate_flags};
use crate::models::metadata::FieldMap;
use crate::models::result::{AnalysisResult, SanctionSummary, ScoreSummary};
use crate::models::transaction::{TransactionContext, TransactionRequest, ValidationError};
use crate::models::verdict::{EntityType, SanctionVerdict};
use crate::policy::{PolicySnapshot, PolicyStore};
use crate::risk::{assess, build_trigger_context};
use crate::scoring::{score, ScoringConfig};
use crate::screening::{screen_with_timeout, Screener, ScreeningError};
use crate::store::{ResultStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons a run produced no result
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid transaction: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] ScreeningError),
}

impl AnalysisError {
    /// Whether the caller should retry the whole request
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Validation(_) => false,
            AnalysisError::UpstreamUnavailable(e) => e.is_retryable(),
        }
    }
}

/// Non-fatal problem reported next to a valid result
#[derive(Debug, Error)]
pub enum AnalysisWarning {
    #[error("Result for '{transaction_id}' was not persisted: {source}")]
    Persistence {
        transaction_id: String,
        #[source]
        source: StoreError,
    },
}

/// A computed result plus any warnings
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisOutcome {
    pub fn is_persisted(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runs the pipeline for one transaction at a time
///
/// Stateless apart from the injected collaborators; share it behind an
/// `Arc` across concurrent requests.
pub struct Analyzer {
    screener: Arc<dyn Screener>,
    policies: Arc<PolicyStore>,
    results: Arc<dyn ResultStore>,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(
        screener: Arc<dyn Screener>,
        policies: Arc<PolicyStore>,
        results: Arc<dyn ResultStore>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            screener,
            policies,
            results,
            settings,
        }
    }

    pub fn policies(&self) -> &Arc<PolicyStore> {
        &self.policies
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Validate a raw request, then analyze it
    pub async fn analyze_request(
        &self,
        request: TransactionRequest,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let ctx = TransactionContext::new(request)?;
        self.analyze(&ctx).await
    }

    /// Parse and validate a JSON request body, then analyze it
    pub async fn analyze_json(&self, json: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let ctx = TransactionContext::from_json(json)?;
        self.analyze(&ctx).await
    }

    /// Analyze a validated transaction
    ///
    /// # Errors
    /// [`AnalysisError::UpstreamUnavailable`] if the screener fails, times
    /// out or returns a non-finite risk score. Nothing is persisted in that
    /// case.
    pub async fn analyze(&self, ctx: &TransactionContext) -> Result<AnalysisOutcome, AnalysisError> {
        let transaction_id = ctx.transaction_id();
        let snapshot = self.policies.snapshot();

        let verdict = screen_with_timeout(
            self.screener.as_ref(),
            ctx.screened_address(),
            EntityType::WalletAddress,
            self.settings.screener_timeout,
        )
        .await
        .map_err(|e| {
            warn!(transaction_id, error = %e, "Screening failed; aborting analysis");
            e
        })?;
        debug!(
            transaction_id,
            status = verdict.status.as_str(),
            hint = verdict.suggested_action.as_str(),
            "Screening complete"
        );

        let result = evaluate_transaction(ctx, &verdict, &snapshot, &self.settings.scoring, Utc::now());

        info!(
            transaction_id,
            severity = result.overall_risk_level.as_str(),
            disposition = result.suggested_action.as_str(),
            triggered = result.triggered_rules.len(),
            "Analysis complete"
        );

        let mut warnings = Vec::new();
        if let Err(source) = self.results.insert(&result).await {
            warn!(transaction_id, error = %source, "Failed to persist analysis result");
            warnings.push(AnalysisWarning::Persistence {
                transaction_id: transaction_id.to_string(),
                source,
            });
        }

        Ok(AnalysisOutcome { result, warnings })
    }
}

/// Run the decision stages after screening
///
/// Pure: no I/O, no clock. `generated_at` becomes the result timestamp.
///
/// # Arguments
///
/// * `ctx` - Validated transaction
/// * `verdict` - Screener output for the transaction's address, with its
///   risk score already bounded by [`check_verdict`](crate::screening::check_verdict)
/// * `snapshot` - Flag definitions and triggers for this run
/// * `scoring` - Normalization curve
/// * `generated_at` - Timestamp recorded in the result
pub fn evaluate_transaction(
    ctx: &TransactionContext,
    verdict: &SanctionVerdict,
    snapshot: &PolicySnapshot,
    scoring: &ScoringConfig,
    generated_at: DateTime<Utc>,
) -> AnalysisResult {
    let transaction_id = ctx.transaction_id();
    let metadata = FieldMap::for_transaction(ctx, verdict);

    let configured = evaluate_flags(&metadata, &snapshot.flags);
    let flags = collect_scoring_flags(configured, verdict);
    debug!(
        transaction_id,
        evaluated = flags.len(),
        active = flags.iter().filter(|f| f.is_active).count(),
        "Flags evaluated"
    );

    let score_result = score(transaction_id, &flags, &metadata, scoring);
    debug!(
        transaction_id,
        raw = score_result.raw_score,
        probability = score_result.probability_score,
        "Score computed"
    );

    let context = build_trigger_context(&metadata, verdict, &score_result);
    let assessment = assess(transaction_id, &score_result, &context, &snapshot.triggers);
    debug!(transaction_id, summary = %assessment.summary_message, "Risk assessed");

    let decision = decide(&assessment, verdict.suggested_action);

    AnalysisResult {
        transaction_id: transaction_id.to_string(),
        overall_risk_level: decision.severity,
        suggested_action: decision.disposition,
        score_result_summary: ScoreSummary::from(&score_result),
        sherlock_result_summary: SanctionSummary::from(verdict),
        triggered_rules: assessment.triggered_rules,
        analysis_timestamp: generated_at,
        message: decision.message,
        policy_fingerprint: snapshot.fingerprint(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::Disposition;
    use crate::models::transaction::{CryptoLeg, FiatLeg, PixKeyType};
    use crate::models::verdict::{SanctionAction, SanctionStatus};
    use crate::risk::{RiskLevel, RiskTrigger};
    use chrono::TimeZone;

    fn ctx(amount_fiat: f64) -> TransactionContext {
        TransactionContext::new(TransactionRequest {
            transaction_id: "tx-unit".into(),
            crypto_details: CryptoLeg {
                transaction_hash: "0xabc".into(),
                blockchain: "Ethereum".into(),
                from_address: "0xfrom".into(),
                to_address: "0xto".into(),
                asset_ticker: "USDT".into(),
                amount_crypto: 1000.0,
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                contract_address: None,
                transaction_type: None,
            },
            pix_details: FiatLeg {
                pix_key: "user@example.com".into(),
                pix_key_type: PixKeyType::Email,
                receiver_name: "Maria".into(),
                receiver_document: None,
                bank_name: "Banco".into(),
                bank_ispb: "12345678".into(),
                amount_fiat,
                pix_transaction_id: None,
            },
            user_id: None,
            ip_address: None,
            device_fingerprint: None,
        })
        .unwrap()
    }

    #[test]
    fn test_review_hint_on_low_severity() {
        let mut verdict = SanctionVerdict::clean("0xfrom", 0.5);
        verdict.status = SanctionStatus::Unknown;
        verdict.suggested_action = SanctionAction::Review;

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap();
        let result = evaluate_transaction(&ctx(10.0), &verdict, &PolicySnapshot::default(), &ScoringConfig::default(), at);

        assert_eq!(result.suggested_action, Disposition::ReviewManual);
        assert_eq!(result.overall_risk_level, RiskLevel::Low);
        assert_eq!(result.analysis_timestamp, at);
    }

    #[test]
    fn test_fingerprint_recorded() {
        let snapshot = PolicySnapshot::new(
            vec![],
            vec![RiskTrigger::flag_presence("t", "f", RiskLevel::High)],
        );
        let verdict = SanctionVerdict::clean("0xfrom", 0.1);
        let result = evaluate_transaction(&ctx(10.0), &verdict, &snapshot, &ScoringConfig::default(), Utc::now());
        assert_eq!(result.policy_fingerprint, snapshot.fingerprint());
    }

    #[test]
    fn test_validation_error_not_retryable() {
        let err = AnalysisError::from(ValidationError::MissingField("transaction_id"));
        assert!(!err.is_retryable());
    }
}
