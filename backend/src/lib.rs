//! CryptoPix Risk Core
//!
//! Risk decision pipeline for crypto-to-Pix transactions: a crypto transfer
//! paired with a fiat payout is screened, flagged, scored, assessed and
//! given one disposition (APPROVE, REVIEW_MANUAL or REJECT).
//!
//! # Architecture
//!
//! - **models**: Transaction context, sanction verdict, analysis result
//! - **screening**: Screener trait, timeout wrapper, watchlist screener
//! - **flags**: Rule-based flag definitions and their evaluation
//! - **scoring**: Weighted probability scorer
//! - **risk**: Risk triggers and severity aggregation
//! - **decision**: Severity/sanction-hint reconciliation
//! - **policy**: Policy snapshots, validation and the CRUD store
//! - **store**: Write-once result persistence
//! - **pipeline**: The analyzer that runs all of the above
//! - **config**: Environment settings
//!
//! # Critical Invariants
//!
//! 1. A `block` sanction hint always yields REJECT with CRITICAL severity
//! 2. Screening failures abort the run; an address is never assumed clean
//! 3. One malformed definition never blocks an assessment
//! 4. Severity is a total order: LOW < MEDIUM < HIGH < CRITICAL

// Module declarations
pub mod config;
pub mod decision;
pub mod flags;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod risk;
pub mod scoring;
pub mod screening;
pub mod store;

// Re-exports for convenience
pub use config::{AnalyzerSettings, SettingsError};
pub use decision::{decide, Decision};
pub use flags::{EvaluatedFlag, FlagDefinition, FlagOrigin, Rule, RuleCondition};
pub use models::{
    AnalysisResult, Disposition, FieldMap, SanctionAction, SanctionStatus, SanctionVerdict,
    TransactionContext, TransactionRequest, ValidationError,
};
pub use pipeline::{evaluate_transaction, AnalysisError, AnalysisOutcome, AnalysisWarning, Analyzer};
pub use policy::{ConfigError, PolicyError, PolicySnapshot, PolicyStore};
pub use risk::{RiskAssessment, RiskLevel, RiskTrigger, TriggerCondition, TriggeredRule};
pub use scoring::{ScoreCurve, ScoreResult, ScoringConfig};
pub use screening::{Screener, ScreeningError, WatchlistScreener};
pub use store::{InMemoryResultStore, JsonLinesResultStore, ResultStore, StoreError};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn cryptopix_risk_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<ffi::analyzer::PyAnalyzer>()?;
    Ok(())
}
