//! Risk decision pipeline
//!
//! Screener → flag evaluator → scorer → trigger engine → reconciler, run
//! once per transaction against one policy snapshot.

pub mod analyzer;

pub use analyzer::{
    evaluate_transaction, AnalysisError, AnalysisOutcome, AnalysisWarning, Analyzer,
};
