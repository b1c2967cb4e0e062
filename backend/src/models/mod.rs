//! Domain models for the risk pipeline

pub mod metadata;
pub mod result;
pub mod transaction;
pub mod verdict;

// Re-exports
pub use metadata::FieldMap;
pub use result::{AnalysisResult, Disposition, SanctionSummary, ScoreSummary};
pub use transaction::{
    CryptoLeg, FiatLeg, PixKeyType, TransactionContext, TransactionRequest, ValidationError,
};
pub use verdict::{ComplianceFlag, EntityType, SanctionAction, SanctionStatus, SanctionVerdict};
