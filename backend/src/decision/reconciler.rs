//! Decision reconciler
//!
//! Combines the trigger-derived severity with the screener's action hint.
//!
//! Precedence, applied after the base severity mapping:
//! 1. `block` always wins: REJECT and CRITICAL, whatever the triggers said
//! 2. `review` only upgrades APPROVE to REVIEW_MANUAL; severity is untouched
//!    and an existing REVIEW_MANUAL or REJECT is left as is
//! 3. `allow` changes nothing

use crate::models::result::Disposition;
use crate::models::verdict::SanctionAction;
use crate::risk::{RiskAssessment, RiskLevel};
use serde::{Deserialize, Serialize};

pub const MSG_LOW: &str = "Transaction appears low risk.";
pub const MSG_MEDIUM: &str = "Transaction flagged for manual review due to medium risk.";
pub const MSG_HIGH: &str = "Transaction requires manual review due to high risk factors.";
pub const MSG_CRITICAL: &str = "Transaction rejected due to critical risk factors.";
pub const MSG_SANCTION_BLOCK: &str =
    "Transaction rejected: Crypto address is sanctioned or highly illicit.";
pub const MSG_SANCTION_REVIEW: &str =
    "Transaction flagged for manual review: Crypto address needs further check.";

/// Final disposition, severity and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub disposition: Disposition,
    pub severity: RiskLevel,
    pub message: String,
}

/// Severity → disposition with its canned message
///
/// MEDIUM and HIGH both go to manual review; only the message differs.
pub fn base_disposition(severity: RiskLevel) -> (Disposition, &'static str) {
    match severity {
        RiskLevel::Critical => (Disposition::Reject, MSG_CRITICAL),
        RiskLevel::High => (Disposition::ReviewManual, MSG_HIGH),
        RiskLevel::Medium => (Disposition::ReviewManual, MSG_MEDIUM),
        RiskLevel::Low => (Disposition::Approve, MSG_LOW),
    }
}

/// Reconcile an assessment with the sanction hint
///
/// # Example
///
/// ```rust
/// use cryptopix_risk_core::decision::decide;
/// use cryptopix_risk_core::models::{Disposition, SanctionAction};
/// use cryptopix_risk_core::risk::{RiskAssessment, RiskLevel};
/// use uuid::Uuid;
///
/// let assessment = RiskAssessment {
///     entity_id: "tx-1".into(),
///     score_id: Uuid::nil(),
///     overall_risk_level: RiskLevel::Low,
///     triggered_rules: vec![],
///     summary_message: String::new(),
/// };
/// let decision = decide(&assessment, SanctionAction::Block);
/// assert_eq!(decision.disposition, Disposition::Reject);
/// assert_eq!(decision.severity, RiskLevel::Critical);
/// ```
pub fn decide(assessment: &RiskAssessment, hint: SanctionAction) -> Decision {
    let severity = assessment.overall_risk_level;
    let (disposition, message) = base_disposition(severity);

    match hint {
        SanctionAction::Block => Decision {
            disposition: Disposition::Reject,
            severity: RiskLevel::Critical,
            message: MSG_SANCTION_BLOCK.to_string(),
        },
        SanctionAction::Review if disposition == Disposition::Approve => Decision {
            disposition: Disposition::ReviewManual,
            severity,
            message: MSG_SANCTION_REVIEW.to_string(),
        },
        SanctionAction::Review | SanctionAction::Allow => Decision {
            disposition,
            severity,
            message: message.to_string(),
        },
    }
}
