//! Sanction screening
//!
//! The screener is the only stage that performs I/O. It is consumed through
//! the [`Screener`] trait; failures and timeouts are errors, never a CLEAN
//! verdict.

pub mod watchlist;

use crate::models::verdict::{EntityType, SanctionVerdict};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub use watchlist::{aggregate, ProviderList, WatchlistEntry, WatchlistError, WatchlistScreener};

/// Errors from the screening collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScreeningError {
    #[error("Screening provider '{provider}' unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Screening of '{entity_id}' timed out after {timeout:?}")]
    Timeout { entity_id: String, timeout: Duration },

    #[error("Screening of '{entity_id}' returned an unusable verdict: {reason}")]
    InvalidVerdict { entity_id: String, reason: String },
}

impl ScreeningError {
    /// Whether the caller should retry the whole request
    pub fn is_retryable(&self) -> bool {
        match self {
            ScreeningError::Unavailable { .. } | ScreeningError::Timeout { .. } => true,
            ScreeningError::InvalidVerdict { .. } => false,
        }
    }
}

/// Sanction/reputation lookup for an entity
///
/// Implementations must return the same verdict for the same entity within
/// a session.
#[async_trait]
pub trait Screener: Send + Sync {
    async fn screen(
        &self,
        entity_id: &str,
        entity_type: EntityType,
    ) -> Result<SanctionVerdict, ScreeningError>;
}

/// Run a screener call under a deadline
///
/// A timeout is reported as [`ScreeningError::Timeout`]. The returned
/// verdict is checked with [`check_verdict`] before it reaches scoring.
pub async fn screen_with_timeout(
    screener: &dyn Screener,
    entity_id: &str,
    entity_type: EntityType,
    timeout: Duration,
) -> Result<SanctionVerdict, ScreeningError> {
    match tokio::time::timeout(timeout, screener.screen(entity_id, entity_type)).await {
        Ok(result) => check_verdict(result?),
        Err(_) => {
            warn!(entity_id, ?timeout, "Screener call timed out");
            Err(ScreeningError::Timeout {
                entity_id: entity_id.to_string(),
                timeout,
            })
        }
    }
}

/// Bound a verdict's risk score to 0.0..=1.0
///
/// A non-finite score is rejected; a finite one outside the range is clamped.
pub fn check_verdict(mut verdict: SanctionVerdict) -> Result<SanctionVerdict, ScreeningError> {
    let score = verdict.risk_score;
    if !score.is_finite() {
        warn!(entity_id = %verdict.entity_id, score, "Screener returned a non-finite risk score");
        return Err(ScreeningError::InvalidVerdict {
            entity_id: verdict.entity_id,
            reason: format!("risk score {score} is not finite"),
        });
    }
    if !(0.0..=1.0).contains(&score) {
        warn!(entity_id = %verdict.entity_id, score, "Clamping out-of-range risk score");
        verdict.risk_score = score.clamp(0.0, 1.0);
    }
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    #[async_trait]
    impl Screener for Slow {
        async fn screen(&self, entity_id: &str, _: EntityType) -> Result<SanctionVerdict, ScreeningError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(SanctionVerdict::clean(entity_id, 0.0))
        }
    }

    struct Down;

    #[async_trait]
    impl Screener for Down {
        async fn screen(&self, _: &str, _: EntityType) -> Result<SanctionVerdict, ScreeningError> {
            Err(ScreeningError::Unavailable {
                provider: "test".into(),
                reason: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_error() {
        let err = screen_with_timeout(&Slow, "0xabc", EntityType::WalletAddress, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ScreeningError::Timeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unavailable_passes_through() {
        let err = screen_with_timeout(&Down, "0xabc", EntityType::WalletAddress, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ScreeningError::Unavailable { .. }));
    }

    #[test]
    fn test_non_finite_score_rejected() {
        for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = check_verdict(SanctionVerdict::clean("0xabc", score)).unwrap_err();
            assert!(matches!(err, ScreeningError::InvalidVerdict { ref entity_id, .. } if entity_id == "0xabc"));
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_out_of_range_score_clamped() {
        assert_eq!(check_verdict(SanctionVerdict::clean("a", 1.7)).unwrap().risk_score, 1.0);
        assert_eq!(check_verdict(SanctionVerdict::clean("a", -0.2)).unwrap().risk_score, 0.0);
        assert_eq!(check_verdict(SanctionVerdict::clean("a", 0.4)).unwrap().risk_score, 0.4);
    }
}
