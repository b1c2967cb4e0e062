//! Analyzer settings
//!
//! Read from the environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `CRYPTOPIX_SCREENER_TIMEOUT_MS` | 2000 |
//! | `CRYPTOPIX_SCORE_CURVE` | `linear` (or `logistic`) |
//! | `CRYPTOPIX_SCORE_CEILING` | 2.0 |
//! | `CRYPTOPIX_SCORE_MIDPOINT` | 1.0 |
//! | `CRYPTOPIX_SCORE_STEEPNESS` | 4.0 |

use crate::scoring::{ScoreCurve, ScoringConfig};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SCREENER_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_SCORE_CEILING: f64 = 2.0;
pub const DEFAULT_SCORE_MIDPOINT: f64 = 1.0;
pub const DEFAULT_SCORE_STEEPNESS: f64 = 4.0;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("unknown score curve {0:?} (expected linear or logistic)")]
    UnknownCurve(String),
}

/// Runtime settings of the analyzer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerSettings {
    /// Deadline for one screener call
    pub screener_timeout: Duration,
    pub scoring: ScoringConfig,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            screener_timeout: Duration::from_millis(DEFAULT_SCREENER_TIMEOUT_MS),
            scoring: ScoringConfig::default(),
        }
    }
}

impl AnalyzerSettings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        let timeout_ms: u64 = parse_var("CRYPTOPIX_SCREENER_TIMEOUT_MS", DEFAULT_SCREENER_TIMEOUT_MS)?;

        let curve = match get_var_or("CRYPTOPIX_SCORE_CURVE", "linear").to_ascii_lowercase().as_str() {
            "linear" => ScoreCurve::Linear {
                ceiling: parse_var("CRYPTOPIX_SCORE_CEILING", DEFAULT_SCORE_CEILING)?,
            },
            "logistic" => ScoreCurve::Logistic {
                midpoint: parse_var("CRYPTOPIX_SCORE_MIDPOINT", DEFAULT_SCORE_MIDPOINT)?,
                steepness: parse_var("CRYPTOPIX_SCORE_STEEPNESS", DEFAULT_SCORE_STEEPNESS)?,
            },
            other => return Err(SettingsError::UnknownCurve(other.to_string())),
        };

        Ok(Self {
            screener_timeout: Duration::from_millis(timeout_ms),
            scoring: ScoringConfig { curve },
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.screener_timeout = timeout;
        self
    }

    pub fn with_curve(mut self, curve: ScoreCurve) -> Self {
        self.scoring.curve = curve;
        self
    }
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, SettingsError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SettingsError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 5] = [
        "CRYPTOPIX_SCREENER_TIMEOUT_MS",
        "CRYPTOPIX_SCORE_CURVE",
        "CRYPTOPIX_SCORE_CEILING",
        "CRYPTOPIX_SCORE_MIDPOINT",
        "CRYPTOPIX_SCORE_STEEPNESS",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn defaults_without_env() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();

        let settings = AnalyzerSettings::from_env().expect("should parse settings");
        assert_eq!(settings, AnalyzerSettings::default());
        assert_eq!(settings.screener_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn logistic_curve_from_env() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();
        env::set_var("CRYPTOPIX_SCORE_CURVE", "Logistic");
        env::set_var("CRYPTOPIX_SCORE_STEEPNESS", "6");
        env::set_var("CRYPTOPIX_SCREENER_TIMEOUT_MS", "150");

        let settings = AnalyzerSettings::from_env().expect("should parse settings");
        assert_eq!(
            settings.scoring.curve,
            ScoreCurve::Logistic {
                midpoint: 1.0,
                steepness: 6.0
            }
        );
        assert_eq!(settings.screener_timeout, Duration::from_millis(150));
        clear();
    }

    #[test]
    fn invalid_values_rejected() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();
        env::set_var("CRYPTOPIX_SCREENER_TIMEOUT_MS", "soon");
        assert_eq!(
            AnalyzerSettings::from_env(),
            Err(SettingsError::Invalid {
                key: "CRYPTOPIX_SCREENER_TIMEOUT_MS",
                value: "soon".into()
            })
        );

        clear();
        env::set_var("CRYPTOPIX_SCORE_CURVE", "cubic");
        assert_eq!(
            AnalyzerSettings::from_env(),
            Err(SettingsError::UnknownCurve("cubic".into()))
        );
        clear();
    }
}
