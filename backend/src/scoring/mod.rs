//! Probability scoring of active flags

pub mod scorer;

pub use scorer::{score, ScoreCurve, ScoreResult, ScoringConfig};
