//! Error types for threatscore

use thiserror::Error;

/// Errors that can occur during aggregation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Negative weight for department {department}: {weight}")]
    NegativeWeight { department: String, weight: f64 },

    #[error("Non-finite weight for department {department}")]
    NonFiniteWeight { department: String },

    #[error("Non-finite threat score in department {department} at index {index}")]
    NonFiniteScore { department: String, index: usize },

    #[error("Aggregation produced a non-finite {0}")]
    NonFiniteResult(String),

    #[error("Department has {count} users, more than a user count can hold")]
    UserCountOverflow { count: usize },

    #[error("Invalid score range: min {min} must not exceed max {max}")]
    InvalidScoreRange { min: f64, max: f64 },

    #[error("Invalid generator bounds: [{low}, {high}) is empty")]
    InvalidGeneratorBounds { low: i64, high: i64 },

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
