//! Error types for the seqmetrics-core crate.

use thiserror::Error;

/// Top-level error type for metric computation.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("{metric}: got {targets} targets but {predictions} predictions")]
    LengthMismatch {
        metric: String,
        targets: usize,
        predictions: usize,
    },

    #[error("{metric}: no examples to score")]
    EmptyInput { metric: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Missing key '{key}' in record at position {position}")]
    MissingKey { key: String, position: usize },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl MetricsError {
    pub fn length_mismatch(metric: impl Into<String>, targets: usize, predictions: usize) -> Self {
        Self::LengthMismatch {
            metric: metric.into(),
            targets,
            predictions,
        }
    }

    pub fn empty_input(metric: impl Into<String>) -> Self {
        Self::EmptyInput {
            metric: metric.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn missing_key(key: impl Into<String>, position: usize) -> Self {
        Self::MissingKey {
            key: key.into(),
            position,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MetricsError>;
