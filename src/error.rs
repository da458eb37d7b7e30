//! Error types for the chart geometry and scoring engine

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid coordinate: {field} = {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },

    #[error("Latitude {0} is outside the solvable domain (|lat| < 90)")]
    LatitudeDomain(f64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fabrication sentinel triggered on {date}: {reason}")]
    Fabrication { date: String, reason: String },
}

impl EngineError {
    /// True for the input-error family: malformed caller data that is
    /// surfaced immediately and never defaulted.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EngineError::JsonError(_)
                | EngineError::InvalidTimezone(_)
                | EngineError::DateParseError(_)
                | EngineError::InvalidCoordinate { .. }
                | EngineError::LatitudeDomain(_)
                | EngineError::InvalidInput(_)
        )
    }
}
