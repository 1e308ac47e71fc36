//! Error types for Posture Coach

use thiserror::Error;

/// Errors that can occur while analysing a session
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid pose frame: expected {expected} landmarks, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    #[error("Session not initialized: send an init message first")]
    NotInitialized,

    #[error("Unsupported exercise: {0}")]
    UnsupportedExercise(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Routine store error: {0}")]
    RoutineStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Stable machine-readable code for protocol and CLI error payloads
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidFrame { .. } => "INVALID_FRAME",
            AnalysisError::NotInitialized => "NOT_INITIALIZED",
            AnalysisError::UnsupportedExercise(_) => "UNSUPPORTED_EXERCISE",
            AnalysisError::InvalidTarget(_) => "INVALID_TARGET",
            AnalysisError::JsonError(_) => "JSON_ERROR",
            AnalysisError::Config(_) => "CONFIG_ERROR",
            AnalysisError::RoutineStore(_) => "ROUTINE_STORE_ERROR",
            AnalysisError::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_frame_message() {
        let err = AnalysisError::InvalidFrame {
            expected: 33,
            actual: 32,
        };
        assert_eq!(
            err.to_string(),
            "Invalid pose frame: expected 33 landmarks, got 32"
        );
        assert_eq!(err.code(), "INVALID_FRAME");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AnalysisError = parse.unwrap_err().into();
        assert_eq!(err.code(), "JSON_ERROR");
    }
}
