//! Core error types for Evalrig

use thiserror::Error;

/// Result type alias for Evalrig operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Main error type for Evalrig
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Dataset access errors (fetching, cursor reads)
    #[error("Dataset error: {message}")]
    Dataset {
        message: String,
        dataset_id: Option<u32>,
    },

    /// Algorithm setup/execute/teardown errors, including caught panics
    #[error("Algorithm error: {algorithm}: {message}")]
    Algorithm { algorithm: String, message: String },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    /// An evaluation is already started
    #[error("An evaluation is already running")]
    AlreadyRunning,

    /// No evaluation is started
    #[error("No evaluation is running")]
    NotRunning,

    /// Remote listener id is not registered
    #[error("Unknown listener: {0}")]
    UnknownListener(String),

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// The run was abandoned
    #[error("Evaluation was cancelled")]
    Cancelled,

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

impl EvalError {
    /// Whether the failure is confined to a single algorithm x dataset unit
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EvalError::Dataset { .. } | EvalError::Algorithm { .. } | EvalError::InvalidInput { .. }
        )
    }

    /// Short machine-readable code, used by the remote protocol
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::Config { .. } => "config_error",
            EvalError::Dataset { .. } => "dataset_error",
            EvalError::Algorithm { .. } => "algorithm_error",
            EvalError::InvalidInput { .. } => "invalid_input",
            EvalError::AlreadyRunning => "already_running",
            EvalError::NotRunning => "not_running",
            EvalError::UnknownListener(_) => "unknown_listener",
            EvalError::Io { .. } => "io_error",
            EvalError::Json(_) => "json_error",
            EvalError::Cancelled => "cancelled",
            EvalError::Other(_) => "error",
        }
    }
}
