//! Error types for hybridhr

use thiserror::Error;

/// Result type alias using HybridError
pub type Result<T> = std::result::Result<T, HybridError>;

/// Error type alias for convenience
pub type Error = HybridError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Which retriever a degradation or failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retriever {
    Structured,
    Semantic,
}

impl std::fmt::Display for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => f.write_str("structured"),
            Self::Semantic => f.write_str("semantic"),
        }
    }
}

/// Main error type for hybridhr
#[derive(Debug, Error)]
pub enum HybridError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{retriever} retrieval unavailable: {reason}")]
    RetrievalUnavailable { retriever: Retriever, reason: String },

    #[error("No evidence found for query")]
    NoEvidenceFound,

    #[error("Completion service error: {0}")]
    CompletionService(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl HybridError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoEvidenceFound => exit_codes::NOT_FOUND,
            Self::Config(_) | Self::Regex(_) | Self::InvalidInput(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Wrap any error raised while talking to a retrieval gateway
    pub fn unavailable(retriever: Retriever, err: impl std::fmt::Display) -> Self {
        Self::RetrievalUnavailable {
            retriever,
            reason: err.to_string(),
        }
    }

    /// Errors the pipeline recovers from instead of surfacing
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Regex(_))
    }
}
