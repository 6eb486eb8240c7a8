use thiserror::Error;
use std::io;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, CriticError>;

/// Errors that can occur while analyzing a repository or generating text
#[derive(Debug, Error)]
pub enum CriticError {
    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Input validation errors, raised before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// The hosting API has no such repository (or an empty listing)
    #[error("Repository not found: {0}")]
    NotFound(String),

    /// GitHub API specific errors
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitHub API rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The text-generation provider rejected the credential for quota reasons
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Every configured credential hit its quota
    #[error("All {attempts} API keys exhausted")]
    KeysExhausted {
        /// Number of generation attempts made before giving up
        attempts: usize,
    },

    /// Text-generation failures unrelated to quota
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl CriticError {
    /// Checks if this error is a provider quota signal that warrants key rotation
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}
