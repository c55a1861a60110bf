use thiserror::Error;

#[derive(Debug, Error)]
pub enum GustError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    #[error("template field missing from row: {field}")]
    Formatting { field: String },

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("auth failed for {provider}: {message}")]
    AuthFailed { provider: String, message: String },

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl GustError {
    /// Returns true for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Upstream { status, .. } => {
                // 5xx = server error (retryable), 4xx = client error (not retryable)
                // status: None = ambiguous (not from HTTP) → safe default: NOT retryable
                status.is_some_and(|s| s >= 500)
            }
            Self::Request(_) => true, // connection errors may be transient
            _ => false,
        }
    }

    /// Returns true for errors that abort the whole run before any row
    /// is processed. Everything else stays contained at row level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
