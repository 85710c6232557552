//! Error types for Drive API calls

/// Errors from Drive REST calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure: DNS, connect, TLS, timeout.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Drive answered with a non-2xx status. `message` is Google's
    /// `error.message` when the body carried one, the raw body otherwise.
    #[error("Drive API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid Drive API response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Api { status: 401, .. } => "unauthorized",
            Self::Api { status: 403, .. } => "forbidden",
            Self::Api { status: 404, .. } => "not_found",
            Self::Api { .. } => "api",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Result alias for Drive operations.
pub type Result<T> = std::result::Result<T, Error>;
