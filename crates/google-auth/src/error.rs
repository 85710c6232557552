//! Error types for OAuth operations

/// Errors from the authorization-code flow and token refresh.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The provider rejected the code or refresh token (`invalid_grant`).
    /// Retrying with the same grant will not help.
    #[error("grant rejected by provider: {0}")]
    InvalidGrant(String),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
