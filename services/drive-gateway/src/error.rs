//! Gateway error types
//!
//! Every variant maps to one HTTP status. Handlers render the body; the
//! status comes from `status_code()` so routes agree on it.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The session has no token set.
    #[error("not authenticated")]
    Unauthenticated,

    /// The callback could not be turned into a token set: missing or
    /// expired authorization, state mismatch, or the token endpoint refused.
    #[error("authorization code exchange failed: {0}")]
    AuthExchange(String),

    /// A Drive call failed before anything needed undoing.
    #[error(transparent)]
    RemoteApi(#[from] drive_api::Error),

    /// The writer grant succeeded but promotion to owner failed.
    #[error("{error} ({rollback})")]
    OwnershipPromotion {
        error: drive_api::Error,
        rollback: Rollback,
    },

    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// What happened to the writer grant after a failed promotion.
#[derive(Error, Debug)]
pub enum Rollback {
    #[error("writer permission revoked")]
    Revoked,

    #[error("writer permission left in place: {0}")]
    Failed(drive_api::Error),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::AuthExchange(_) => StatusCode::BAD_REQUEST,
            Self::RemoteApi(_) | Self::OwnershipPromotion { .. } => StatusCode::BAD_GATEWAY,
            Self::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AuthExchange(_) => "auth_failed",
            Self::RemoteApi(_) => "remote_error",
            Self::OwnershipPromotion { .. } => "promotion_failed",
            Self::NotConfigured(_) => "not_configured",
        }
    }
}

impl From<google_auth::Error> for GatewayError {
    fn from(e: google_auth::Error) -> Self {
        Self::AuthExchange(e.to_string())
    }
}

/// Result alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16, message: &str) -> drive_api::Error {
        drive_api::Error::Api {
            status,
            message: message.into(),
        }
    }

    #[test]
    fn status_codes_per_variant() {
        assert_eq!(
            GatewayError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::AuthExchange("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::RemoteApi(api_error(500, "boom")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::NotConfigured("transfer".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn remote_error_display_is_the_drive_message() {
        let err = GatewayError::from(api_error(404, "File not found: abc."));
        assert_eq!(err.to_string(), "Drive API returned 404: File not found: abc.");
    }

    #[test]
    fn promotion_error_reports_rollback_outcome() {
        let revoked = GatewayError::OwnershipPromotion {
            error: api_error(403, "Consent is required"),
            rollback: Rollback::Revoked,
        };
        assert_eq!(
            revoked.to_string(),
            "Drive API returned 403: Consent is required (writer permission revoked)"
        );

        let stuck = GatewayError::OwnershipPromotion {
            error: api_error(403, "Consent is required"),
            rollback: Rollback::Failed(drive_api::Error::Http("connection reset".into())),
        };
        let msg = stuck.to_string();
        assert!(msg.contains("writer permission left in place"), "got: {msg}");
        assert!(msg.contains("connection reset"), "got: {msg}");
        assert_eq!(stuck.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn auth_errors_convert_to_exchange_failure() {
        let err = GatewayError::from(google_auth::Error::InvalidGrant("Bad Request".into()));
        assert!(matches!(err, GatewayError::AuthExchange(_)));
        assert!(err.to_string().contains("Bad Request"));
    }
}
