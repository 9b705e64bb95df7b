//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tessera_oidc::OidcError;
use thiserror::Error;
use utoipa::ToSchema;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Authorization flow error.
    #[error(transparent)]
    Oidc(#[from] OidcError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Forward a provider status when it is an error status, otherwise 502.
fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl ServerError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded")
            }
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ServerError::Oidc(e) => match e {
                OidcError::UnknownOrExpiredState => {
                    (StatusCode::NOT_FOUND, "unknown_or_expired_state")
                }
                OidcError::SessionNotFound => (StatusCode::NOT_FOUND, "not_found"),
                OidcError::TokenExchangeFailed { status, .. } => {
                    (upstream_status(*status), "token_exchange_failed")
                }
                OidcError::UserinfoFetchFailed { status, .. } => {
                    (upstream_status(*status), "userinfo_fetch_failed")
                }
                OidcError::MissingAccessToken => (StatusCode::BAD_REQUEST, "missing_access_token"),
                OidcError::DiscoveryUnavailable(_) => {
                    (StatusCode::BAD_GATEWAY, "discovery_unavailable")
                }
                OidcError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: impl Into<ServerError>) -> StatusCode {
        e.into().status_and_code().0
    }

    #[test]
    fn test_unknown_state_is_404() {
        let err = ServerError::from(OidcError::UnknownOrExpiredState);
        assert_eq!(
            err.status_and_code(),
            (StatusCode::NOT_FOUND, "unknown_or_expired_state")
        );
    }

    #[test]
    fn test_provider_status_forwarded() {
        let err = OidcError::TokenExchangeFailed {
            status: Some(400),
            message: "invalid_grant".to_string(),
        };
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

        let err = OidcError::UserinfoFetchFailed {
            status: Some(401),
            message: "invalid_token".to_string(),
        };
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_transport_failure_is_bad_gateway() {
        let err = OidcError::TokenExchangeFailed {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_non_error_provider_status_is_bad_gateway() {
        for status in [200, 302, 99, 1000] {
            let err = OidcError::TokenExchangeFailed {
                status: Some(status),
                message: String::new(),
            };
            assert_eq!(status_of(err), StatusCode::BAD_GATEWAY, "status {status}");
        }
    }

    #[test]
    fn test_session_not_found() {
        assert_eq!(
            ServerError::from(OidcError::SessionNotFound).status_and_code(),
            (StatusCode::NOT_FOUND, "not_found")
        );
    }

    #[test]
    fn test_config_error_is_500() {
        let err = ServerError::from(OidcError::Config("bad provider url".to_string()));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "config_error")
        );
        assert_eq!(err.to_string(), "Config error: bad provider url");
    }

    #[test]
    fn test_missing_access_token_is_400() {
        assert_eq!(
            ServerError::from(OidcError::MissingAccessToken).status_and_code(),
            (StatusCode::BAD_REQUEST, "missing_access_token")
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ServerError::from(OidcError::UnknownOrExpiredState).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "unknown_or_expired_state");
        assert_eq!(error.message, "Unknown or expired state");
    }
}
