//! Rate limiting and request logging middleware.
//!
//! The `/auth` routes share one global limiter built with governor. Per-IP
//! limiting would need the client address from proxy headers, which depends
//! on deployment.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};

use crate::error::ServerError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limiter Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Rate limiter type alias (uses default clock).
pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a rate limiter with the specified requests per minute.
///
/// A zero rate is treated as one request per minute; callers disable
/// limiting by not installing a limiter at all.
pub fn create_rate_limiter(requests_per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Rate limiting middleware for the `/auth` routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.auth_limiter.as_ref() else {
        return next.run(request).await;
    };

    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = wait.as_secs().max(1);

            tracing::warn!(
                path = %request.uri().path(),
                retry_after_seconds = retry_after,
                "Rate limit exceeded"
            );

            (
                [(header::RETRY_AFTER, retry_after.to_string())],
                ServerError::RateLimitExceeded,
            )
                .into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Structured request logging middleware.
///
/// Logs method, path, status and duration. Session paths carry the state
/// token, so only the route prefix is logged for them.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = loggable_path(request.uri().path());

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

fn loggable_path(path: &str) -> String {
    match path.strip_prefix("/sessions/") {
        Some(_) => "/sessions/{state}".to_string(),
        None => path.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{
        Router,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use tessera_oidc::{AuthFlow, OidcConfig, StoreConfig};
    use tower::ServiceExt;

    async fn create_test_state(config: ServerConfig) -> AppState {
        // nothing listens on port 9, so discovery falls back immediately
        let oidc = OidcConfig::new("http://127.0.0.1:9")
            .with_http_timeout(std::time::Duration::from_millis(200));
        let flow = AuthFlow::connect(oidc, StoreConfig::default()).await.unwrap();
        AppState::new(flow, config)
    }

    async fn test_handler() -> &'static str {
        "ok"
    }

    fn create_test_router(state: AppState) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ))
            .with_state(state)
    }

    async fn status(app: &Router) -> StatusCode {
        app.clone()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_rate_limit_disabled() {
        let state = create_test_state(ServerConfig::new().with_rate_limiting(false)).await;
        assert!(state.auth_limiter.is_none());
        let app = create_test_router(state);

        for _ in 0..10 {
            assert_eq!(status(&app).await, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_burst() {
        let state = create_test_state(ServerConfig::new().with_auth_rpm(2)).await;
        let app = create_test_router(state);

        assert_eq!(status(&app).await, StatusCode::OK);
        assert_eq!(status(&app).await, StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[test]
    fn test_create_rate_limiter() {
        let limiter = create_rate_limiter(60);
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_loggable_path_hides_state() {
        assert_eq!(loggable_path("/sessions/abc123"), "/sessions/{state}");
        assert_eq!(loggable_path("/auth/start"), "/auth/start");
    }
}
