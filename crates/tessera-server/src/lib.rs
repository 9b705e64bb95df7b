//! HTTP surface for the Tessera OpenID Connect relying party.
//!
//! Exposes the login flow to a browser frontend:
//!
//! - `POST /auth/start` returns the provider authorization URL and state
//! - `POST /auth/callback` completes a login from `{code, state}`
//! - `GET /sessions/{state}` reads back a completed login
//! - `GET /health` and `GET /openapi.json`
//!
//! CORS is limited to the configured frontend origins, the `/auth` routes
//! are rate limited, and every request is logged.
//!
//! # Example
//!
//! ```ignore
//! use tessera_oidc::{AuthFlow, OidcConfig, StoreConfig};
//! use tessera_server::{Server, ServerConfig};
//!
//! let flow = AuthFlow::connect(OidcConfig::default(), StoreConfig::default()).await?;
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8001".parse()?);
//!
//! Server::new(flow, config).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod ratelimit;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use ratelimit::{rate_limit_middleware, request_logging_middleware};
pub use routes::{CallbackRequest, SessionResponse, StartResponse};
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
};
use tessera_oidc::AuthFlow;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The Tessera HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given flow and configuration.
    pub fn new(flow: AuthFlow, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(flow, config),
        }
    }

    /// Create a server around a flow shared with other tasks.
    pub fn with_shared_flow(flow: Arc<AuthFlow>, config: ServerConfig) -> Self {
        Self {
            state: AppState::from_shared(flow, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::get;

        let mut router = Router::new()
            .merge(routes::health_routes())
            .route("/openapi.json", get(routes::openapi_json))
            .route("/sessions/{state}", get(routes::get_session_handler))
            .nest("/auth", self.auth_routes())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// Login routes, rate limited as a group.
    fn auth_routes(&self) -> Router<AppState> {
        use axum::routing::post;

        Router::new()
            .route("/start", post(routes::start_handler))
            .route("/callback", post(routes::callback_handler))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::rate_limit_middleware,
            ))
    }

    /// CORS for the configured frontend origins. Unparseable origins are skipped.
    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins: Vec<HeaderValue> = self
            .state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            return None;
        }

        Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        self.run_with_shutdown(addr, std::future::pending()).await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read bound address: {}", e)))?;

        info!(addr = %local_addr, "Starting server");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }

    /// Get the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use tessera_oidc::{
        CompletedSession, FlowStore, HttpProvider, OidcConfig, ProviderEndpoints, StoreConfig,
        UserInfo,
    };
    use tower::ServiceExt;

    /// A flow pointed at an address nothing listens on; only the store is exercised.
    fn offline_flow() -> AuthFlow {
        let config = OidcConfig::new("http://127.0.0.1:9");
        let endpoints = ProviderEndpoints::fallback(&config);
        let provider = HttpProvider::from_config(&config, endpoints.clone()).unwrap();
        let store = FlowStore::new(StoreConfig::default()).unwrap();
        AuthFlow::new(config, endpoints, store, Arc::new(provider))
    }

    fn test_server() -> Server {
        Server::new(
            offline_flow(),
            ServerConfig::new()
                .with_rate_limiting(false)
                .with_request_logging(false),
        )
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_server().router();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health = body_json(response).await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["discovery"], "fallback");
        assert_eq!(health["pending"], 0);
        assert_eq!(health["sessions"], 0);
    }

    #[tokio::test]
    async fn test_start_returns_url_and_state() {
        let server = test_server();
        let app = server.router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/start")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let state = body["state"].as_str().unwrap();
        let auth_url = body["auth_url"].as_str().unwrap();
        assert!(auth_url.starts_with("http://127.0.0.1:9/oidc/authorize?"));
        assert!(auth_url.contains(&format!("state={state}")));
        assert_eq!(server.state().flow.store().stats().await.pending, 1);
    }

    #[tokio::test]
    async fn test_callback_unknown_state_is_404() {
        let app = test_server().router();

        let response = app
            .oneshot(post_json(
                "/auth/callback",
                serde_json::json!({"code": "c1", "state": "never-issued"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], "unknown_or_expired_state");
    }

    #[tokio::test]
    async fn test_callback_missing_field_rejected() {
        let app = test_server().router();

        let response = app
            .oneshot(post_json(
                "/auth/callback",
                serde_json::json!({"code": "c1"}),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_callback_transport_failure_is_bad_gateway() {
        let server = test_server();
        let start = server.state().flow.start_authorization().await;
        let app = server.router();

        let response = app
            .oneshot(post_json(
                "/auth/callback",
                serde_json::json!({"code": "c1", "state": start.state}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["code"], "token_exchange_failed");
    }

    #[tokio::test]
    async fn test_session_lookup() {
        let server = test_server();
        let session = CompletedSession {
            access_token: "at1".to_string(),
            id_token: "idt1".to_string(),
            expires_in: 3600,
            scope: "openid".to_string(),
            user: UserInfo {
                sub: "u1".to_string(),
                email: "u1@example.com".to_string(),
                name: None,
            },
        };
        server.state().flow.store().put_completed("s1", session).await;
        let app = server.router();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/sessions/s1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["access_token"], "at1");
        assert_eq!(body["user"]["sub"], "u1");

        let response = app
            .oneshot(Request::builder().uri("/sessions/s2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "not_found");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_frontend() {
        let app = test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/auth/start")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_rejects_other_origin() {
        let app = test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            response
                .headers()
                .get("access-control-allow-origin")
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let app = test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let doc = body_json(response).await;
        assert!(doc["paths"]["/auth/callback"]["post"].is_object());
        assert!(doc["paths"]["/sessions/{state}"]["get"].is_object());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let server = Server::new(
            offline_flow(),
            ServerConfig::new()
                .with_rate_limiting(false)
                .with_request_logging(false)
                .with_max_body_size(128),
        );
        let app = server.router();

        let response = app
            .oneshot(post_json(
                "/auth/callback",
                serde_json::json!({"code": "x".repeat(1024), "state": "s1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::new()
            .with_bind_address("0.0.0.0:9000".parse().unwrap())
            .with_rate_limiting(false)
            .with_request_logging(true);

        assert_eq!(config.bind_address.port(), 9000);
        assert!(!config.rate_limiting);
        assert!(config.request_logging);
    }
}
