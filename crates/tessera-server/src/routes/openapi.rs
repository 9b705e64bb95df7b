//! OpenAPI documentation.

use axum::Json;
use utoipa::OpenApi;

use super::{auth, health, sessions};
use crate::error::ErrorResponse;

/// OpenAPI documentation for the Tessera API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tessera API",
        description = "OpenID Connect relying party: authorization code flow with PKCE",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        health::health,
        auth::start_handler,
        auth::callback_handler,
        sessions::get_session_handler,
    ),
    components(
        schemas(
            health::HealthResponse,
            auth::StartResponse,
            auth::CallbackRequest,
            auth::SessionResponse,
            auth::UserResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login flow"),
        (name = "sessions", description = "Completed sessions"),
    )
)]
pub struct ApiDoc;

/// GET /openapi.json - Serve the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
