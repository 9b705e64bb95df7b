//! Login flow endpoints.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tessera_oidc::{AuthorizationStart, CompletedSession, UserInfo};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, ServerError};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Where to send the browser to log in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartResponse {
    /// Provider authorization URL.
    pub auth_url: String,
    /// Opaque state the provider will echo back on the callback.
    pub state: String,
}

impl From<AuthorizationStart> for StartResponse {
    fn from(start: AuthorizationStart) -> Self {
        Self {
            auth_url: start.auth_url,
            state: start.state,
        }
    }
}

/// Query parameters the provider returned to the redirect URI.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallbackRequest {
    pub code: String,
    pub state: String,
}

/// Identity claims of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<UserInfo> for UserResponse {
    fn from(user: UserInfo) -> Self {
        Self {
            sub: user.sub,
            email: user.email,
            name: user.name,
        }
    }
}

/// A completed login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub access_token: String,
    pub id_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub scope: String,
    pub user: UserResponse,
}

impl From<CompletedSession> for SessionResponse {
    fn from(session: CompletedSession) -> Self {
        Self {
            access_token: session.access_token,
            id_token: session.id_token,
            expires_in: session.expires_in,
            scope: session.scope,
            user: session.user.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /auth/start - Begin a login.
#[utoipa::path(
    post,
    path = "/auth/start",
    responses(
        (status = 200, description = "Authorization URL and state", body = StartResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn start_handler(State(state): State<AppState>) -> Json<StartResponse> {
    Json(state.flow.start_authorization().await.into())
}

/// POST /auth/callback - Complete a login from the provider redirect.
#[utoipa::path(
    post,
    path = "/auth/callback",
    request_body = CallbackRequest,
    responses(
        (status = 200, description = "Login completed", body = SessionResponse),
        (status = 400, description = "No access token issued", body = ErrorResponse),
        (status = 404, description = "Unknown, consumed or expired state", body = ErrorResponse),
        (status = 502, description = "Provider unreachable", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn callback_handler(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = state
        .flow
        .complete_authorization(&request.code, &request.state)
        .await?;
    Ok(Json(session.into()))
}
