//! Completed session lookup.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::error::{ErrorResponse, ServerError};
use crate::routes::auth::SessionResponse;
use crate::state::AppState;

/// GET /sessions/{state} - Read back a completed login.
#[utoipa::path(
    get,
    path = "/sessions/{state}",
    params(("state" = String, Path, description = "State returned by /auth/start")),
    responses(
        (status = 200, description = "Completed session", body = SessionResponse),
        (status = 404, description = "No completed session for this state", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(flow_state): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = state.flow.get_session(&flow_state).await?;
    Ok(Json(session.into()))
}
