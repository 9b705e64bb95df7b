//! API routes.

pub mod auth;
pub mod health;
pub mod openapi;
pub mod sessions;

pub use auth::{
    CallbackRequest, SessionResponse, StartResponse, UserResponse, callback_handler,
    start_handler,
};
pub use health::{HealthResponse, health_routes};
pub use openapi::{ApiDoc, openapi_json};
pub use sessions::get_session_handler;
