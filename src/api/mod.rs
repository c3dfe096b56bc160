pub mod auth;
pub mod complaints;
pub mod state;

pub use state::AppState;

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health check
        .route("/health", get(health))
        // Registration and login
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Complaints
        .route("/submit_complaint", post(complaints::submit_complaint))
        .route("/get_complaints", get(complaints::get_complaints))
        // Known path, wrong method: JSON envelope instead of an empty 405
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// Required-field check shared by the POST handlers: present and non-blank
/// after trimming, with the field name echoed in the rejection.
pub(crate) fn require_field<'a>(
    value: &'a Option<String>,
    name: &str,
) -> Result<&'a str, AppError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("Field '{}' is required", name))),
    }
}
