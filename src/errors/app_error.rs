use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Application error type for the proxy handlers
///
/// Each variant maps to one of the fault classes the relay distinguishes:
/// missing configuration, missing input, upstream failures (which keep the
/// upstream status code), and transport failures on the dialogue proxy
/// (which use the `{success: false, error}` shape the callers expect).
#[derive(Debug)]
pub enum AppError {
    InternalServerError(String),
    MissingConfiguration(String),
    BadRequest(String),
    Upstream { status: u16, message: String },
    ProxyTransport(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
            AppError::MissingConfiguration(msg) => {
                tracing::error!("Missing configuration: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Upstream { status, message } => {
                tracing::error!("Upstream error ({}): {}", status, message);
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(json!({ "error": message }))).into_response()
            }
            AppError::ProxyTransport(msg) => {
                tracing::error!("Proxy transport error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": msg })),
                )
                    .into_response()
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
            AppError::MissingConfiguration(msg) => write!(f, "Missing configuration: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::Upstream { status, message } => {
                write!(f, "Upstream error ({status}): {message}")
            }
            AppError::ProxyTransport(msg) => write!(f, "Proxy transport error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
