use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Handler for the /dialogue/initialize endpoint
///
/// Forwards the JSON body verbatim to the dialogue backend and returns the
/// backend's body and status code unchanged.
pub async fn initialize_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    proxy(&state, "/interactions/initialize", &body, "initialize").await
}

/// Handler for the /dialogue/chat endpoint
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    proxy(&state, "/interactions/chat", &body, "chat").await
}

/// Pass-through proxy to the dialogue backend
///
/// No validation of the body beyond it being parseable JSON (enforced by the
/// extractor). Transport failures map to a `{success: false, error}` fault.
async fn proxy(state: &AppState, path: &str, body: &Value, operation: &str) -> AppResult<Response> {
    info!("Dialogue {} request: {}", operation, body);

    let url = format!("{}{}", state.config.dialogue_base_url, path);
    let response = state
        .http
        .post(&url)
        .json(body)
        .send()
        .await
        .map_err(|e| AppError::ProxyTransport(e.to_string()))?;

    let status = response.status().as_u16();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::ProxyTransport(e.to_string()))?;

    // Summarized outbound log: just the reply message, not the full payload
    let message = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .and_then(|v| {
            v.pointer("/data/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
    info!(
        "Dialogue {} upstream status {}, message: {:?}",
        operation, status, message
    );

    Ok((
        StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
        [(header::CONTENT_TYPE, "application/json")],
        bytes,
    )
        .into_response())
}
