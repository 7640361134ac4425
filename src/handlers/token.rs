use axum::extract::State;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Handler for the /access-token endpoint
///
/// Mints a streaming session token from the avatar backend and returns it as
/// plain text, the way the client-side session bootstrap consumes it.
pub async fn access_token_handler(State(state): State<Arc<AppState>>) -> AppResult<String> {
    let api_key = state
        .config
        .get_api_key("avatar")
        .map_err(AppError::MissingConfiguration)?;

    let url = format!("{}/v1/streaming.create_token", state.config.avatar_base_url);
    let response = state
        .http
        .post(&url)
        .header("x-api-key", api_key)
        .send()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Access token request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Invalid token response: {e}")))?;
    let token = body
        .pointer("/data/token")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::InternalServerError("Avatar backend returned no token".to_string())
        })?;

    info!("Access token minted ({} chars)", token.len());

    Ok(token.to_string())
}
