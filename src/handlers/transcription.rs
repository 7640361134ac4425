use axum::{
    extract::{Multipart, State},
    response::Json,
};
use bytes::Bytes;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Transcription model used when the form does not override it
const DEFAULT_TRANSCRIBE_MODEL: &str = "gpt-4o-mini-transcribe";

/// Handler for the /transcription endpoint
///
/// Accepts a multipart form with an `audio` file and optional `language` and
/// `model` fields, forwards it to the configured OpenAI-compatible
/// transcription endpoint, and returns `{ "text": ... }`.
pub async fn transcribe_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let api_key = state
        .config
        .get_api_key("openai")
        .map_err(AppError::MissingConfiguration)?;

    let mut audio: Option<(Bytes, String)> = None;
    let mut language: Option<String> = None;
    let mut model: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let file_name = field.file_name().unwrap_or("audio.webm").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read audio field: {e}")))?;
                audio = Some((data, file_name));
            }
            Some("language") => {
                language = field.text().await.ok().filter(|v| !v.is_empty());
            }
            Some("model") => {
                model = field.text().await.ok().filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    let Some((data, file_name)) = audio else {
        return Err(AppError::BadRequest(
            "Missing 'audio' file in form-data".to_string(),
        ));
    };

    info!(
        "Transcription request received - {} bytes, language: {:?}",
        data.len(),
        language
    );

    let mut form = reqwest::multipart::Form::new()
        .part(
            "file",
            reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name),
        )
        .text(
            "model",
            model.unwrap_or_else(|| DEFAULT_TRANSCRIBE_MODEL.to_string()),
        );
    if let Some(language) = language {
        form = form.text("language", language);
    }

    let url = format!("{}/audio/transcriptions", state.config.stt_base_url);
    let response = state
        .http
        .post(&url)
        .bearer_auth(&api_key)
        .multipart(form)
        .send()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Transcription request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let message = provider_error_message(response).await;
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    let body: Value = response.json().await.map_err(|e| {
        AppError::InternalServerError(format!("Invalid transcription response: {e}"))
    })?;
    let text = body.get("text").and_then(Value::as_str).unwrap_or_default();

    Ok(Json(json!({ "text": text })))
}

/// Pull the provider's error message out of a failed response, falling back
/// to the raw body when the shape is not the expected `{error: {message}}`.
async fn provider_error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body)
}
