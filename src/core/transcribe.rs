//! Client for the relay's transcription endpoint.

use bytes::Bytes;
use serde::Deserialize;

/// Error types for transcription calls
#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("Transcription request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Transcription call failed: {status} {body}")]
    Failed { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Uploads recorded audio to `POST /transcription` and returns the
/// recognized text.
#[derive(Clone)]
pub struct TranscriptionClient {
    http: reqwest::Client,
    base_url: String,
}

impl TranscriptionClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Transcribe one audio buffer. Returns `None` when the provider
    /// recognized nothing.
    pub async fn transcribe(
        &self,
        audio: Bytes,
        language: Option<&str>,
    ) -> Result<Option<String>, TranscribeError> {
        let mut form = reqwest::multipart::Form::new().part(
            "audio",
            reqwest::multipart::Part::bytes(audio.to_vec()).file_name("audio.webm"),
        );
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }

        let response = self
            .http
            .post(format!("{}/transcription", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Failed { status, body });
        }

        let parsed: TranscriptionResponse = response.json().await?;
        Ok((!parsed.text.is_empty()).then_some(parsed.text))
    }
}
