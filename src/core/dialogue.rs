//! Dialogue backend client
//!
//! Talks to the relay's dialogue proxy. Initialization is guarded by an
//! explicit tri-state lifecycle so that it runs at most once per page
//! session: a successful initialize is permanent, a failed one returns to
//! `Uninitialized` so the next turn can retry.

use parking_lot::RwLock;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::params::ResolvedParams;

/// Error types for dialogue operations
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("Dialogue request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Dialogue call failed: {status} {body}")]
    Failed { status: u16, body: String },
}

/// Initialization lifecycle of the remote dialogue session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueLifecycle {
    Uninitialized,
    Initializing,
    Initialized,
}

/// Client for the dialogue proxy endpoints.
pub struct DialogueClient {
    http: reqwest::Client,
    base_url: String,
    activity_id: String,
    session_id: String,
    user_id: String,
    user_name: String,
    lifecycle: RwLock<DialogueLifecycle>,
    // Serializes concurrent initialize attempts
    init_guard: Mutex<()>,
}

impl DialogueClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, params: &ResolvedParams) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            activity_id: params.activity_id.clone(),
            session_id: params.session_id.clone(),
            user_id: params.user_id.clone(),
            user_name: params.user_name.clone(),
            lifecycle: RwLock::new(DialogueLifecycle::Uninitialized),
            init_guard: Mutex::new(()),
        }
    }

    pub fn lifecycle(&self) -> DialogueLifecycle {
        *self.lifecycle.read()
    }

    /// Initialize the remote dialogue session.
    ///
    /// Idempotent after the first success: later calls resolve immediately
    /// with no value and issue no network call. Returns the opening message
    /// extracted from the backend's response, if any.
    pub async fn initialize(&self) -> Result<Option<String>, DialogueError> {
        let _guard = self.init_guard.lock().await;
        if self.lifecycle() == DialogueLifecycle::Initialized {
            return Ok(None);
        }

        *self.lifecycle.write() = DialogueLifecycle::Initializing;
        let result = self.request_initialize().await;
        *self.lifecycle.write() = if result.is_ok() {
            DialogueLifecycle::Initialized
        } else {
            DialogueLifecycle::Uninitialized
        };
        result
    }

    async fn request_initialize(&self) -> Result<Option<String>, DialogueError> {
        let response = self
            .http
            .post(format!("{}/dialogue/initialize", self.base_url))
            .json(&json!({
                "activity_id": self.activity_id,
                "session_id": self.session_id,
                "user_id": self.user_id,
                "user_name": self.user_name,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DialogueError::Failed { status, body });
        }

        // An unparseable body still counts as a successful initialize;
        // there is simply no opening message to repeat.
        let message = response
            .json::<Value>()
            .await
            .ok()
            .as_ref()
            .and_then(extract_opening_message);
        debug!("Dialogue session initialized, opening message: {message:?}");
        Ok(message)
    }

    /// Send one user message and return the backend's reply text, if any.
    pub async fn chat(&self, message: &str) -> Result<Option<String>, DialogueError> {
        let response = self
            .http
            .post(format!("{}/dialogue/chat", self.base_url))
            .json(&json!({
                "activity_id": self.activity_id,
                "session_id": self.session_id,
                "user_id": self.user_id,
                "message": message,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DialogueError::Failed { status, body });
        }

        Ok(response.json::<Value>().await.ok().as_ref().and_then(extract_reply))
    }
}

/// Extract the opening message from an initialize response.
///
/// Walks `data.unit_results[last].conversation_logs[last].content`, falling
/// back to `data.message`. Total: any unexpected shape yields `None`.
pub fn extract_opening_message(value: &Value) -> Option<String> {
    let data = value.get("data")?;

    let nested = data
        .get("unit_results")
        .and_then(Value::as_array)
        .and_then(|units| units.last())
        .and_then(|unit| unit.get("conversation_logs"))
        .and_then(Value::as_array)
        .and_then(|logs| logs.last())
        .and_then(|log| log.get("content"))
        .and_then(Value::as_str);

    match nested {
        Some(content) => Some(content.to_string()),
        None => data.get("message").and_then(Value::as_str).map(str::to_string),
    }
}

/// Extract the reply text from a chat response (`data.message`).
pub fn extract_reply(value: &Value) -> Option<String> {
    value
        .pointer("/data/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
