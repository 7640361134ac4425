//! Avatar session abstraction
//!
//! The streaming-avatar SDK is an external collaborator; the orchestrator
//! only sees it through these traits. A session emits [`AvatarEvent`]s over
//! an mpsc channel, accepts a configuration to start, and exposes the
//! "repeat this text" capability the turn pipeline drives.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::params::SessionConfig;

/// Lifecycle state of an avatar session.
///
/// Owned by the session wrapper; the orchestrator never forces a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    Connecting,
    Connected,
}

/// Signals emitted by the avatar backend during a session.
#[derive(Debug, Clone, PartialEq)]
pub enum AvatarEvent {
    /// Media stream is up; the session can speak and listen.
    StreamReady,
    /// Media stream dropped.
    StreamDisconnected,
    /// The user started talking (voice-chat mode).
    UserStart,
    /// The user stopped talking.
    UserStop,
    /// A recognized chunk of the user's current utterance.
    UserTalkingMessage { detail: Value },
    /// The user's utterance is complete.
    UserEndMessage,
}

/// Extract the text chunk from a talking-message payload.
///
/// Malformed payloads count as an empty chunk rather than an error.
pub fn talking_chunk(detail: &Value) -> &str {
    detail
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Error types for avatar session operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum AvatarError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Session not active: {0}")]
    NotActive(String),
    #[error("Start failed: {0}")]
    StartFailed(String),
    #[error("Repeat failed: {0}")]
    RepeatFailed(String),
}

/// A live connection to the streaming-avatar backend.
#[async_trait]
pub trait AvatarSession: Send + Sync {
    /// Start the session with the given configuration.
    async fn start(&self, config: &SessionConfig) -> Result<(), AvatarError>;

    /// Tear the session down.
    async fn stop(&self) -> Result<(), AvatarError>;

    /// Enable voice-chat mode (SDK-side microphone capture and STT).
    async fn start_voice_chat(&self) -> Result<(), AvatarError>;

    /// Make the avatar speak the given text aloud.
    async fn repeat(&self, text: &str) -> Result<(), AvatarError>;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Take the session's event stream. One subscriber per session; the
    /// orchestrator subscribes on startup and drops the receiver on teardown.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<AvatarEvent>;
}

/// Factory for avatar sessions, keyed by an access token.
pub trait AvatarConnector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn AvatarSession>, AvatarError>;
}
