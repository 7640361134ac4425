//! Session orchestration
//!
//! Sequences avatar-session startup, the dialogue-backend handshake, and the
//! turn-taking pipeline. The orchestrator owns the resolved parameters and
//! session configuration, subscribes to the avatar's event stream once per
//! session, and feeds every recognized user turn through
//! dialogue chat -> avatar repeat.
//!
//! Failure policy: every boundary call is wrapped so that a failure is
//! logged and the pipeline stays alive; there is no automatic retry. The
//! user re-triggers the action (press Start again, speak again).

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::avatar::{
    AvatarConnector, AvatarError, AvatarEvent, AvatarSession, SessionState, talking_chunk,
};
use crate::core::dialogue::DialogueClient;
use crate::core::params::{ResolvedParams, SessionConfig};
use crate::core::recording::{Recorder, SubmitFn};
use crate::core::transcribe::TranscriptionClient;

/// Error types for session startup
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Access token request failed: {0}")]
    TokenTransport(#[from] reqwest::Error),
    #[error("Access token fetch failed: {status} {body}")]
    TokenFetch { status: u16, body: String },
    #[error(transparent)]
    Avatar(#[from] AvatarError),
}

/// Drives one avatar session per page load.
pub struct Orchestrator {
    http: reqwest::Client,
    base_url: String,
    params: ResolvedParams,
    config: RwLock<SessionConfig>,
    dialogue: Arc<DialogueClient>,
    connector: Arc<dyn AvatarConnector>,
    session: Mutex<Option<Arc<dyn AvatarSession>>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        base_url: impl Into<String>,
        params: ResolvedParams,
        connector: Arc<dyn AvatarConnector>,
    ) -> Self {
        let http = reqwest::Client::new();
        let base_url = base_url.into();
        let config = RwLock::new(params.session_config());
        let dialogue = Arc::new(DialogueClient::new(http.clone(), base_url.clone(), &params));

        Self {
            http,
            base_url,
            params,
            config,
            dialogue,
            connector,
            session: Mutex::new(None),
            event_task: Mutex::new(None),
        }
    }

    pub fn params(&self) -> &ResolvedParams {
        &self.params
    }

    pub fn config(&self) -> SessionConfig {
        self.config.read().clone()
    }

    /// Replace the session configuration. Only allowed while no session is
    /// active; once started, the configuration is frozen.
    pub fn set_config(&self, config: SessionConfig) {
        if self.session_state() != SessionState::Inactive {
            warn!("Ignoring configuration change while a session is active");
            return;
        }
        *self.config.write() = config;
    }

    pub fn session_state(&self) -> SessionState {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(SessionState::Inactive)
    }

    pub fn dialogue(&self) -> &DialogueClient {
        &self.dialogue
    }

    /// Start an avatar session, optionally in voice-chat mode.
    ///
    /// Failures are logged and swallowed; the session stays in its prior
    /// state. No rollback of partial setup is performed.
    pub async fn start_session(&self, voice_chat: bool) {
        if let Err(e) = self.try_start_session(voice_chat).await {
            error!("Error starting avatar session: {e}");
        }
    }

    async fn try_start_session(&self, voice_chat: bool) -> Result<(), OrchestratorError> {
        let token = self.fetch_access_token().await?;
        let session = self.connector.connect(&token)?;

        let events = session.subscribe();
        self.spawn_event_loop(session.clone(), events);
        *self.session.lock() = Some(session.clone());

        let config = self.config();
        session.start(&config).await?;

        if voice_chat {
            session.start_voice_chat().await?;
        }

        Ok(())
    }

    /// Start a non-voice-chat session when the auto-start parameter is set
    /// and nothing is running yet.
    pub async fn maybe_autostart(&self) {
        if self.params.autostart && self.session_state() == SessionState::Inactive {
            self.start_session(false).await;
        }
    }

    async fn fetch_access_token(&self) -> Result<String, OrchestratorError> {
        let response = self
            .http
            .post(format!("{}/access-token", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::TokenFetch { status, body });
        }

        let token = response.text().await?;
        info!("Access token acquired ({} chars)", token.len());
        Ok(token)
    }

    fn spawn_event_loop(
        &self,
        session: Arc<dyn AvatarSession>,
        mut events: mpsc::UnboundedReceiver<AvatarEvent>,
    ) {
        let dialogue = self.dialogue.clone();

        let handle = tokio::spawn(async move {
            // Accumulates the current user utterance between talking-message
            // chunks and the end-of-utterance signal.
            let mut utterance = String::new();

            while let Some(event) = events.recv().await {
                match event {
                    AvatarEvent::StreamReady => {
                        debug!("Stream ready");
                        match dialogue.initialize().await {
                            Ok(Some(message)) if !message.trim().is_empty() => {
                                if let Err(e) = session.repeat(&message).await {
                                    error!("Opening message repeat failed: {e}");
                                }
                            }
                            Ok(_) => {}
                            Err(e) => error!("Dialogue init error: {e}"),
                        }
                    }
                    AvatarEvent::UserStart => debug!("User started talking"),
                    AvatarEvent::UserStop => debug!("User stopped talking"),
                    AvatarEvent::UserTalkingMessage { detail } => {
                        utterance.push_str(talking_chunk(&detail));
                    }
                    AvatarEvent::UserEndMessage => {
                        let text = utterance.trim().to_string();
                        utterance.clear();
                        if text.is_empty() {
                            continue;
                        }
                        match dialogue.initialize().await {
                            Ok(_) => deliver_turn(&dialogue, session.as_ref(), &text).await,
                            Err(e) => error!("Dialogue pipeline error: {e}"),
                        }
                    }
                    AvatarEvent::StreamDisconnected => info!("Stream disconnected"),
                }
            }

            debug!("Avatar event loop finished");
        });

        let mut slot = self.event_task.lock();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Accept externally supplied text (e.g. from the recording pipeline)
    /// and run dialogue chat -> avatar repeat. Blank input is a no-op; all
    /// failures are logged and swallowed.
    pub async fn submit_user_text(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let session = { self.session.lock().clone() };
        let Some(session) = session else {
            warn!("No active session; dropping submitted text");
            return;
        };

        deliver_turn(&self.dialogue, session.as_ref(), text).await;
    }

    /// Build the submission function handed to the recording pipeline.
    pub fn submit_fn(self: &Arc<Self>) -> SubmitFn {
        let orchestrator = Arc::clone(self);
        Arc::new(move |text: String| {
            let orchestrator = Arc::clone(&orchestrator);
            Box::pin(async move {
                orchestrator.submit_user_text(&text).await;
            }) as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        })
    }

    /// Build a recorder wired to this orchestrator's transcription endpoint,
    /// language hint, and submission pipeline.
    pub fn recorder(self: &Arc<Self>) -> Recorder {
        let language = self.config.read().language.clone();
        Recorder::new(
            TranscriptionClient::new(self.http.clone(), self.base_url.clone()),
            Some(language),
            self.submit_fn(),
        )
    }

    /// Tear the session down: unsubscribe from events and issue a
    /// fire-and-forget stop. In-flight dialogue calls are not cancelled.
    pub fn teardown(&self) {
        if let Some(task) = self.event_task.lock().take() {
            task.abort();
        }

        if let Some(session) = self.session.lock().take() {
            tokio::spawn(async move {
                if let Err(e) = session.stop().await {
                    warn!("Avatar stop failed: {e}");
                }
            });
        }
    }
}

/// One conversational turn: dialogue chat, then avatar repeat of the reply.
async fn deliver_turn(dialogue: &DialogueClient, session: &dyn AvatarSession, text: &str) {
    match dialogue.chat(text).await {
        Ok(Some(reply)) => {
            if let Err(e) = session.repeat(&reply).await {
                error!("Avatar repeat failed: {e}");
            }
        }
        Ok(None) => debug!("Dialogue returned no reply"),
        Err(e) => error!("Dialogue pipeline error: {e}"),
    }
}
