//! Manual recording pipeline: capture -> transcribe -> submit
//!
//! The capture device is an external collaborator behind a trait. Stopping a
//! recording combines the captured fragments into one audio buffer, sends it
//! to the transcription endpoint with the configured language hint, and
//! pushes the recognized text through the injected submission function. The
//! capture handle is released whether or not transcription succeeds.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::error;

use crate::core::transcribe::TranscriptionClient;

/// Error types for audio capture
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture device error: {0}")]
    Device(String),
}

/// Callback type for submitting recognized text into the turn pipeline
pub type SubmitFn = Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// An audio capture source (microphone or equivalent).
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire the device and begin capturing.
    async fn open(&self) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}

/// A live capture in progress.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Stop capturing and hand back the recorded fragments, in order.
    async fn finish(&mut self) -> Result<Vec<Bytes>, CaptureError>;

    /// Release the underlying device. Must be safe to call after `finish`.
    async fn close(&mut self);
}

enum RecorderState {
    Idle,
    Recording { handle: Box<dyn CaptureHandle> },
}

/// Single-capture recorder feeding the transcription -> submit pipeline.
pub struct Recorder {
    transcription: TranscriptionClient,
    language: Option<String>,
    submit: SubmitFn,
    state: RecorderState,
}

impl Recorder {
    pub fn new(
        transcription: TranscriptionClient,
        language: Option<String>,
        submit: SubmitFn,
    ) -> Self {
        Self {
            transcription,
            language,
            submit,
            state: RecorderState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Begin a capture session. No-op if already recording.
    pub async fn start(&mut self, device: &dyn CaptureDevice) -> Result<(), CaptureError> {
        if self.is_recording() {
            return Ok(());
        }
        let handle = device.open().await?;
        self.state = RecorderState::Recording { handle };
        Ok(())
    }

    /// Stop the capture session, transcribe what was recorded, and submit the
    /// resulting text. No-op if not recording. All failures are logged and
    /// swallowed; the capture handle is released in every case.
    pub async fn stop_and_submit(&mut self) {
        let RecorderState::Recording { mut handle } =
            std::mem::replace(&mut self.state, RecorderState::Idle)
        else {
            return;
        };

        match handle.finish().await {
            Ok(fragments) => {
                let audio = combine_fragments(fragments);
                match self
                    .transcription
                    .transcribe(audio, self.language.as_deref())
                    .await
                {
                    Ok(Some(text)) => (self.submit)(text).await,
                    Ok(None) => {}
                    Err(e) => error!("Recording submit error: {e}"),
                }
            }
            Err(e) => error!("Capture flush error: {e}"),
        }

        handle.close().await;
    }
}

/// Combine captured fragments into a single audio buffer, dropping empty ones.
fn combine_fragments(fragments: Vec<Bytes>) -> Bytes {
    let mut combined = BytesMut::new();
    for fragment in fragments {
        if !fragment.is_empty() {
            combined.extend_from_slice(&fragment);
        }
    }
    combined.freeze()
}
