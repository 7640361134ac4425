//! URL parameter resolution and session configuration
//!
//! The avatar page is driven by query-string parameters: dialogue-backend
//! identifiers, avatar/voice overrides, and an auto-start flag. Each
//! parameter has a typed default; unrecognized or malformed values silently
//! fall back to that default so a bad link still produces a working session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_LANGUAGE: &str = "zh";
pub const DEFAULT_AVATAR_ID: &str = "June_HR_public";
pub const DEFAULT_VOICE_RATE: f32 = 1.0;
pub const DEFAULT_VOICE_ID: &str = "aa73aedf00974150944a4bb19225f66e";

pub const DEFAULT_ACTIVITY_ID: &str = "689466a637ae3065c9329e08";
pub const DEFAULT_USER_ID: &str = "demo-user";
pub const DEFAULT_USER_NAME: &str = "Demo";

/// Rendering quality tier requested from the avatar backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarQuality {
    Low,
    Medium,
    High,
}

/// Voice emotion presets supported by the avatar backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceEmotion {
    Excited,
    Serious,
    Friendly,
    Soothing,
    Broadcaster,
}

impl VoiceEmotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceEmotion::Excited => "excited",
            VoiceEmotion::Serious => "serious",
            VoiceEmotion::Friendly => "friendly",
            VoiceEmotion::Soothing => "soothing",
            VoiceEmotion::Broadcaster => "broadcaster",
        }
    }

    /// Case-insensitive name lookup, falling back to value lookup.
    pub fn from_query_value(value: &str) -> Option<Self> {
        let lower = value.to_lowercase();
        [
            VoiceEmotion::Excited,
            VoiceEmotion::Serious,
            VoiceEmotion::Friendly,
            VoiceEmotion::Soothing,
            VoiceEmotion::Broadcaster,
        ]
        .into_iter()
        .find(|e| e.as_str() == lower)
    }
}

/// Synthesis models accepted by the avatar backend's voice layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceModel {
    #[serde(rename = "eleven_flash_v2_5")]
    ElevenFlashV25,
    #[serde(rename = "eleven_turbo_v2_5")]
    ElevenTurboV25,
    #[serde(rename = "eleven_multilingual_v2")]
    ElevenMultilingualV2,
}

impl VoiceModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceModel::ElevenFlashV25 => "eleven_flash_v2_5",
            VoiceModel::ElevenTurboV25 => "eleven_turbo_v2_5",
            VoiceModel::ElevenMultilingualV2 => "eleven_multilingual_v2",
        }
    }

    /// Case-insensitive name lookup, falling back to value lookup.
    /// For these models the serialized value doubles as the name.
    pub fn from_query_value(value: &str) -> Option<Self> {
        let lower = value.to_lowercase();
        [
            VoiceModel::ElevenFlashV25,
            VoiceModel::ElevenTurboV25,
            VoiceModel::ElevenMultilingualV2,
        ]
        .into_iter()
        .find(|m| m.as_str() == lower)
    }
}

/// Speech-to-text providers the avatar backend can run for voice chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    Deepgram,
    Gladia,
}

impl SttProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SttProvider::Deepgram => "deepgram",
            SttProvider::Gladia => "gladia",
        }
    }

    /// Case-insensitive name lookup, falling back to value lookup.
    pub fn from_query_value(value: &str) -> Option<Self> {
        let lower = value.to_lowercase();
        [SttProvider::Deepgram, SttProvider::Gladia]
            .into_iter()
            .find(|p| p.as_str() == lower)
    }
}

/// Transport the avatar backend uses for voice-chat audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceChatTransport {
    Websocket,
    Livekit,
}

/// Voice parameters for the avatar session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub rate: f32,
    pub emotion: VoiceEmotion,
    pub model: VoiceModel,
    pub voice_id: String,
}

/// Configuration for starting an avatar session
///
/// Built by merging hardcoded defaults with URL-supplied overrides; mutable
/// via the configuration form before a session starts, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub quality: AvatarQuality,
    pub avatar_id: String,
    pub language: String,
    pub voice: VoiceSettings,
    pub stt_provider: SttProvider,
    pub transport: VoiceChatTransport,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quality: AvatarQuality::Low,
            avatar_id: DEFAULT_AVATAR_ID.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            voice: VoiceSettings {
                rate: DEFAULT_VOICE_RATE,
                emotion: VoiceEmotion::Soothing,
                model: VoiceModel::ElevenFlashV25,
                voice_id: DEFAULT_VOICE_ID.to_string(),
            },
            stt_provider: SttProvider::Deepgram,
            transport: VoiceChatTransport::Websocket,
        }
    }
}

/// Parameters resolved once per page load from the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub activity_id: String,
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
    pub language: String,
    pub avatar_id: String,
    pub voice_rate: f32,
    pub voice_emotion: VoiceEmotion,
    pub voice_id: String,
    pub voice_model: VoiceModel,
    pub stt_provider: SttProvider,
    pub autostart: bool,
}

impl ResolvedParams {
    /// Resolve parameters from a raw query string (without the leading '?').
    ///
    /// Empty values are treated the same as absent ones.
    pub fn from_query(query: &str) -> Self {
        let pairs: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let get = |key: &str| pairs.get(key).filter(|v| !v.is_empty());

        Self {
            activity_id: get("activity_id")
                .cloned()
                .unwrap_or_else(|| DEFAULT_ACTIVITY_ID.to_string()),
            session_id: get("session_id")
                .cloned()
                .unwrap_or_else(generated_session_id),
            user_id: get("user_id")
                .cloned()
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            user_name: get("user_name")
                .cloned()
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            language: get("language")
                .cloned()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            avatar_id: get("avatar_id")
                .cloned()
                .unwrap_or_else(|| DEFAULT_AVATAR_ID.to_string()),
            voice_rate: get("voice_rate")
                .and_then(|v| parse_finite(v))
                .unwrap_or(DEFAULT_VOICE_RATE),
            voice_emotion: get("voice_emotion")
                .and_then(|v| VoiceEmotion::from_query_value(v))
                .unwrap_or(VoiceEmotion::Soothing),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            voice_model: get("voice_model")
                .and_then(|v| VoiceModel::from_query_value(v))
                .unwrap_or(VoiceModel::ElevenFlashV25),
            stt_provider: get("stt_provider")
                .and_then(|v| SttProvider::from_query_value(v))
                .unwrap_or(SttProvider::Deepgram),
            autostart: get("autostart").map(|v| parse_truthy(v)).unwrap_or(false),
        }
    }

    /// Build the session configuration from defaults plus these overrides.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            avatar_id: self.avatar_id.clone(),
            language: self.language.clone(),
            voice: VoiceSettings {
                rate: self.voice_rate,
                emotion: self.voice_emotion,
                model: self.voice_model,
                voice_id: self.voice_id.clone(),
            },
            stt_provider: self.stt_provider,
            ..SessionConfig::default()
        }
    }
}

impl Default for ResolvedParams {
    fn default() -> Self {
        Self::from_query("")
    }
}

/// Parse a boolean query value, accepting only the truthy tokens
/// "1", "true", "yes", "on" (case insensitive). Everything else is false.
pub fn parse_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Parse a numeric query value, rejecting NaN and infinities.
fn parse_finite(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().filter(|n| n.is_finite())
}

fn generated_session_id() -> String {
    format!("session-{}", Uuid::new_v4())
}
