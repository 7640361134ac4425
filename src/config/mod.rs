//! Configuration module for the parrot relay server
//!
//! All configuration comes from environment variables (with `.env` support
//! via dotenvy). Every setting has a default except the provider API keys,
//! which stay optional so that the server can boot without them and report
//! a missing-configuration fault on the endpoints that need them.

mod env;

/// Server configuration
///
/// Contains everything needed to run the relay server:
/// - Server settings (host, port)
/// - Transcription provider settings (API key, base URL)
/// - Dialogue backend base URL
/// - Avatar streaming backend settings (API key, base URL)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Transcription provider (OpenAI-compatible)
    pub openai_api_key: Option<String>,
    pub stt_base_url: String,

    // Dialogue backend
    pub dialogue_base_url: String,

    // Avatar streaming backend
    pub avatar_base_url: String,
    pub avatar_api_key: Option<String>,
}

impl ServerConfig {
    /// Get the server address as a string in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the API key for a specific upstream provider
    ///
    /// # Arguments
    /// * `provider` - The name of the provider ("openai" or "avatar")
    ///
    /// # Returns
    /// * `Result<String, String>` - The API key on success, or an error message on failure
    pub fn get_api_key(&self, provider: &str) -> Result<String, String> {
        match provider.to_lowercase().as_str() {
            "openai" => self
                .openai_api_key
                .as_ref()
                .cloned()
                .ok_or_else(|| "OpenAI API key not configured in server environment".to_string()),
            "avatar" => self
                .avatar_api_key
                .as_ref()
                .cloned()
                .ok_or_else(|| "Avatar API key not configured in server environment".to_string()),
            _ => Err(format!("Unsupported provider: {provider}")),
        }
    }
}
