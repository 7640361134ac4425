use std::env;

use super::ServerConfig;

/// Strip trailing slashes so that joining with request paths never doubles them.
fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if required environment variables are malformed
    /// (currently only a non-numeric PORT).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        // Server configuration
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid port number: {e}"))?;

        // Transcription provider
        let openai_api_key = env::var("OPENAI_API_KEY").ok();
        let stt_base_url = normalize_base_url(
            env::var("STT_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        );

        // Dialogue backend
        let dialogue_base_url = normalize_base_url(
            env::var("DIALOGUE_BASE_URL")
                .unwrap_or_else(|_| "https://voiss-fq.zeabur.app/api".to_string()),
        );

        // Avatar streaming backend
        let avatar_base_url = normalize_base_url(
            env::var("AVATAR_BASE_URL").unwrap_or_else(|_| "https://api.heygen.com".to_string()),
        );
        let avatar_api_key = env::var("AVATAR_API_KEY").ok();

        Ok(ServerConfig {
            host,
            port,
            openai_api_key,
            stt_base_url,
            dialogue_base_url,
            avatar_base_url,
            avatar_api_key,
        })
    }
}
