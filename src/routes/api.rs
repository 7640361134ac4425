use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::{dialogue, token, transcription};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transcription", post(transcription::transcribe_handler))
        .route("/dialogue/initialize", post(dialogue::initialize_handler))
        .route("/dialogue/chat", post(dialogue::chat_handler))
        .route("/access-token", post(token::access_token_handler))
        .layer(TraceLayer::new_for_http())
}
