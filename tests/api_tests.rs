use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use wiremock::matchers::{body_partial_json, header as mock_header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parrot::{ServerConfig, routes, state::AppState};

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "0.0.0.0".to_string(),
        port: 3001,
        openai_api_key: Some("test-openai-key".to_string()),
        stt_base_url: "https://api.openai.com/v1".to_string(),
        dialogue_base_url: "https://voiss-fq.zeabur.app/api".to_string(),
        avatar_base_url: "https://api.heygen.com".to_string(),
        avatar_api_key: Some("test-avatar-key".to_string()),
    }
}

fn app(config: ServerConfig) -> Router {
    let app_state = AppState::new(config);
    Router::new()
        .route("/", get(parrot::handlers::api::health_check))
        .merge(routes::api::create_api_router())
        .with_state(app_state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Build a multipart/form-data body by hand for handler tests.
fn multipart_body(boundary: &str, fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_health_check() {
    let app = app(test_config());

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "OK");
}

#[tokio::test]
async fn test_transcription_missing_api_key() {
    let config = ServerConfig {
        openai_api_key: None,
        ..test_config()
    };
    let app = app(config);

    let boundary = "test-boundary";
    let body = multipart_body(boundary, &[("audio", Some("audio.webm"), b"fake-audio")]);
    let request = Request::builder()
        .method("POST")
        .uri("/transcription")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "OpenAI API key not configured in server environment"
    );
}

#[tokio::test]
async fn test_transcription_missing_audio_field() {
    let app = app(test_config());

    let boundary = "test-boundary";
    let body = multipart_body(boundary, &[("language", None, b"zh")]);
    let request = Request::builder()
        .method("POST")
        .uri("/transcription")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing 'audio' file in form-data");
}

#[tokio::test]
async fn test_transcription_forwards_to_provider() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(mock_header("authorization", "Bearer test-openai-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hello world" })))
        .expect(1)
        .mount(&provider)
        .await;

    let config = ServerConfig {
        stt_base_url: provider.uri(),
        ..test_config()
    };
    let app = app(config);

    let boundary = "test-boundary";
    let body = multipart_body(
        boundary,
        &[
            ("audio", Some("audio.webm"), b"fake-audio"),
            ("language", None, b"zh"),
        ],
    );
    let request = Request::builder()
        .method("POST")
        .uri("/transcription")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["text"], "hello world");
}

#[tokio::test]
async fn test_transcription_upstream_error_surfaces_status_and_message() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "message": "Invalid API key" } })),
        )
        .mount(&provider)
        .await;

    let config = ServerConfig {
        stt_base_url: provider.uri(),
        ..test_config()
    };
    let app = app(config);

    let boundary = "test-boundary";
    let body = multipart_body(boundary, &[("audio", Some("audio.webm"), b"fake-audio")]);
    let request = Request::builder()
        .method("POST")
        .uri("/transcription")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid API key");
}

#[tokio::test]
async fn test_dialogue_initialize_passes_through_body_and_status() {
    let backend = MockServer::start().await;
    let upstream_body = json!({
        "data": {
            "unit_results": [ { "conversation_logs": [ { "content": "hi" } ] } ]
        }
    });
    Mock::given(method("POST"))
        .and(path("/interactions/initialize"))
        .and(body_partial_json(json!({ "activity_id": "act-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(upstream_body.clone()))
        .expect(1)
        .mount(&backend)
        .await;

    let config = ServerConfig {
        dialogue_base_url: backend.uri(),
        ..test_config()
    };
    let app = app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/dialogue/initialize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "activity_id": "act-1",
                "session_id": "sess-1",
                "user_id": "u-1",
                "user_name": "Ana",
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json, upstream_body);
}

#[tokio::test]
async fn test_dialogue_chat_passes_through_error_status() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/interactions/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "success": false })))
        .mount(&backend)
        .await;

    let config = ServerConfig {
        dialogue_base_url: backend.uri(),
        ..test_config()
    };
    let app = app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/dialogue/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "activity_id": "act-1", "message": "hi" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_dialogue_transport_fault_returns_structured_error() {
    // Nothing listens here, so the outbound call fails at the transport layer
    let config = ServerConfig {
        dialogue_base_url: "http://127.0.0.1:1".to_string(),
        ..test_config()
    };
    let app = app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/dialogue/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "message": "hi" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_dialogue_rejects_unparseable_json() {
    let app = app(test_config());

    let request = Request::builder()
        .method("POST")
        .uri("/dialogue/initialize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_access_token_missing_api_key() {
    let config = ServerConfig {
        avatar_api_key: None,
        ..test_config()
    };
    let app = app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/access-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Avatar API key not configured in server environment"
    );
}

#[tokio::test]
async fn test_access_token_returns_plain_text_token() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/streaming.create_token"))
        .and(mock_header("x-api-key", "test-avatar-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "tok-123" } })),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let config = ServerConfig {
        avatar_base_url: backend.uri(),
        ..test_config()
    };
    let app = app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/access-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"tok-123");
}

#[tokio::test]
async fn test_access_token_upstream_error_surfaces_status() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/streaming.create_token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&backend)
        .await;

    let config = ServerConfig {
        avatar_base_url: backend.uri(),
        ..test_config()
    };
    let app = app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/access-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "forbidden");
}
