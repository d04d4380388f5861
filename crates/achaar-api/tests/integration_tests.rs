//! Integration tests for the Achaar API.
//!
//! Each test builds its own router over a scripted model and a mock
//! extractor, then drives it with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use achaar_api::create_router;
use achaar_api::handlers::HealthResponse;
use achaar_api::persona::SYSTEM_PROMPT;
use achaar_api::state::AppState;
use achaar_core::config::AchaarConfig;
use achaar_extract::{ExtractError, MockExtractor};
use achaar_provider::{ChatModel, ProviderFailure, ScriptedModel};

// =============================================================================
// Helpers
// =============================================================================

const BOUNDARY: &str = "achaar-test-boundary";

fn make_state(model: Option<ScriptedModel>, extractor: MockExtractor) -> AppState {
    let model = model.map(|m| Arc::new(m) as Arc<dyn ChatModel>);
    AppState::new(AchaarConfig::default(), model, Arc::new(extractor))
}

fn make_app(model: ScriptedModel) -> axum::Router {
    create_router(make_state(Some(model), MockExtractor::default()))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post_multipart(body: Vec<u8>) -> Request<Body> {
    Request::post("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn chat_failure(failure: ProviderFailure) -> (StatusCode, Value) {
    let app = make_app(ScriptedModel::failing(failure));
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":"hi"}"#))
        .await
        .unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

// =============================================================================
// /health
// =============================================================================

#[tokio::test]
async fn test_health_reports_model_configured() {
    let app = make_app(ScriptedModel::replying("ok"));
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.model_configured);
}

#[tokio::test]
async fn test_health_without_model() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["model_configured"], false);
}

// =============================================================================
// /api/chat - happy path
// =============================================================================

#[tokio::test]
async fn test_chat_success() {
    let app = make_app(ScriptedModel::replying("Namaste, dost!"));
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":"hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Namaste, dost!");
}

#[tokio::test]
async fn test_chat_prepends_persona_and_keeps_history_order() {
    let model = ScriptedModel::replying("ok");
    let app = make_app(model.clone());
    let body = json!({
        "message": "third",
        "history": [
            { "role": "user", "parts": [{ "text": "first" }] },
            { "role": "assistant", "parts": [{ "text": "second" }] }
        ]
    });
    let resp = app
        .oneshot(post_json("/api/chat", &body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    let history = &calls[0].history;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, "model");
    assert_eq!(history[0].text(), SYSTEM_PROMPT);
    assert_eq!(history[1].text(), "first");
    assert_eq!(history[2].text(), "second");
    assert_eq!(calls[0].text, "third");
}

#[tokio::test]
async fn test_chat_persona_sent_once() {
    let model = ScriptedModel::replying("ok");
    let app = make_app(model.clone());
    app.oneshot(post_json("/api/chat", r#"{"message":"hi"}"#))
        .await
        .unwrap();
    let persona_turns = model.calls()[0]
        .history
        .iter()
        .filter(|turn| turn.text() == SYSTEM_PROMPT)
        .count();
    assert_eq!(persona_turns, 1);
}

#[tokio::test]
async fn test_chat_appends_document_context_to_message() {
    let model = ScriptedModel::replying("ok");
    let app = make_app(model.clone());
    let body = json!({
        "message": "summarize",
        "documentContext": "Attached Documents:\n[notes.pdf]\nchai recipes"
    });
    app.oneshot(post_json("/api/chat", &body.to_string()))
        .await
        .unwrap();

    let calls = model.calls();
    assert_eq!(
        calls[0].text,
        "summarize\n\nAttached Documents:\n[notes.pdf]\nchai recipes"
    );
    // Context is not a separate turn.
    assert_eq!(calls[0].history.len(), 1);
}

#[tokio::test]
async fn test_chat_uses_configured_generation_parameters() {
    let model = ScriptedModel::replying("ok");
    let app = make_app(model.clone());
    app.oneshot(post_json("/api/chat", r#"{"message":"hi"}"#))
        .await
        .unwrap();
    let setup = &model.calls()[0].setup;
    assert_eq!(setup.model, "gemini-2.0-flash-exp");
    assert_eq!(setup.generation.temperature, 0.8);
    assert_eq!(setup.generation.max_output_tokens, 2048);
}

// =============================================================================
// /api/chat - validation
// =============================================================================

#[tokio::test]
async fn test_chat_empty_message_400() {
    let app = make_app(ScriptedModel::replying("unused"));
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":""}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chat_blank_message_400() {
    let app = make_app(ScriptedModel::replying("unused"));
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":"   "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Message cannot be empty");
}

#[tokio::test]
async fn test_chat_history_not_array_400() {
    let app = make_app(ScriptedModel::replying("unused"));
    let resp = app
        .oneshot(post_json(
            "/api/chat",
            r#"{"message":"hi","history":"not-an-array"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "History must be an array");
}

#[tokio::test]
async fn test_chat_invalid_json_400() {
    let app = make_app(ScriptedModel::replying("unused"));
    let resp = app
        .oneshot(post_json("/api/chat", "{message:"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Invalid JSON in request body");
}

#[tokio::test]
async fn test_chat_missing_message_400() {
    let app = make_app(ScriptedModel::replying("unused"));
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"history":[]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_validation_does_not_call_model() {
    let model = ScriptedModel::replying("unused");
    let app = make_app(model.clone());
    app.oneshot(post_json("/api/chat", r#"{"message":""}"#))
        .await
        .unwrap();
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn test_chat_without_credential_503() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("GEMINI_API_KEY"));
}

#[tokio::test]
async fn test_chat_without_credential_checked_before_body() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let resp = app.oneshot(post_json("/api/chat", "garbage")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// /api/chat - provider failure classification
// =============================================================================

#[tokio::test]
async fn test_chat_quota_429() {
    let (status, body) = chat_failure(ProviderFailure::Quota("QUOTA_EXCEEDED".into())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "API quota exceeded. Please try again later.");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_chat_auth_401() {
    let (status, body) = chat_failure(ProviderFailure::Auth("PERMISSION_DENIED".into())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid API key or authentication failed");
}

#[tokio::test]
async fn test_chat_provider_timeout_504() {
    let (status, _) = chat_failure(ProviderFailure::Timeout("deadline".into())).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_chat_rate_limit_429() {
    let (status, body) = chat_failure(ProviderFailure::RateLimit("slow".into())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["error"],
        "Rate limit exceeded. Please wait before trying again."
    );
}

#[tokio::test]
async fn test_chat_content_blocked_400() {
    let (status, body) = chat_failure(ProviderFailure::ContentBlocked("SAFETY".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Message was blocked by content filter. Please rephrase."
    );
}

#[tokio::test]
async fn test_chat_invalid_response_500() {
    let (status, body) = chat_failure(ProviderFailure::InvalidResponse).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Failed to process chat request. Please try again."
    );
}

#[tokio::test]
async fn test_chat_unknown_failure_500() {
    let (status, _) = chat_failure(ProviderFailure::Other("mystery".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_chat_body_over_limit_keeps_error_contract() {
    let model = ScriptedModel::replying("unused");
    let app = make_app(model.clone());
    let limit = AchaarConfig::default().upload.body_limit_bytes;
    let body = json!({
        "message": "hi",
        "documentContext": "x".repeat(limit + 1024 * 1024)
    });
    let resp = app
        .oneshot(post_json("/api/chat", &body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("32MB"));
    assert!(model.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_chat_server_timeout_504() {
    let model = ScriptedModel::replying("too late").with_delay(Duration::from_secs(60));
    let app = make_app(model);
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        body_json(resp).await["error"],
        "Request timed out. Please try again."
    );
}

#[tokio::test(start_paused = true)]
async fn test_chat_slow_but_within_timeout() {
    let model = ScriptedModel::replying("made it").with_delay(Duration::from_secs(20));
    let app = make_app(model);
    let resp = app
        .oneshot(post_json("/api/chat", r#"{"message":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// /api/upload
// =============================================================================

#[tokio::test]
async fn test_upload_success() {
    let state = make_state(None, MockExtractor::with_pages("page text", 3));
    let app = create_router(state);
    let resp = app
        .oneshot(post_multipart(multipart_body(
            "file",
            "notes.pdf",
            "application/pdf",
            b"%PDF-1.4 fake",
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["document"]["name"], "notes.pdf");
    assert_eq!(body["document"]["size"], 13);
    assert_eq!(body["document"]["type"], "PDF");
    assert_eq!(body["document"]["content"], "page text");
    assert_eq!(body["document"]["pages"], 3);
}

#[tokio::test]
async fn test_upload_non_pdf_400() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let resp = app
        .oneshot(post_multipart(multipart_body(
            "file",
            "notes.txt",
            "text/plain",
            b"hello",
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Only PDF files are supported");
}

#[tokio::test]
async fn test_upload_too_large_400() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let data = vec![b'x'; 15 * 1024 * 1024];
    let resp = app
        .oneshot(post_multipart(multipart_body(
            "file",
            "big.pdf",
            "application/pdf",
            &data,
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "File size exceeds 10MB limit");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upload_over_body_limit_reports_file_size() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let limit = AchaarConfig::default().upload.body_limit_bytes;
    let data = vec![b'x'; limit + 1024 * 1024];
    let resp = app
        .oneshot(post_multipart(multipart_body(
            "file",
            "huge.pdf",
            "application/pdf",
            &data,
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "File size exceeds 10MB limit");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upload_exactly_at_limit_accepted() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let data = vec![b'x'; 10 * 1024 * 1024];
    let resp = app
        .oneshot(post_multipart(multipart_body(
            "file",
            "edge.pdf",
            "application/pdf",
            &data,
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_no_file_400() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let resp = app
        .oneshot(post_multipart(multipart_body(
            "attachment",
            "notes.pdf",
            "application/pdf",
            b"%PDF",
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No file provided");
}

#[tokio::test]
async fn test_upload_extraction_failure_500() {
    let extractor = MockExtractor::failing(ExtractError::Parse("broken xref table".into()));
    let app = create_router(make_state(None, extractor));
    let resp = app
        .oneshot(post_multipart(multipart_body(
            "file",
            "broken.pdf",
            "application/pdf",
            b"%PDF-broken",
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("broken xref table"));
}

#[tokio::test]
async fn test_upload_not_multipart_400() {
    let app = create_router(make_state(None, MockExtractor::default()));
    let resp = app
        .oneshot(post_json("/api/upload", r#"{"file":"nope"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["success"], false);
}
