//! Route handler functions for all API endpoints.

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::BytesRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use achaar_core::{ChatReply, HistoryTurn, UploadReply, UploadedDocument};
use achaar_provider::ProviderFailure;

use crate::error::ApiError;
use crate::persona::persona_turn;
use crate::state::AppState;

/// Only PDF uploads are accepted.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

// =============================================================================
// Request validation
// =============================================================================

/// A chat request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPayload {
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub document_context: Option<String>,
}

/// Validate a raw `/api/chat` body.
///
/// Checks run in order: parseable JSON, `message` present and textual,
/// `message` non-blank, `history` an array when present. A non-text or
/// empty `documentContext` is ignored.
pub fn parse_chat_payload(body: &[u8]) -> Result<ChatPayload, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::bad_request("Invalid JSON in request body"))?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("Message is required and must be a string"))?;

    if message.trim().is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }

    let history = match value.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            serde_json::from_value::<Vec<HistoryTurn>>(Value::Array(items.clone())).map_err(
                |_| ApiError::bad_request("History entries must have a role and text parts"),
            )?
        }
        Some(_) => return Err(ApiError::bad_request("History must be an array")),
    };

    let document_context = value
        .get("documentContext")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(ChatPayload {
        message: message.to_string(),
        history,
        document_context,
    })
}

/// Append document context as a trailing section of the user message.
pub fn compose_message(message: &str, document_context: Option<&str>) -> String {
    match document_context {
        Some(context) => format!("{}\n\n{}", message, context),
        None => message.to_string(),
    }
}

const MIB: u64 = 1024 * 1024;

fn file_too_large(max_file_bytes: u64) -> ApiError {
    ApiError::bad_request(format!("File size exceeds {}MB limit", max_file_bytes / MIB))
}

/// Map a failure to buffer the chat body. Oversize bodies keep their 413.
fn chat_body_error(rejection: BytesRejection, body_limit: usize) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!(
            "Request body exceeds {}MB limit. Try attaching fewer documents.",
            body_limit as u64 / MIB
        ))
    } else {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Map a multipart read failure. A body cut off by the length limit is an
/// oversize file.
fn upload_body_error(err: MultipartError, max_file_bytes: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        file_too_large(max_file_bytes)
    } else {
        ApiError::bad_request(err.body_text())
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub model_configured: bool,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /api/chat - forward one message plus history to the model.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Some(model) = state.model.as_ref() else {
        tracing::error!(
            env = %state.config.provider.api_key_env,
            "Chat request rejected: provider credential not configured"
        );
        return Err(ApiError::ServiceUnavailable(format!(
            "API key not configured. Please set {} in your environment variables.",
            state.config.provider.api_key_env
        )));
    };

    let body = body.map_err(|e| {
        tracing::warn!(error = %e, "Chat body rejected");
        chat_body_error(e, state.config.upload.body_limit_bytes)
    })?;
    let payload = parse_chat_payload(&body)?;

    let mut history = Vec::with_capacity(payload.history.len() + 1);
    history.push(persona_turn());
    history.extend(payload.history);

    let text = compose_message(&payload.message, payload.document_context.as_deref());
    let mut session = model.create_chat(state.chat_setup(), history);

    let timeout = state.config.provider.timeout();
    let outcome = match tokio::time::timeout(timeout, session.send(&text)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderFailure::Timeout(format!(
            "Request timeout after {}s",
            timeout.as_secs()
        ))),
    };

    match outcome {
        Ok(reply) => {
            tracing::info!(reply_len = reply.len(), "Chat reply delivered");
            Ok(Json(ChatReply::new(reply)))
        }
        Err(failure) => {
            tracing::warn!(kind = ?failure.kind(), error = %failure, "Chat request failed");
            Err(ApiError::from(failure))
        }
    }
}

/// POST /api/upload - extract text from an uploaded PDF.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadReply>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let max = state.config.upload.max_file_bytes;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_body_error(e, max))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("document.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_body_error(e, max))?;
        file = Some((name, content_type, bytes));
        break;
    }

    let Some((name, content_type, bytes)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };

    if content_type.as_deref() != Some(PDF_CONTENT_TYPE) {
        return Err(ApiError::bad_request("Only PDF files are supported"));
    }

    let size = bytes.len() as u64;
    if size > max {
        tracing::warn!(size, max, file = %name, "Upload rejected: file too large");
        return Err(file_too_large(max));
    }

    let extracted = state.extractor.extract(&bytes).await.map_err(|e| {
        tracing::error!(file = %name, error = %e, "Document extraction failed");
        ApiError::from(e)
    })?;

    tracing::info!(file = %name, size, pages = extracted.page_count, "Document extracted");

    Ok(Json(UploadReply {
        success: true,
        document: UploadedDocument {
            name,
            size,
            doc_type: "PDF".to_string(),
            content: extracted.text,
            pages: extracted.page_count,
        },
    }))
}

/// GET /health - liveness and provider configuration status.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model_configured: state.model.is_some(),
    })
}
