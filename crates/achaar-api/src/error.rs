//! API error type and the `{error, success: false}` response contract.
//!
//! Every failure path of every endpoint resolves to one of these variants;
//! provider and extraction failures are mapped here so no error escapes as
//! an unstructured response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use achaar_core::ErrorReply;
use achaar_extract::ExtractError;
use achaar_provider::ProviderFailure;

pub const MSG_QUOTA: &str = "API quota exceeded. Please try again later.";
pub const MSG_AUTH: &str = "Invalid API key or authentication failed";
pub const MSG_TIMEOUT: &str = "Request timed out. Please try again.";
pub const MSG_RATE_LIMIT: &str = "Rate limit exceeded. Please wait before trying again.";
pub const MSG_BLOCKED: &str = "Message was blocked by content filter. Please rephrase.";
pub const MSG_GENERIC: &str = "Failed to process chat request. Please try again.";

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 Bad Request - malformed input or content blocked.
    BadRequest(String),
    /// 401 Unauthorized - provider rejected the credential.
    Unauthorized(String),
    /// 413 Payload Too Large - request body over the configured limit.
    PayloadTooLarge(String),
    /// 429 Too Many Requests - quota or rate limit.
    TooManyRequests(String),
    /// 500 Internal Server Error - anything unclassified.
    Internal(String),
    /// 503 Service Unavailable - no provider credential configured.
    ServiceUnavailable(String),
    /// 504 Gateway Timeout - provider call exceeded the server bound.
    GatewayTimeout(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Internal(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::GatewayTimeout(msg) => msg,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorReply::new(self.message());
        (status, Json(body)).into_response()
    }
}

impl From<ProviderFailure> for ApiError {
    fn from(failure: ProviderFailure) -> Self {
        match failure {
            ProviderFailure::Quota(_) => ApiError::TooManyRequests(MSG_QUOTA.to_string()),
            ProviderFailure::Auth(_) => ApiError::Unauthorized(MSG_AUTH.to_string()),
            ProviderFailure::Timeout(_) => ApiError::GatewayTimeout(MSG_TIMEOUT.to_string()),
            ProviderFailure::RateLimit(_) => {
                ApiError::TooManyRequests(MSG_RATE_LIMIT.to_string())
            }
            ProviderFailure::ContentBlocked(_) => ApiError::BadRequest(MSG_BLOCKED.to_string()),
            ProviderFailure::InvalidResponse | ProviderFailure::Other(_) => {
                ApiError::Internal(MSG_GENERIC.to_string())
            }
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
