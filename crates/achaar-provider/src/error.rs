//! Discriminated provider failures.
//!
//! The adapter assigns a kind from structured provider data (HTTP status and
//! the provider's own status string). Free-text classification is only a
//! fallback for failures that carry nothing but a message, and it is known to
//! be brittle against provider wording changes.

use thiserror::Error;

/// Kind tag of a [`ProviderFailure`], for logging and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Quota,
    Auth,
    Timeout,
    RateLimit,
    ContentBlocked,
    InvalidResponse,
    Other,
}

/// Failure of a single provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),
    #[error("content blocked: {0}")]
    ContentBlocked(String),
    #[error("invalid response from AI model")]
    InvalidResponse,
    #[error("provider error: {0}")]
    Other(String),
}

impl ProviderFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderFailure::Quota(_) => FailureKind::Quota,
            ProviderFailure::Auth(_) => FailureKind::Auth,
            ProviderFailure::Timeout(_) => FailureKind::Timeout,
            ProviderFailure::RateLimit(_) => FailureKind::RateLimit,
            ProviderFailure::ContentBlocked(_) => FailureKind::ContentBlocked,
            ProviderFailure::InvalidResponse => FailureKind::InvalidResponse,
            ProviderFailure::Other(_) => FailureKind::Other,
        }
    }

    /// Classify an opaque failure description.
    ///
    /// First match wins: quota, authentication, timeout, rate limit,
    /// safety block, then anything else.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let has = |needle: &str| lower.contains(needle);

        if has("quota") {
            ProviderFailure::Quota(message)
        } else if has("api key") || has("authentication") || has("permission_denied") {
            ProviderFailure::Auth(message)
        } else if has("timeout") || has("timed out") {
            ProviderFailure::Timeout(message)
        } else if has("rate limit") {
            ProviderFailure::RateLimit(message)
        } else if has("safety") || has("blocked") {
            ProviderFailure::ContentBlocked(message)
        } else {
            ProviderFailure::Other(message)
        }
    }

    /// Build a failure from a non-success HTTP answer.
    ///
    /// `provider_status` is the provider's symbolic status (for Gemini, the
    /// `error.status` field such as `RESOURCE_EXHAUSTED`).
    pub fn from_status(status: u16, provider_status: Option<&str>, message: String) -> Self {
        match (status, provider_status) {
            (429, _) | (_, Some("RESOURCE_EXHAUSTED")) => {
                if message.to_lowercase().contains("quota") {
                    ProviderFailure::Quota(message)
                } else {
                    ProviderFailure::RateLimit(message)
                }
            }
            (401 | 403, _) | (_, Some("UNAUTHENTICATED" | "PERMISSION_DENIED")) => {
                ProviderFailure::Auth(message)
            }
            (408 | 504, _) | (_, Some("DEADLINE_EXCEEDED")) => ProviderFailure::Timeout(message),
            _ => ProviderFailure::classify(message),
        }
    }
}
