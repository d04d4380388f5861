//! Failure kinds of a single request to the proxy.

use std::time::Duration;

/// Why one attempt to reach the proxy failed.
///
/// The `Display` text is what the session shows to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SendError {
    /// The attempt was aborted by the client-side timeout.
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The request never completed at the transport level.
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// A 2xx answer without the expected body.
    #[error("Invalid response from server")]
    InvalidResponse,
    /// A local file could not be read for upload.
    #[error("Could not read file: {0}")]
    File(String),
}

impl SendError {
    /// Timeouts and transport failures may succeed on a later attempt.
    /// Anything the server actually answered is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SendError::Timeout(_) | SendError::Network(_))
    }
}
