//! HTTP access to the proxy endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use achaar_core::{ChatRequest, NewDocument, UploadReply};

use crate::error::SendError;

/// How the session store reaches the proxy.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one chat request, aborting after `timeout`. Returns the reply text.
    async fn send_chat(&self, request: &ChatRequest, timeout: Duration) -> Result<String, SendError>;

    /// Upload a document and return its extracted description.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<NewDocument, SendError>;
}

/// [`ChatTransport`] over `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// `endpoint` is the server base URL, e.g. `http://127.0.0.1:3000`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> SendError {
    if err.is_timeout() {
        SendError::Timeout(timeout)
    } else {
        SendError::Network(err.to_string())
    }
}

/// Error for a completed non-2xx response: the server's `error` field, or
/// `fallback` when the body has none.
async fn status_error(response: reqwest::Response, fallback: String) -> SendError {
    let status = response.status().as_u16();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback);
    SendError::Status { status, message }
}

fn content_type_for(file_name: &str) -> &'static str {
    if file_name.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send_chat(&self, request: &ChatRequest, timeout: Duration) -> Result<String, SendError> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let fallback = format!("Request failed with status {}", status.as_u16());
            return Err(status_error(response, fallback).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SendError::Timeout(timeout)
            } else {
                tracing::debug!(error = %e, "Chat reply body was not JSON");
                SendError::InvalidResponse
            }
        })?;

        body.get("response")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or(SendError::InvalidResponse)
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<NewDocument, SendError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type_for(file_name))
            .map_err(|e| SendError::File(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response, "Upload failed".to_string()).await);
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|_| SendError::InvalidResponse)?;
        Ok(reply.document.into())
    }
}
