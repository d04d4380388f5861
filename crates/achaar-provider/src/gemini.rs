//! Gemini adapter over the `generateContent` REST endpoint.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use achaar_core::HistoryTurn;

use crate::error::ProviderFailure;
use crate::model::{ChatModel, ChatSession, ChatSetup, GenerationConfig};
use crate::reply::normalize_reply;

/// Chat model backed by the Gemini API.
#[derive(Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

impl ChatModel for GeminiModel {
    fn create_chat(&self, setup: ChatSetup, history: Vec<HistoryTurn>) -> Box<dyn ChatSession> {
        Box::new(GeminiChat {
            client: self.client.clone(),
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, setup.model
            ),
            api_key: self.api_key.clone(),
            generation: setup.generation,
            history,
        })
    }
}

/// One open conversation. Successful exchanges are appended to the history.
struct GeminiChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    generation: GenerationConfig,
    history: Vec<HistoryTurn>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<HistoryTurn>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

impl From<&GenerationConfig> for WireGenerationConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            top_p: config.top_p,
            top_k: config.top_k,
        }
    }
}

/// Gemini only knows `user` and `model` roles.
fn provider_role(role: &str) -> &str {
    match role {
        "assistant" | "model" => "model",
        _ => "user",
    }
}

fn to_contents(history: &[HistoryTurn], text: &str) -> Vec<HistoryTurn> {
    history
        .iter()
        .map(|turn| HistoryTurn {
            role: provider_role(&turn.role).to_string(),
            parts: turn.parts.clone(),
        })
        .chain(std::iter::once(HistoryTurn::new("user", text)))
        .collect()
}

fn transport_failure(err: reqwest::Error) -> ProviderFailure {
    if err.is_timeout() {
        ProviderFailure::Timeout(err.to_string())
    } else {
        ProviderFailure::classify(format!("network error: {}", err))
    }
}

/// Pull `error.message` and `error.status` out of a Gemini error body.
fn error_details(body: &str) -> (Option<String>, String) {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let status = value
                .pointer("/error/status")
                .and_then(Value::as_str)
                .map(str::to_string);
            let message = value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            (status, message)
        }
        Err(_) => (None, body.to_string()),
    }
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send(&mut self, text: &str) -> Result<String, ProviderFailure> {
        let request = GenerateRequest {
            contents: to_contents(&self.history, text),
            generation_config: WireGenerationConfig::from(&self.generation),
        };

        tracing::debug!(
            turns = request.contents.len(),
            url = %self.url,
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            let (provider_status, message) = error_details(&body);
            tracing::debug!(
                status = status.as_u16(),
                provider_status = ?provider_status,
                "Gemini returned an error"
            );
            return Err(ProviderFailure::from_status(
                status.as_u16(),
                provider_status.as_deref(),
                message,
            ));
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|_| ProviderFailure::InvalidResponse)?;
        let reply = normalize_reply(&payload)?;

        self.history.push(HistoryTurn::new("user", text));
        self.history.push(HistoryTurn::new("model", reply.clone()));
        Ok(reply)
    }
}
