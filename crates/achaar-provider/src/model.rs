use async_trait::async_trait;

use achaar_core::config::ProviderConfig;
use achaar_core::HistoryTurn;

use crate::error::ProviderFailure;

/// Fixed sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

/// Everything needed to open a chat with the model service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSetup {
    pub model: String,
    pub generation: GenerationConfig,
}

impl From<&ProviderConfig> for ChatSetup {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.model.clone(),
            generation: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                top_p: config.top_p,
                top_k: config.top_k,
            },
        }
    }
}

/// A hosted chat-completion service.
pub trait ChatModel: Send + Sync {
    /// Open a chat seeded with `history`, oldest turn first.
    fn create_chat(&self, setup: ChatSetup, history: Vec<HistoryTurn>) -> Box<dyn ChatSession>;
}

/// An open chat with the model service.
#[async_trait]
pub trait ChatSession: Send {
    /// Send one user message and return the reply text.
    ///
    /// Implementations normalize the provider's reply shape before returning,
    /// so callers only ever see plain text.
    async fn send(&mut self, text: &str) -> Result<String, ProviderFailure>;
}
