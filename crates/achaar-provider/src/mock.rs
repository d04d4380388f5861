//! Scripted chat model for tests.
//!
//! Replies are taken from a queue in order; once the queue is empty the
//! fallback reply is used. Every call is recorded so tests can assert on the
//! history and message the proxy assembled.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use achaar_core::HistoryTurn;

use crate::error::ProviderFailure;
use crate::model::{ChatModel, ChatSession, ChatSetup};

/// One recorded `send` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub setup: ChatSetup,
    pub history: Vec<HistoryTurn>,
    pub text: String,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, ProviderFailure>>,
    calls: Vec<RecordedCall>,
}

/// A [`ChatModel`] whose answers are fixed in advance.
#[derive(Clone)]
pub struct ScriptedModel {
    script: Arc<Mutex<Script>>,
    fallback: Result<String, ProviderFailure>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    /// Model that always answers with `text`.
    pub fn replying(text: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            fallback: Ok(text.to_string()),
            delay: None,
        }
    }

    /// Model that always fails with `failure`.
    pub fn failing(failure: ProviderFailure) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            fallback: Err(failure),
            delay: None,
        }
    }

    /// Queue a one-off answer ahead of the fallback.
    pub fn then(self, reply: Result<String, ProviderFailure>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.replies.push_back(reply);
        }
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All calls made so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script
            .lock()
            .map(|script| script.calls.clone())
            .unwrap_or_default()
    }
}

impl ChatModel for ScriptedModel {
    fn create_chat(&self, setup: ChatSetup, history: Vec<HistoryTurn>) -> Box<dyn ChatSession> {
        Box::new(ScriptedChat {
            model: self.clone(),
            setup,
            history,
        })
    }
}

struct ScriptedChat {
    model: ScriptedModel,
    setup: ChatSetup,
    history: Vec<HistoryTurn>,
}

#[async_trait]
impl ChatSession for ScriptedChat {
    async fn send(&mut self, text: &str) -> Result<String, ProviderFailure> {
        let reply = {
            let mut script = self
                .model
                .script
                .lock()
                .map_err(|e| ProviderFailure::Other(format!("script lock poisoned: {}", e)))?;
            script.calls.push(RecordedCall {
                setup: self.setup.clone(),
                history: self.history.clone(),
                text: text.to_string(),
            });
            script
                .replies
                .pop_front()
                .unwrap_or_else(|| self.model.fallback.clone())
        };

        if let Some(delay) = self.model.delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
