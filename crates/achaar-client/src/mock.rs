//! Scripted transport for exercising the session store without a server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use achaar_core::{ChatRequest, NewDocument};

use crate::error::SendError;
use crate::transport::ChatTransport;

/// One recorded chat request.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub request: ChatRequest,
    pub timeout: Duration,
    pub at: Instant,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, SendError>>,
    uploads: VecDeque<Result<NewDocument, SendError>>,
    sent: Vec<SentRequest>,
}

/// A [`ChatTransport`] with replies fixed in advance.
///
/// Queued replies are used in order; after that every send gets the fallback.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    fallback: Result<String, SendError>,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn replying(text: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            fallback: Ok(text.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: SendError) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            fallback: Err(error),
            delay: Duration::ZERO,
        }
    }

    pub fn then(self, reply: Result<String, SendError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.replies.push_back(reply);
        }
        self
    }

    /// Hold every chat reply for `delay` after recording the request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn then_upload(self, result: Result<NewDocument, SendError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.uploads.push_back(result);
        }
        self
    }

    /// Chat requests received so far, oldest first.
    pub fn sent(&self) -> Vec<SentRequest> {
        self.script
            .lock()
            .map(|script| script.sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send_chat(&self, request: &ChatRequest, timeout: Duration) -> Result<String, SendError> {
        let reply = {
            let mut script = self
                .script
                .lock()
                .map_err(|e| SendError::Network(format!("script lock poisoned: {}", e)))?;
            script.sent.push(SentRequest {
                request: request.clone(),
                timeout,
                at: Instant::now(),
            });
            script
                .replies
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        reply
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<NewDocument, SendError> {
        let mut script = self
            .script
            .lock()
            .map_err(|e| SendError::Network(format!("script lock poisoned: {}", e)))?;
        script.uploads.pop_front().unwrap_or_else(|| {
            Ok(NewDocument {
                name: file_name.to_string(),
                size: bytes.len() as u64,
                doc_type: "PDF".to_string(),
                content: "Mock extracted text".to_string(),
            })
        })
    }
}
