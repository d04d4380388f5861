//! Chat session store.
//!
//! Holds the transcript and attached documents for one session and owns the
//! send/retry state machine. State is published as immutable snapshots on a
//! `watch` channel; every mutation replaces the whole snapshot.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use achaar_core::{ChatRequest, Document, HistoryTurn, Message, NewDocument, Role};

use crate::error::SendError;
use crate::history::{document_context, to_history};
use crate::retry::RetryPolicy;
use crate::transport::ChatTransport;

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub documents: Vec<Document>,
    /// True from the start of a send until its retry chain ends.
    pub is_loading: bool,
    /// Banner text: a retry notice or the last terminal error.
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            messages: vec![Message::seed()],
            documents: Vec::new(),
            is_loading: false,
            error: None,
        }
    }
}

/// Single-writer store for one chat session.
pub struct ChatStore {
    state: watch::Sender<Arc<SessionState>>,
    transport: Arc<dyn ChatTransport>,
    policy: RetryPolicy,
}

impl ChatStore {
    pub fn new(transport: Arc<dyn ChatTransport>, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(Arc::new(SessionState::default()));
        Self {
            state,
            transport,
            policy,
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state replacement.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionState>> {
        self.state.subscribe()
    }

    fn update(&self, apply: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(|current| {
            let mut next = SessionState::clone(current);
            apply(&mut next);
            *current = Arc::new(next);
        });
    }

    /// Append a user message and send it, retrying transient failures.
    ///
    /// Resolves once the retry chain ends, with either an assistant reply or
    /// a flagged error message appended to the transcript.
    pub async fn send_message(&self, content: &str) {
        let history = to_history(&self.snapshot().messages);
        self.update(|state| {
            state.messages.push(Message::user(content));
            state.is_loading = true;
            state.error = None;
        });
        self.run_send(content, history).await;
    }

    /// Resend the most recent user message.
    ///
    /// Everything after that message is dropped first. The message itself
    /// stays in place and is not appended again. Does nothing when the
    /// transcript has no user message.
    pub async fn retry_last_message(&self) {
        let snapshot = self.snapshot();
        let Some(index) = snapshot
            .messages
            .iter()
            .rposition(|m| m.role == Role::User)
        else {
            debug!("Retry requested with no user message in transcript");
            return;
        };
        let content = snapshot.messages[index].content.clone();
        let history = to_history(&snapshot.messages[..index]);

        self.update(|state| {
            state.messages.truncate(index + 1);
            state.is_loading = true;
            state.error = None;
        });
        info!(dropped = snapshot.messages.len() - index - 1, "Retrying last message");
        self.run_send(&content, history).await;
    }

    /// Reset the transcript to the greeting. Documents stay attached.
    pub fn clear_chat(&self) {
        self.update(|state| {
            state.messages = vec![Message::seed()];
            state.is_loading = false;
            state.error = None;
        });
    }

    pub fn add_document(&self, document: NewDocument) -> Document {
        let document = Document::from(document);
        let added = document.clone();
        self.update(|state| state.documents.push(document));
        added
    }

    /// Returns whether a document with `id` was attached.
    pub fn remove_document(&self, id: &str) -> bool {
        if !self.snapshot().documents.iter().any(|d| d.id == id) {
            return false;
        }
        self.update(|state| state.documents.retain(|d| d.id != id));
        true
    }

    /// Upload a local file to the proxy and attach the extracted text.
    ///
    /// On failure the session is left unchanged.
    pub async fn upload_document(&self, path: &Path) -> Result<Document, SendError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SendError::File(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        let document = self.transport.upload(&file_name, bytes).await?;
        info!(file = %file_name, size = document.size, "Document attached");
        Ok(self.add_document(document))
    }

    /// One retry chain. `is_loading` is already set and is cleared exactly
    /// once, when the chain ends.
    async fn run_send(&self, content: &str, history: Vec<HistoryTurn>) {
        let context = document_context(&self.snapshot().documents);
        let request = ChatRequest {
            message: content.to_string(),
            history,
            document_context: (!context.is_empty()).then_some(context),
        };

        let mut retry_count = 0;
        loop {
            if retry_count > 0 {
                self.update(|state| state.error = None);
            }

            let error = match self
                .transport
                .send_chat(&request, self.policy.attempt_timeout)
                .await
            {
                Ok(reply) => {
                    debug!(attempt = retry_count + 1, "Reply received");
                    self.update(|state| {
                        state.messages.push(Message::assistant(reply));
                        state.error = None;
                        state.is_loading = false;
                    });
                    return;
                }
                Err(error) => error,
            };

            if !self.policy.should_retry(&error, retry_count) {
                let text = error.to_string();
                let notice = self.policy.failure_message(&text, retry_count);
                warn!(attempt = retry_count + 1, error = %text, "Send failed");
                self.update(|state| {
                    state.messages.push(Message::assistant_error(notice));
                    state.error = Some(text);
                    state.is_loading = false;
                });
                return;
            }

            let delay = self.policy.delay_for(retry_count);
            warn!(
                attempt = retry_count + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient send failure, retrying"
            );
            let notice = self.policy.retry_notice(retry_count);
            self.update(|state| state.error = Some(notice));
            tokio::time::sleep(delay).await;
            retry_count += 1;
        }
    }
}
