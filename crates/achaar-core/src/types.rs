use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Identifier of the greeting message that seeds every session.
pub const SEED_MESSAGE_ID: &str = "1";

/// 2025-01-01T00:00:00Z, the fixed timestamp of the seed greeting.
pub const SEED_TIMESTAMP_SECS: i64 = 1_735_689_600;

/// Greeting shown at the top of every fresh transcript.
pub const SEED_GREETING: &str = "Assalamu Alaikum! Welcome, welcome! I'm Achaar. \
Pull up a chair, the chai is still hot. What brings you here today, dost?";

/// Fixed timestamp of the seed greeting, independent of the current time.
pub fn seed_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(SEED_TIMESTAMP_SECS, 0).unwrap_or_default()
}

// =============================================================================
// Transcript model
// =============================================================================

/// Author of a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the chat transcript. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set on assistant messages that report a failed send.
    #[serde(default)]
    pub error: bool,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, error: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            error,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, false)
    }

    /// Visible assistant message reporting a failed send.
    pub fn assistant_error(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, true)
    }

    /// The greeting that seeds every session.
    pub fn seed() -> Self {
        Self {
            id: SEED_MESSAGE_ID.to_string(),
            role: Role::Assistant,
            content: SEED_GREETING.to_string(),
            timestamp: seed_timestamp(),
            error: false,
        }
    }

    pub fn is_seed(&self) -> bool {
        self.role == Role::Assistant && self.id == SEED_MESSAGE_ID
    }
}

/// Document text attached to the session after a successful upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    /// Size of the original file in bytes.
    pub size: u64,
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Extracted plain text.
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Document fields supplied by the uploader; id and upload time are assigned
/// by the session store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub content: String,
}

impl From<NewDocument> for Document {
    fn from(doc: NewDocument) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: doc.name,
            size: doc.size,
            doc_type: doc.doc_type,
            content: doc.content,
            uploaded_at: Utc::now(),
        }
    }
}

/// Human-readable file size: bytes, then KB and MB with one decimal.
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

// =============================================================================
// Wire format shared by the proxy and the client
// =============================================================================

/// A text fragment of a provider turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One prior turn in provider history shape: `{role, parts: [{text}]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub parts: Vec<Part>,
}

impl HistoryTurn {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// All text parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<&Message> for HistoryTurn {
    fn from(message: &Message) -> Self {
        HistoryTurn::new(message.role.as_str(), message.content.clone())
    }
}

/// Body of `POST /api/chat` as sent by the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_context: Option<String>,
}

/// Successful reply of `POST /api/chat`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub success: bool,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            success: true,
        }
    }
}

/// Failure body shared by every endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
    pub success: bool,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            success: false,
        }
    }
}

/// Document description returned by `POST /api/upload`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub content: String,
    pub pages: usize,
}

impl From<UploadedDocument> for NewDocument {
    fn from(doc: UploadedDocument) -> Self {
        Self {
            name: doc.name,
            size: doc.size,
            doc_type: doc.doc_type,
            content: doc.content,
        }
    }
}

/// Successful reply of `POST /api/upload`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadReply {
    pub success: bool,
    pub document: UploadedDocument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_message() {
        let seed = Message::seed();
        assert_eq!(seed.id, "1");
        assert_eq!(seed.role, Role::Assistant);
        assert!(!seed.error);
        assert!(seed.is_seed());
        assert_eq!(seed.timestamp.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_seed_timestamp_is_constant() {
        assert_eq!(Message::seed().timestamp, Message::seed().timestamp);
    }

    #[test]
    fn test_user_message_is_not_seed() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, Role::User);
        assert!(!msg.is_seed());
        assert_ne!(msg.id, SEED_MESSAGE_ID);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::assistant("a");
        let b = Message::assistant("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_assistant_error_flag() {
        assert!(Message::assistant_error("boom").error);
        assert!(!Message::assistant("fine").error);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_history_turn_from_message() {
        let turn = HistoryTurn::from(&Message::assistant("hi there"));
        assert_eq!(turn.role, "assistant");
        assert_eq!(turn.parts, vec![Part { text: "hi there".into() }]);
    }

    #[test]
    fn test_history_turn_text_joins_parts() {
        let turn = HistoryTurn {
            role: "user".into(),
            parts: vec![Part { text: "a".into() }, Part { text: "b".into() }],
        };
        assert_eq!(turn.text(), "a\nb");
    }

    #[test]
    fn test_chat_request_uses_camel_case() {
        let req = ChatRequest {
            message: "hi".into(),
            history: vec![],
            document_context: Some("ctx".into()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["documentContext"], "ctx");
        assert!(json.get("document_context").is_none());
    }

    #[test]
    fn test_chat_request_omits_missing_context() {
        let req = ChatRequest {
            message: "hi".into(),
            history: vec![],
            document_context: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("documentContext").is_none());
    }

    #[test]
    fn test_reply_success_flags() {
        assert!(ChatReply::new("ok").success);
        assert!(!ErrorReply::new("bad").success);
    }

    #[test]
    fn test_uploaded_document_type_field() {
        let json = serde_json::json!({
            "name": "notes.pdf",
            "size": 10,
            "type": "PDF",
            "content": "text",
            "pages": 2
        });
        let doc: UploadedDocument = serde_json::from_value(json).unwrap();
        assert_eq!(doc.doc_type, "PDF");
        let new_doc = NewDocument::from(doc);
        assert_eq!(new_doc.name, "notes.pdf");
        assert_eq!(new_doc.size, 10);
    }

    #[test]
    fn test_document_from_new_document() {
        let doc = Document::from(NewDocument {
            name: "a.pdf".into(),
            size: 3,
            doc_type: "PDF".into(),
            content: "abc".into(),
        });
        assert!(!doc.id.is_empty());
        assert_eq!(doc.content, "abc");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
    }
}
