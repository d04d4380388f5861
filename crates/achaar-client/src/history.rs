//! Translation of session state into the proxy request shape.

use achaar_core::{Document, HistoryTurn, Message};

/// Provider history for `messages`, oldest first.
///
/// Failed-send notices and the seed greeting are not conversation turns and
/// are left out.
pub fn to_history(messages: &[Message]) -> Vec<HistoryTurn> {
    messages
        .iter()
        .filter(|m| !m.error && !m.is_seed())
        .map(HistoryTurn::from)
        .collect()
}

/// Trailing context block listing every attached document, or an empty
/// string when nothing is attached.
pub fn document_context(documents: &[Document]) -> String {
    if documents.is_empty() {
        return String::new();
    }
    let entries = documents
        .iter()
        .map(|doc| format!("[{}]\n{}", doc.name, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("\n\nAttached Documents:\n{}", entries)
}
