//! Achaar extraction crate - document text extraction.
//!
//! Provides the `DocumentExtractor` trait used by the upload endpoint, a
//! PDF implementation built on `hayro-interpret`, and a `MockExtractor` for
//! testing.

pub mod pdf;

use async_trait::async_trait;
use thiserror::Error;

pub use pdf::PdfExtractor;

/// Plain text pulled out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

/// Errors from document extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("document is empty")]
    Empty,
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Service turning document bytes into plain text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError>;
}

/// Mock extractor for testing.
///
/// Returns a fixed result for any non-empty input without parsing anything.
#[derive(Debug, Clone)]
pub struct MockExtractor {
    result: Result<ExtractedText, ExtractError>,
}

impl MockExtractor {
    /// Extractor that returns `text` as a single page.
    pub fn with_text(text: &str) -> Self {
        Self {
            result: Ok(ExtractedText {
                text: text.to_string(),
                page_count: 1,
            }),
        }
    }

    /// Extractor that returns `text` spread over `pages` pages.
    pub fn with_pages(text: &str, pages: usize) -> Self {
        Self {
            result: Ok(ExtractedText {
                text: text.to_string(),
                page_count: pages,
            }),
        }
    }

    /// Extractor that always fails with `error`.
    pub fn failing(error: ExtractError) -> Self {
        Self { result: Err(error) }
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::with_text("Mock extracted text")
    }
}

#[async_trait]
impl DocumentExtractor for MockExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Empty);
        }
        self.result.clone()
    }
}
