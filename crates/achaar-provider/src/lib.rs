//! Achaar provider crate - the boundary to the hosted chat model.
//!
//! Exposes the `ChatModel`/`ChatSession` traits consumed by the proxy
//! endpoint, a discriminated `ProviderFailure` type, a single reply
//! normalization step, a Gemini adapter over HTTP, and a scripted model for
//! tests.

pub mod error;
pub mod gemini;
pub mod mock;
pub mod model;
pub mod reply;

pub use error::{FailureKind, ProviderFailure};
pub use gemini::GeminiModel;
pub use mock::ScriptedModel;
pub use model::{ChatModel, ChatSession, ChatSetup, GenerationConfig};
pub use reply::normalize_reply;
