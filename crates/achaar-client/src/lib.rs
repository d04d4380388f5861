//! Achaar client crate - chat session store and proxy transport.
//!
//! [`ChatStore`] owns the transcript, attached documents and the send/retry
//! state machine; [`HttpTransport`] talks to the proxy over HTTP.

pub mod error;
pub mod history;
pub mod mock;
pub mod retry;
pub mod store;
pub mod transport;

pub use error::SendError;
pub use mock::ScriptedTransport;
pub use retry::RetryPolicy;
pub use store::{ChatStore, SessionState};
pub use transport::{ChatTransport, HttpTransport};
