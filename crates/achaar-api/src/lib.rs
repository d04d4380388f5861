//! Achaar API crate - axum HTTP server for the chat proxy.
//!
//! Provides `POST /api/chat` (validates the request, prepends the persona,
//! calls the model under a timeout, maps failures to a stable error
//! contract), `POST /api/upload` (PDF text extraction) and `GET /health`.

pub mod error;
pub mod handlers;
pub mod persona;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
