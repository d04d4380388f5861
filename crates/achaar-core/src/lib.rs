//! Achaar core - shared data model, configuration and error types.

pub mod config;
pub mod error;
pub mod types;

pub use config::AchaarConfig;
pub use error::{AchaarError, Result};
pub use types::*;
