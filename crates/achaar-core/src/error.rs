use thiserror::Error;

/// Top-level error type for the Achaar workspace.
///
/// Subsystem crates keep their own error enums and convert into this one at
/// the composition root so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AchaarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AchaarError {
    fn from(err: toml::de::Error) -> Self {
        AchaarError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AchaarError {
    fn from(err: toml::ser::Error) -> Self {
        AchaarError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AchaarError {
    fn from(err: serde_json::Error) -> Self {
        AchaarError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Achaar operations.
pub type Result<T> = std::result::Result<T, AchaarError>;
