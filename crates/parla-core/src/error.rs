use thiserror::Error;

/// Top-level error type for the Parla system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for ParlaError`
/// so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParlaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Flow error: {0}")]
    Flow(String),

    #[error("Generation error: {0}")]
    Assist(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ParlaError {
    fn from(err: toml::de::Error) -> Self {
        ParlaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ParlaError {
    fn from(err: toml::ser::Error) -> Self {
        ParlaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ParlaError {
    fn from(err: serde_json::Error) -> Self {
        ParlaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Parla operations.
pub type Result<T> = std::result::Result<T, ParlaError>;
