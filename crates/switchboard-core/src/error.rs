use thiserror::Error;

/// Top-level error type for the Switchboard system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for
/// SwitchboardError` so that the `?` operator works seamlessly across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SwitchboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Classification error: {0}")]
    Classify(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SwitchboardError {
    fn from(err: toml::de::Error) -> Self {
        SwitchboardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SwitchboardError {
    fn from(err: toml::ser::Error) -> Self {
        SwitchboardError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SwitchboardError {
    fn from(err: serde_json::Error) -> Self {
        SwitchboardError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Switchboard operations.
pub type Result<T> = std::result::Result<T, SwitchboardError>;
