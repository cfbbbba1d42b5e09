use thiserror::Error;

/// noob error types
#[derive(Error, Debug)]
pub enum NoobError {
    /// Directive keyword is not one of `env`, `cp`, `execute`
    #[error("Unknown directive: {keyword:?} is not a valid command")]
    UnknownDirective { keyword: String },

    /// Known directive with a malformed remainder
    #[error("Invalid argument for '{directive}': {message}")]
    InvalidArgument { directive: String, message: String },

    /// Build file or engine configuration is unusable
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Build graph could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Remote engine could not be reached
    #[error("Connection error: {address} - {message}")]
    ConnectionError { address: String, message: String },

    /// Remote engine reported a build failure
    #[error("Remote execution failed: {0}")]
    RemoteExecutionError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl NoobError {
    /// Shorthand for an [`NoobError::InvalidArgument`].
    pub fn invalid_argument(directive: impl Into<String>, message: impl Into<String>) -> Self {
        NoobError::InvalidArgument {
            directive: directive.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for NoobError {
    fn from(err: serde_json::Error) -> Self {
        NoobError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for NoobError {
    fn from(err: serde_yaml::Error) -> Self {
        NoobError::SerializationError(err.to_string())
    }
}

/// Result type alias for noob operations
pub type Result<T> = std::result::Result<T, NoobError>;
