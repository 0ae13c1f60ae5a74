//! Error types for the broker logger

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Broker unreachable or credentials rejected
    #[error("Connection to broker at {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Exchange or queue declaration rejected
    #[error("Failed to declare {entity} '{name}': {message}")]
    Declare {
        entity: String,
        name: String,
        message: String,
    },

    /// Transport failure while publishing a record
    #[error("Failed to publish to '{destination}': {message}")]
    Publish {
        destination: String,
        message: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Logger already closed
    #[error("Logger already closed")]
    LoggerClosed,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create a connection error
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a declaration error
    pub fn declare(
        entity: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LoggerError::Declare {
            entity: entity.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(destination: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Publish {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether the error came from establishing the connection or topology
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            LoggerError::Connection { .. } | LoggerError::Declare { .. }
        )
    }
}
