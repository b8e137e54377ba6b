use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Topology declaration failed: {0}")]
    Topology(String),

    #[error("Failed to serialize envelope: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Routing key '{0}' is not bound to any queue")]
    UnroutableKey(String),

    #[error("Audit write failed: {0}")]
    Audit(String),

    #[error("Audit write timed out after {0:?}")]
    AuditTimeout(Duration),
}

impl WriterError {
    /// Pipeline stage the error was raised in, used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            WriterError::Config(_) => "config",
            WriterError::Connection(_) => "connect",
            WriterError::Topology(_) => "topology",
            WriterError::Serialization(_) => "serialize",
            WriterError::Publish(_) | WriterError::UnroutableKey(_) => "publish",
            WriterError::Audit(_) | WriterError::AuditTimeout(_) => "audit",
        }
    }
}
