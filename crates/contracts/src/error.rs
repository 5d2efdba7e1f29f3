//! Layered error definitions
//!
//! Categorized by source: config / client

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Client Errors =====
    /// Client send error
    #[error("client '{client}' send error: {message}")]
    ClientSend { client: String, message: String },

    /// Client connection error
    #[error("client '{client}' connection error: {message}")]
    ClientConnection { client: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create client send error
    pub fn client_send(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientSend {
            client: client.into(),
            message: message.into(),
        }
    }

    /// Create client connection error
    pub fn client_connection(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientConnection {
            client: client.into(),
            message: message.into(),
        }
    }
}
