//! Remote storage error types

use thiserror::Error;

/// Errors surfaced by reconfiguration
///
/// Delivery failures never appear here; they stay inside the queue worker.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Client construction error (malformed endpoint, unknown scheme, bad queue settings)
    #[error("failed to construct client for remote '{name}': {message}")]
    ClientConstruction { name: String, message: String },

    /// Write relabel rule could not be compiled
    #[error("invalid write relabel config for remote '{name}': {message}")]
    Relabel { name: String, message: String },
}

impl RemoteError {
    /// Create a client construction error
    pub fn client_construction(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientConstruction {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a relabel config error
    pub fn relabel(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Relabel {
            name: name.into(),
            message: message.into(),
        }
    }
}
