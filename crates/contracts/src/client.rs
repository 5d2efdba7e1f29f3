//! RemoteClient trait - queue worker output interface
//!
//! Defines the abstract interface for delivery clients.

use crate::{ContractError, Sample};

/// Delivery client trait
///
/// One client per remote destination, driven by that destination's queue worker.
#[trait_variant::make(RemoteClient: Send)]
pub trait LocalRemoteClient {
    /// Client name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one batch of samples
    ///
    /// # Errors
    /// Returns send error (should include context). The caller does not retry.
    async fn send(&mut self, samples: &[Sample]) -> Result<(), ContractError>;

    /// Flush buffered output (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close client
    async fn close(&mut self) -> Result<(), ContractError>;
}
