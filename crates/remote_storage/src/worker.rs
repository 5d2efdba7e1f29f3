//! Queue worker contract consumed by the coordinator

use contracts::{RemoteWriteConfig, Sample};

use crate::error::RemoteError;

/// Lifecycle state of a queue worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, not yet delivering
    Created,
    /// Delivery task running
    Running,
    /// Stopped; appends are dropped
    Stopped,
}

/// One worker per remote destination
#[trait_variant::make(QueueWorker: Send)]
pub trait LocalQueueWorker {
    /// Destination name
    fn name(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> WorkerState;

    /// Begin asynchronous delivery; must not block
    fn start(&mut self);

    /// Enqueue a sample for delivery; must not block, never reports failure
    fn append(&self, sample: Sample);

    /// Cease delivery and release resources; may wait for in-flight work; idempotent
    async fn stop(&mut self);
}

/// Builds workers from destination configs
pub trait WorkerFactory: Send + Sync {
    type Worker: QueueWorker + Sync + 'static;

    /// Construct (but do not start) the worker for the destination at `index`
    ///
    /// # Errors
    /// Invalid destination parameters.
    fn construct(
        &self,
        index: usize,
        config: &RemoteWriteConfig,
    ) -> Result<Self::Worker, RemoteError>;
}
