//! LogClient - logs batch summaries via tracing

use contracts::{ContractError, RemoteClient, Sample};
use tracing::{info, instrument};

/// Client that logs batch summaries instead of delivering them
pub struct LogClient {
    name: String,
    batches: u64,
}

impl LogClient {
    /// Create a new LogClient with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
        }
    }

    fn log_batch_summary(&self, samples: &[Sample]) {
        let first = samples.first().map(|s| s.metric.to_string());
        let last_ts = samples.iter().map(|s| s.timestamp_ms).max();

        info!(
            client = %self.name,
            batch = self.batches,
            samples = samples.len(),
            first = ?first,
            last_timestamp_ms = ?last_ts,
            "Remote write batch"
        );
    }
}

impl RemoteClient for LogClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_client_send",
        skip(self, samples),
        fields(client = %self.name, samples = samples.len())
    )]
    async fn send(&mut self, samples: &[Sample]) -> Result<(), ContractError> {
        self.batches += 1;
        self.log_batch_summary(samples);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_client_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(client = %self.name, batches = self.batches, "LogClient closed");
        Ok(())
    }
}
