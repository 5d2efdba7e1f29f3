//! QueueManager - one bounded queue and delivery task per remote destination

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use contracts::{QueueConfig, RemoteClient, RemoteWriteConfig, Sample};
use observability::DropReason;

use crate::clients::Client;
use crate::error::RemoteError;
use crate::metrics::QueueMetrics;
use crate::relabel::Relabeler;
use crate::worker::{QueueWorker, WorkerFactory, WorkerState};

/// Queue worker that relabels, buffers and batches samples for one client
pub struct QueueManager<C: RemoteClient + 'static = Client> {
    /// Destination name
    name: String,
    /// Write relabel rules
    relabeler: Relabeler,
    /// Queue tuning
    queue: QueueConfig,
    /// Sending half of the bounded queue (None once stopped)
    tx: Option<mpsc::Sender<Sample>>,
    /// Client and receiving half, held until start
    pending: Option<(C, mpsc::Receiver<Sample>)>,
    /// Shared metrics
    metrics: Arc<QueueMetrics>,
    /// Delivery task handle
    worker_handle: Option<JoinHandle<()>>,
    state: WorkerState,
}

impl<C: RemoteClient + 'static> QueueManager<C> {
    /// Create a QueueManager; nothing runs until [`QueueWorker::start`]
    ///
    /// # Errors
    /// Zero queue capacity, batch size, or batch deadline.
    pub fn new(
        name: impl Into<String>,
        client: C,
        relabeler: Relabeler,
        queue: QueueConfig,
    ) -> Result<Self, RemoteError> {
        let name = name.into();
        validate_queue_config(&name, &queue)?;

        let (tx, rx) = mpsc::channel(queue.capacity);

        Ok(Self {
            name,
            relabeler,
            queue,
            tx: Some(tx),
            pending: Some((client, rx)),
            metrics: Arc::new(QueueMetrics::new()),
            worker_handle: None,
            state: WorkerState::Created,
        })
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<QueueMetrics> {
        &self.metrics
    }

    fn enqueue(&self, sample: Sample) {
        let Some(tx) = self.tx.as_ref() else {
            self.metrics.inc_dropped_count();
            observability::record_sample_dropped(&self.name, DropReason::Stopped);
            return;
        };

        match tx.try_send(sample) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.queue.capacity - tx.capacity());
            }
            Err(mpsc::error::TrySendError::Full(s)) => {
                self.metrics.inc_dropped_count();
                observability::record_sample_dropped(&self.name, DropReason::QueueFull);
                debug!(
                    queue = %self.name,
                    metric = %s.metric,
                    "Queue full, sample dropped"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.inc_dropped_count();
                observability::record_sample_dropped(&self.name, DropReason::Closed);
                error!(queue = %self.name, "Queue worker closed unexpectedly");
            }
        }
    }
}

impl<C: RemoteClient + 'static> QueueWorker for QueueManager<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> WorkerState {
        self.state
    }

    fn start(&mut self) {
        let Some((client, rx)) = self.pending.take() else {
            return;
        };

        let worker_metrics = Arc::clone(&self.metrics);
        let worker_name = self.name.clone();
        let queue = self.queue.clone();

        self.worker_handle = Some(tokio::spawn(async move {
            queue_worker(client, rx, worker_metrics, worker_name, queue).await;
        }));
        self.state = WorkerState::Running;
        info!(queue = %self.name, "Queue started");
    }

    fn append(&self, sample: Sample) {
        match self.relabeler.process(sample) {
            Some(sample) => self.enqueue(sample),
            None => {
                self.metrics.inc_relabel_dropped_count();
                observability::record_sample_dropped(&self.name, DropReason::Relabel);
            }
        }
    }

    /// Close the queue and wait for the delivery task to drain it
    #[instrument(name = "queue_manager_stop", skip(self), fields(queue = %self.name))]
    async fn stop(&mut self) {
        if self.state == WorkerState::Stopped {
            return;
        }

        // Dropping the sender lets the worker drain and exit
        drop(self.tx.take());
        self.pending = None;

        if let Some(handle) = self.worker_handle.take() {
            if let Err(e) = handle.await {
                error!(queue = %self.name, error = ?e, "Queue worker task panicked");
            }
        }

        self.state = WorkerState::Stopped;
        info!(queue = %self.name, "Queue stopped");
    }
}

fn validate_queue_config(name: &str, queue: &QueueConfig) -> Result<(), RemoteError> {
    if queue.capacity == 0 {
        return Err(RemoteError::client_construction(name, "queue capacity must be > 0"));
    }
    if queue.max_samples_per_send == 0 {
        return Err(RemoteError::client_construction(
            name,
            "max_samples_per_send must be > 0",
        ));
    }
    if queue.batch_send_deadline_ms == 0 {
        return Err(RemoteError::client_construction(
            name,
            "batch_send_deadline_ms must be > 0",
        ));
    }
    Ok(())
}

/// Delivery task: batches by size or deadline, sends, never retries
#[instrument(
    name = "queue_worker_loop",
    skip(client, rx, metrics, queue),
    fields(queue = %name)
)]
async fn queue_worker<C: RemoteClient>(
    mut client: C,
    mut rx: mpsc::Receiver<Sample>,
    metrics: Arc<QueueMetrics>,
    name: String,
    queue: QueueConfig,
) {
    debug!(queue = %name, "Queue worker started");

    let mut batch = Vec::with_capacity(queue.max_samples_per_send);
    let mut deadline = interval(Duration::from_millis(queue.batch_send_deadline_ms));
    deadline.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    deadline.tick().await;

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(sample) => {
                    batch.push(sample);
                    metrics.set_queue_len(rx.len());
                    if batch.len() >= queue.max_samples_per_send {
                        send_batch(&mut client, &mut batch, &metrics, &name).await;
                        deadline.reset();
                    }
                }
                None => break,
            },
            _ = deadline.tick() => {
                if !batch.is_empty() {
                    send_batch(&mut client, &mut batch, &metrics, &name).await;
                }
            }
        }
    }

    // Drain
    if !batch.is_empty() {
        send_batch(&mut client, &mut batch, &metrics, &name).await;
    }
    metrics.set_queue_len(0);

    if let Err(e) = client.flush().await {
        error!(queue = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = client.close().await {
        error!(queue = %name, error = %e, "Close failed on shutdown");
    }

    debug!(queue = %name, "Queue worker stopped");
}

async fn send_batch<C: RemoteClient>(
    client: &mut C,
    batch: &mut Vec<Sample>,
    metrics: &QueueMetrics,
    name: &str,
) {
    let count = batch.len() as u64;
    match client.send(batch).await {
        Ok(()) => {
            metrics.add_sent(count);
            observability::record_samples_sent(name, count);
        }
        Err(e) => {
            // Samples are lost; remote write sheds load instead of retrying
            metrics.add_failed(count);
            observability::record_send_failure(name, count);
            warn!(queue = %name, samples = count, error = %e, "Send failed, batch dropped");
        }
    }
    batch.clear();
}

/// Builds [`QueueManager`]s backed by URL-selected [`Client`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueManagerFactory;

impl WorkerFactory for QueueManagerFactory {
    type Worker = QueueManager<Client>;

    #[instrument(
        name = "queue_manager_construct",
        skip(self, config),
        fields(url = %config.url)
    )]
    fn construct(
        &self,
        index: usize,
        config: &RemoteWriteConfig,
    ) -> Result<Self::Worker, RemoteError> {
        let name = config.display_name(index);

        let relabeler = Relabeler::new(&config.write_relabel_configs)
            .map_err(|e| RemoteError::relabel(&name, e.to_string()))?;
        let client = Client::from_url(&name, &config.url)
            .map_err(|e| RemoteError::client_construction(&name, e.to_string()))?;

        QueueManager::new(name, client, relabeler, config.queue.clone())
    }
}
