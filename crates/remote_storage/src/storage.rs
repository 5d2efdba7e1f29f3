//! RemoteStorage - fans samples out to every configured remote write queue

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use contracts::{LabelSet, RemoteStorageConfig, Sample};

use crate::error::RemoteError;
use crate::metrics::QueueMetricsSnapshot;
use crate::queue::{QueueManager, QueueManagerFactory};
use crate::worker::{QueueWorker, WorkerFactory, WorkerState};

/// State swapped atomically by reconfiguration
struct StorageState<W> {
    external_labels: LabelSet,
    workers: Vec<W>,
}

/// Fan-out coordinator for remote write
///
/// Appends share a read lock and never block each other; reconfiguration
/// and shutdown take the write lock, so an append sees either the whole old
/// or the whole new worker set.
pub struct RemoteStorage<F: WorkerFactory = QueueManagerFactory> {
    factory: F,
    state: RwLock<StorageState<F::Worker>>,
}

impl RemoteStorage<QueueManagerFactory> {
    /// Create an unconfigured storage backed by [`QueueManager`]s
    pub fn new() -> Self {
        Self::with_factory(QueueManagerFactory)
    }

    /// Per-queue metrics, in configuration order
    pub async fn queue_metrics(&self) -> Vec<(String, QueueMetricsSnapshot)> {
        let state = self.state.read().await;
        state
            .workers
            .iter()
            .map(|q: &QueueManager| (q.name().to_string(), q.metrics().snapshot()))
            .collect()
    }
}

impl Default for RemoteStorage<QueueManagerFactory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: WorkerFactory> RemoteStorage<F> {
    /// Create an unconfigured storage using `factory` to build workers
    pub fn with_factory(factory: F) -> Self {
        Self {
            factory,
            state: RwLock::new(StorageState {
                external_labels: LabelSet::new(),
                workers: Vec::new(),
            }),
        }
    }

    /// Replace all workers and external labels with those of `config`
    ///
    /// Every new worker is constructed before anything is touched; a
    /// construction failure returns the error with the running workers
    /// left as they were.
    ///
    /// # Errors
    /// The first worker construction error.
    #[instrument(
        name = "remote_storage_apply_config",
        skip(self, config),
        fields(queues = config.remote_write.len())
    )]
    pub async fn apply_config(&self, config: &RemoteStorageConfig) -> Result<(), RemoteError> {
        let new_workers = match self.construct_workers(config) {
            Ok(workers) => workers,
            Err(e) => {
                observability::record_reconfiguration(false);
                warn!(error = %e, "Remote write reconfiguration rejected");
                return Err(e);
            }
        };

        let mut state = self.state.write().await;

        for worker in state.workers.iter_mut() {
            worker.stop().await;
        }

        state.workers = new_workers;
        state.external_labels = config.global.external_labels.clone();

        for worker in state.workers.iter_mut() {
            worker.start();
        }

        observability::record_reconfiguration(true);
        observability::record_active_queues(state.workers.len());
        info!(
            queues = state.workers.len(),
            external_labels = %state.external_labels,
            "Remote write configuration applied"
        );
        Ok(())
    }

    fn construct_workers(&self, config: &RemoteStorageConfig) -> Result<Vec<F::Worker>, RemoteError> {
        let mut workers = Vec::with_capacity(config.remote_write.len());
        for (index, rw_config) in config.remote_write.iter().enumerate() {
            workers.push(self.factory.construct(index, rw_config)?);
        }
        Ok(workers)
    }

    /// Hand an enriched copy of `sample` to every active worker
    ///
    /// Fire-and-forget: delivery problems are the workers' concern and
    /// there is nothing to report to the caller.
    pub async fn append(&self, sample: &Sample) {
        let state = self.state.read().await;

        for worker in &state.workers {
            worker.append(sample.with_external_labels(&state.external_labels));
        }
        observability::record_sample_appended();
    }

    /// Stop every active worker (shutdown); idempotent
    ///
    /// The worker set is kept.
    #[instrument(name = "remote_storage_stop", skip(self))]
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        for worker in state.workers.iter_mut() {
            worker.stop().await;
        }
        debug!(queues = state.workers.len(), "Remote storage stopped");
    }

    /// Remote write never asks ingestion to slow down; it drops samples instead
    pub fn needs_throttling(&self) -> bool {
        false
    }

    /// Number of workers in the active set
    pub async fn worker_count(&self) -> usize {
        self.state.read().await.workers.len()
    }

    /// `(name, state)` of each active worker, in configuration order
    pub async fn worker_states(&self) -> Vec<(String, WorkerState)> {
        let state = self.state.read().await;
        state
            .workers
            .iter()
            .map(|w| (w.name().to_string(), w.state()))
            .collect()
    }

    /// External labels currently applied
    pub async fn external_labels(&self) -> LabelSet {
        self.state.read().await.external_labels.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GlobalConfig, Metric, RemoteWriteConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Delivery record: (generation, worker index, sample)
    type Log = Arc<Mutex<Vec<(usize, usize, Sample)>>>;

    struct MockWorker {
        name: String,
        generation: usize,
        index: usize,
        state: WorkerState,
        log: Log,
        stops: Arc<AtomicUsize>,
    }

    impl QueueWorker for MockWorker {
        fn name(&self) -> &str {
            &self.name
        }

        fn state(&self) -> WorkerState {
            self.state
        }

        fn start(&mut self) {
            self.state = WorkerState::Running;
        }

        fn append(&self, sample: Sample) {
            self.log
                .lock()
                .unwrap()
                .push((self.generation, self.index, sample));
        }

        async fn stop(&mut self) {
            if self.state != WorkerState::Stopped {
                self.stops.fetch_add(1, Ordering::SeqCst);
            }
            self.state = WorkerState::Stopped;
        }
    }

    /// Fails on `invalid://` urls; `mock://gen<N>` sets the worker generation
    struct MockFactory {
        log: Log,
        stops: Arc<AtomicUsize>,
        constructed: AtomicUsize,
    }

    impl MockFactory {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                stops: Arc::new(AtomicUsize::new(0)),
                constructed: AtomicUsize::new(0),
            }
        }
    }

    impl WorkerFactory for MockFactory {
        type Worker = MockWorker;

        fn construct(
            &self,
            index: usize,
            config: &RemoteWriteConfig,
        ) -> Result<MockWorker, RemoteError> {
            let name = config.display_name(index);
            if config.url.starts_with("invalid://") {
                return Err(RemoteError::client_construction(name, "malformed endpoint"));
            }
            let generation = config
                .url
                .trim_start_matches("mock://gen")
                .parse()
                .unwrap_or(0);
            self.constructed.fetch_add(1, Ordering::SeqCst);
            Ok(MockWorker {
                name,
                generation,
                index,
                state: WorkerState::Created,
                log: Arc::clone(&self.log),
                stops: Arc::clone(&self.stops),
            })
        }
    }

    fn config(urls: &[&str], external: &[(&str, &str)]) -> RemoteStorageConfig {
        RemoteStorageConfig {
            global: GlobalConfig {
                external_labels: external.iter().copied().collect(),
            },
            remote_write: urls.iter().map(|u| RemoteWriteConfig::new(*u)).collect(),
            ..Default::default()
        }
    }

    fn cpu(pairs: &[(&str, &str)]) -> Sample {
        Sample::new(Metric::new("cpu", pairs.iter().copied().collect()), 1.0, 1)
    }

    #[tokio::test]
    async fn test_unconfigured_storage_accepts_appends() {
        let storage = RemoteStorage::with_factory(MockFactory::new());
        storage.append(&cpu(&[("host", "a")])).await;

        assert_eq!(storage.worker_count().await, 0);
        assert!(storage.factory.log.lock().unwrap().is_empty());
        assert!(!storage.needs_throttling());
    }

    #[tokio::test]
    async fn test_apply_config_starts_every_worker() {
        let storage = RemoteStorage::with_factory(MockFactory::new());
        storage
            .apply_config(&config(&["mock://gen0", "mock://gen0", "mock://gen0"], &[]))
            .await
            .unwrap();

        let states = storage.worker_states().await;
        assert_eq!(states.len(), 3);
        assert!(states.iter().all(|(_, s)| *s == WorkerState::Running));
        assert_eq!(states[1].0, "remote-1");
    }

    #[tokio::test]
    async fn test_append_enriches_without_override() {
        let storage = RemoteStorage::with_factory(MockFactory::new());
        storage
            .apply_config(&config(&["mock://gen0", "mock://gen0"], &[("region", "us")]))
            .await
            .unwrap();

        storage.append(&cpu(&[("host", "a")])).await;
        storage.append(&cpu(&[("host", "a"), ("region", "eu")])).await;

        let log = storage.factory.log.lock().unwrap();
        assert_eq!(log.len(), 4);
        for (_, _, sample) in &log[..2] {
            assert_eq!(sample, &cpu(&[("host", "a"), ("region", "us")]));
        }
        for (_, _, sample) in &log[2..] {
            assert_eq!(sample, &cpu(&[("host", "a"), ("region", "eu")]));
        }
    }

    #[tokio::test]
    async fn test_reconfiguration_stops_old_workers() {
        let storage = RemoteStorage::with_factory(MockFactory::new());
        storage
            .apply_config(&config(&["mock://gen0", "mock://gen0"], &[("region", "us")]))
            .await
            .unwrap();
        storage
            .apply_config(&config(&["mock://gen1"], &[("region", "eu")]))
            .await
            .unwrap();

        assert_eq!(storage.factory.stops.load(Ordering::SeqCst), 2);
        assert_eq!(storage.worker_count().await, 1);
        assert_eq!(storage.external_labels().await.get("region"), Some("eu"));

        storage.append(&cpu(&[])).await;
        let log = storage.factory.log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, 1);
    }

    #[tokio::test]
    async fn test_failed_apply_leaves_workers_untouched() {
        let storage = RemoteStorage::with_factory(MockFactory::new());
        storage
            .apply_config(&config(&["mock://gen0", "mock://gen0"], &[("region", "us")]))
            .await
            .unwrap();

        let err = storage
            .apply_config(&config(&["mock://gen1", "invalid://x"], &[("region", "eu")]))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::ClientConstruction { ref name, .. } if name == "remote-1"));

        assert_eq!(storage.factory.stops.load(Ordering::SeqCst), 0);
        assert_eq!(storage.factory.constructed.load(Ordering::SeqCst), 3);
        let states = storage.worker_states().await;
        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|(_, s)| *s == WorkerState::Running));
        assert_eq!(storage.external_labels().await.get("region"), Some("us"));

        storage.append(&cpu(&[])).await;
        let log = storage.factory.log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|(generation, _, _)| *generation == 0));
    }

    #[tokio::test]
    async fn test_apply_empty_config_removes_all_workers() {
        let storage = RemoteStorage::with_factory(MockFactory::new());
        storage
            .apply_config(&config(&["mock://gen0"], &[]))
            .await
            .unwrap();
        storage.apply_config(&config(&[], &[])).await.unwrap();

        assert_eq!(storage.worker_count().await, 0);
        assert_eq!(storage.factory.stops.load(Ordering::SeqCst), 1);
        assert!(!storage.needs_throttling());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_keeps_workers() {
        let storage = RemoteStorage::with_factory(MockFactory::new());
        storage
            .apply_config(&config(&["mock://gen0", "mock://gen0"], &[]))
            .await
            .unwrap();

        storage.stop().await;
        storage.stop().await;

        assert_eq!(storage.factory.stops.load(Ordering::SeqCst), 2);
        let states = storage.worker_states().await;
        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|(_, s)| *s == WorkerState::Stopped));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_never_see_mixed_generations() {
        let storage = Arc::new(RemoteStorage::with_factory(MockFactory::new()));
        storage
            .apply_config(&config(&["mock://gen0", "mock://gen0"], &[]))
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for t in 0..4 {
            let storage = Arc::clone(&storage);
            tasks.push(tokio::spawn(async move {
                for i in 0..200 {
                    let seq = format!("{t}-{i}");
                    storage.append(&cpu(&[("seq", seq.as_str())])).await;
                    tokio::task::yield_now().await;
                }
            }));
        }

        tokio::task::yield_now().await;
        storage
            .apply_config(&config(&["mock://gen1", "mock://gen1"], &[]))
            .await
            .unwrap();

        for task in tasks {
            task.await.unwrap();
        }

        let log = storage.factory.log.lock().unwrap();
        let mut by_seq: std::collections::HashMap<String, Vec<(usize, usize)>> =
            std::collections::HashMap::new();
        for (generation, index, sample) in log.iter() {
            let seq = sample.metric.labels.get("seq").unwrap().to_string();
            by_seq.entry(seq).or_default().push((*generation, *index));
        }

        assert_eq!(by_seq.len(), 800);
        for deliveries in by_seq.values() {
            assert_eq!(deliveries.len(), 2);
            assert_eq!(deliveries[0].0, deliveries[1].0);
            assert_ne!(deliveries[0].1, deliveries[1].1);
        }
    }
}
