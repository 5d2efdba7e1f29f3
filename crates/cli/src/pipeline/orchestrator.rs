//! Pipeline orchestrator - feeds input samples into the remote storage.
//!
//! Samples arrive as JSON lines on stdin or from a file. SIGHUP reloads the
//! configuration file and reapplies it without stopping ingestion.

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{RemoteStorageConfig, Sample};
use remote_storage::RemoteStorage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use super::PipelineStats;

/// Where input samples are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` selects stdin, anything else is a file path
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Configuration file re-read on SIGHUP
    pub config_path: PathBuf,

    /// Initially applied configuration
    pub remote: RemoteStorageConfig,

    /// Sample input
    pub input: InputSource,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    storage: RemoteStorage,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            storage: RemoteStorage::new(),
        }
    }

    /// Run until the input is exhausted or `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics(SocketAddr::from(([0, 0, 0, 0], port)))?;
            info!("Metrics endpoint available on port {}", port);
        }

        match &self.config.input {
            InputSource::Stdin => {
                info!("Reading samples from stdin");
                let reader = BufReader::new(tokio::io::stdin());
                self.run_with_reader(reader, shutdown).await
            }
            InputSource::File(path) => {
                info!(path = %path.display(), "Reading samples from file");
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open input {}", path.display()))?;
                self.run_with_reader(BufReader::new(file), shutdown).await
            }
        }
    }

    /// Apply the configuration, ingest `reader`, then stop every queue
    pub async fn run_with_reader<R>(
        &self,
        reader: R,
        shutdown: impl Future<Output = ()>,
    ) -> Result<PipelineStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let start_time = Instant::now();
        let mut stats = PipelineStats::default();

        self.storage
            .apply_config(&self.config.remote)
            .await
            .context("Failed to apply initial configuration")?;

        info!(
            queues = self.storage.worker_count().await,
            "Remote write queues started"
        );

        let ingest_result = self.ingest(reader, shutdown, &mut stats).await;

        // 无论输入是否出错，都要停掉所有队列，把缓冲的样本发出去
        info!("Stopping remote write queues...");
        self.storage.stop().await;

        stats.duration = start_time.elapsed();
        stats.queues = self.storage.queue_metrics().await;

        ingest_result?;
        Ok(stats)
    }

    async fn ingest<R>(
        &self,
        reader: R,
        shutdown: impl Future<Output = ()>,
        stats: &mut PipelineStats,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut reload = ReloadSignal::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping ingestion");
                    break;
                }
                _ = reload.recv() => {
                    self.reload(stats).await;
                }
                line = lines.next_line() => {
                    match line.context("Failed to read input")? {
                        Some(line) => self.process_line(&line, stats).await,
                        None => {
                            info!("Input exhausted");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse one JSON line and append it; malformed lines are counted and skipped
    async fn process_line(&self, line: &str, stats: &mut PipelineStats) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<Sample>(line) {
            Ok(sample) => {
                self.storage.append(&sample).await;
                stats.samples_appended += 1;
            }
            Err(e) => {
                stats.parse_errors += 1;
                warn!(error = %e, "Skipping malformed sample line");
            }
        }
    }

    /// Re-read the configuration file and apply it
    async fn reload(&self, stats: &mut PipelineStats) {
        info!(config = %self.config.config_path.display(), "Reloading configuration");

        let config = match config_loader::ConfigLoader::load_from_path(&self.config.config_path) {
            Ok(config) => config,
            Err(e) => {
                stats.reloads_failed += 1;
                error!(error = %e, "Reload failed, keeping current configuration");
                return;
            }
        };

        match self.storage.apply_config(&config).await {
            Ok(()) => {
                stats.reloads_applied += 1;
                info!(queues = config.remote_write.len(), "Configuration reloaded");
            }
            Err(e) => {
                stats.reloads_failed += 1;
                error!(error = %e, "Reload failed, keeping current configuration");
            }
        }
    }
}

/// SIGHUP listener; never fires where SIGHUP does not exist
struct ReloadSignal {
    #[cfg(unix)]
    inner: Option<tokio::signal::unix::Signal>,
}

impl ReloadSignal {
    fn new() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let inner = match signal(SignalKind::hangup()) {
                Ok(sig) => Some(sig),
                Err(e) => {
                    warn!(error = %e, "SIGHUP reload unavailable");
                    None
                }
            };
            Self { inner }
        }

        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        {
            let received = match self.inner.as_mut() {
                Some(sig) => sig.recv().await.is_some(),
                None => false,
            };
            if received {
                debug!("Received SIGHUP");
                return;
            }
            self.inner = None;
        }

        std::future::pending::<()>().await
    }
}
