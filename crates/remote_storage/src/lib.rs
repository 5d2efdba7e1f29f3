//! # Remote Storage
//!
//! Remote write fan-out module.
//!
//! Responsibilities:
//! - Fan out every appended `Sample` to all configured remote write queues
//! - Overlay external labels without overriding sample labels
//! - Swap queues and external labels atomically on reconfiguration
//! - Isolate slow destinations: queues drop samples, ingestion never waits

pub mod clients;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod relabel;
pub mod storage;
pub mod worker;

pub use contracts::{RemoteClient, RemoteStorageConfig, Sample};
pub use clients::{Client, FileClient, LogClient, UdpClient};
pub use error::RemoteError;
pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use queue::{QueueManager, QueueManagerFactory};
pub use relabel::Relabeler;
pub use storage::RemoteStorage;
pub use worker::{QueueWorker, WorkerFactory, WorkerState};
