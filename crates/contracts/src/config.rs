//! RemoteStorageConfig - Config Loader output
//!
//! Describes the global external labels and every remote write destination.

use serde::{Deserialize, Serialize};

use crate::{LabelSet, RelabelConfig};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete remote storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteStorageConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Process-wide settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Remote write destinations, in configuration order
    #[serde(default)]
    pub remote_write: Vec<RemoteWriteConfig>,
}

/// Process-wide settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Labels attached to every outgoing sample unless already present
    #[serde(default)]
    pub external_labels: LabelSet,
}

/// One remote write destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteWriteConfig {
    /// Destination name (defaults to `remote-<index>`)
    #[serde(default)]
    pub name: Option<String>,

    /// Endpoint URL; the scheme selects the delivery client
    pub url: String,

    /// Queue tuning
    #[serde(default)]
    pub queue: QueueConfig,

    /// Relabeling applied to samples before they are queued
    #[serde(default)]
    pub write_relabel_configs: Vec<RelabelConfig>,
}

impl RemoteWriteConfig {
    /// Destination with default queue settings and no relabeling
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            url: url.into(),
            queue: QueueConfig::default(),
            write_relabel_configs: Vec::new(),
        }
    }

    /// Set an explicit destination name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Effective name for the destination at `index`
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("remote-{index}"))
    }
}

/// Per-destination queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Bounded queue capacity; samples beyond it are dropped
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Maximum samples per client send
    #[serde(default = "default_max_samples_per_send")]
    pub max_samples_per_send: usize,

    /// Maximum time a partial batch waits before being sent
    #[serde(default = "default_batch_send_deadline_ms")]
    pub batch_send_deadline_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_samples_per_send: default_max_samples_per_send(),
            batch_send_deadline_ms: default_batch_send_deadline_ms(),
        }
    }
}

fn default_capacity() -> usize {
    100 * 1024
}

fn default_max_samples_per_send() -> usize {
    100
}

fn default_batch_send_deadline_ms() -> u64 {
    5_000
}
