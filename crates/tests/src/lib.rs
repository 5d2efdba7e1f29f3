//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 真实 QueueManager + file:// 目的地的 e2e 测试
//! - 配置加载到热重载的完整流程

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, LabelSet, Metric, RemoteStorageConfig, Sample};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = ConfigVersion::V1;
        assert!(RemoteStorageConfig::default().remote_write.is_empty());
    }

    #[test]
    fn test_sample_wire_shape() {
        // 输入 / file:// 输出共用的 JSON 行格式
        let labels: LabelSet = [("host", "a")].into_iter().collect();
        let sample = Sample::new(Metric::new("cpu", labels), 0.5, 1_000);
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["metric"]["name"], "cpu");
        assert_eq!(json["metric"]["labels"]["host"], "a");
        assert_eq!(json["value"], 0.5);
        assert_eq!(json["timestamp_ms"], 1_000);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::{Path, PathBuf};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{LabelSet, Metric, RemoteStorageConfig, RemoteWriteConfig, Sample};
    use remote_storage::{RemoteStorage, WorkerState};

    fn labels(pairs: &[(&str, &str)]) -> LabelSet {
        pairs.iter().copied().collect()
    }

    fn sample(name: &str, pairs: &[(&str, &str)]) -> Sample {
        Sample::new(Metric::new(name, labels(pairs)), 1.0, 1_000)
    }

    fn file_destination(path: &Path) -> RemoteWriteConfig {
        let mut rw = RemoteWriteConfig::new(format!("file://{}", path.display()));
        rw.queue.batch_send_deadline_ms = 10;
        rw
    }

    fn read_samples(path: &PathBuf) -> Vec<Sample> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// External labels are attached, but never override a label the sample already has
    #[tokio::test]
    async fn test_e2e_external_label_enrichment() {
        let dir = tempfile::tempdir().unwrap();
        let out_a = dir.path().join("a.jsonl");
        let out_b = dir.path().join("b.jsonl");

        let config = RemoteStorageConfig {
            global: contracts::GlobalConfig {
                external_labels: labels(&[("region", "us")]),
            },
            remote_write: vec![file_destination(&out_a), file_destination(&out_b)],
            ..Default::default()
        };

        let storage = RemoteStorage::new();
        storage.apply_config(&config).await.unwrap();

        storage.append(&sample("cpu", &[("host", "a")])).await;
        storage.append(&sample("cpu", &[("region", "eu")])).await;
        storage.stop().await;

        for out in [&out_a, &out_b] {
            let written = read_samples(out);
            assert_eq!(written.len(), 2);
            assert_eq!(
                written[0].metric.labels,
                labels(&[("host", "a"), ("region", "us")])
            );
            assert_eq!(written[1].metric.labels, labels(&[("region", "eu")]));
        }

        let metrics = storage.queue_metrics().await;
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|(_, m)| m.sent_count == 2));
    }

    /// A rejected configuration leaves the previous queues delivering
    #[tokio::test]
    async fn test_e2e_failed_apply_keeps_old_queues() {
        let dir = tempfile::tempdir().unwrap();
        let old_out = dir.path().join("old.jsonl");
        let new_out = dir.path().join("new.jsonl");

        let storage = RemoteStorage::new();
        let old = RemoteStorageConfig {
            global: contracts::GlobalConfig {
                external_labels: labels(&[("replica", "1")]),
            },
            remote_write: vec![file_destination(&old_out)],
            ..Default::default()
        };
        storage.apply_config(&old).await.unwrap();

        let broken = RemoteStorageConfig {
            global: contracts::GlobalConfig {
                external_labels: labels(&[("replica", "2")]),
            },
            remote_write: vec![
                file_destination(&new_out),
                RemoteWriteConfig::new("bogus://nowhere"),
            ],
            ..Default::default()
        };
        assert!(storage.apply_config(&broken).await.is_err());

        assert_eq!(storage.worker_count().await, 1);
        assert_eq!(storage.external_labels().await, labels(&[("replica", "1")]));

        storage.append(&sample("up", &[])).await;
        storage.stop().await;

        let written = read_samples(&old_out);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].metric.labels.get("replica"), Some("1"));
        assert!(read_samples(&new_out).is_empty());
    }

    /// Reconfiguring moves traffic to the new destinations and stops the old ones
    #[tokio::test]
    async fn test_e2e_reconfigure_switches_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.jsonl");
        let second = dir.path().join("second.jsonl");

        let storage = RemoteStorage::new();
        storage
            .apply_config(&RemoteStorageConfig {
                remote_write: vec![file_destination(&first)],
                ..Default::default()
            })
            .await
            .unwrap();
        storage.append(&sample("a", &[])).await;

        storage
            .apply_config(&RemoteStorageConfig {
                remote_write: vec![file_destination(&second).with_name("second")],
                ..Default::default()
            })
            .await
            .unwrap();
        storage.append(&sample("b", &[])).await;
        storage.stop().await;

        // The old queue drained before the swap
        let first_written = read_samples(&first);
        assert_eq!(first_written.len(), 1);
        assert_eq!(first_written[0].metric.name, "a");

        let second_written = read_samples(&second);
        assert_eq!(second_written.len(), 1);
        assert_eq!(second_written[0].metric.name, "b");

        let states = storage.worker_states().await;
        assert_eq!(states, vec![("second".to_string(), WorkerState::Stopped)]);
    }

    /// TOML on disk through the loader, including per-destination relabeling
    #[tokio::test]
    async fn test_e2e_config_loader_to_storage() {
        let dir = tempfile::tempdir().unwrap();
        let all_out = dir.path().join("all.jsonl");
        let filtered_out = dir.path().join("filtered.jsonl");

        let toml = format!(
            r#"
[global.external_labels]
cluster = "prod"

[[remote_write]]
name = "all"
url = "file://{all}"

[remote_write.queue]
batch_send_deadline_ms = 10

[[remote_write]]
name = "filtered"
url = "file://{filtered}"

[remote_write.queue]
batch_send_deadline_ms = 10

[[remote_write.write_relabel_configs]]
source_labels = ["__name__"]
regex = "go_.*"
action = "drop"
"#,
            all = all_out.display(),
            filtered = filtered_out.display(),
        );

        let config_path = dir.path().join("remote.toml");
        std::fs::write(&config_path, &toml).unwrap();
        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        assert_eq!(config.remote_write.len(), 2);

        let storage = RemoteStorage::new();
        storage.apply_config(&config).await.unwrap();

        storage.append(&sample("go_goroutines", &[])).await;
        storage.append(&sample("http_requests_total", &[])).await;
        storage.stop().await;

        let all = read_samples(&all_out);
        assert_eq!(all.len(), 2);
        assert!(all
            .iter()
            .all(|s| s.metric.labels.get("cluster") == Some("prod")));

        let filtered = read_samples(&filtered_out);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].metric.name, "http_requests_total");

        let metrics = storage.queue_metrics().await;
        assert_eq!(metrics[1].0, "filtered");
        assert_eq!(metrics[1].1.relabel_dropped_count, 1);
    }

    /// A config the loader rejects never reaches the storage
    #[test]
    fn test_invalid_config_rejected_by_loader() {
        let result = ConfigLoader::load_from_str(
            r#"
[[remote_write]]
url = "log://a"

[[remote_write.write_relabel_configs]]
regex = "(unclosed"
action = "keep"
"#,
            ConfigFormat::Toml,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_throttling_never_requested() {
        let storage = RemoteStorage::new();
        assert!(!storage.needs_throttling());
        storage.stop().await;
        assert!(!storage.needs_throttling());
    }
}
