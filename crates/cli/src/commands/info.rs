//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{LabelSet, RelabelConfig, RemoteStorageConfig};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    external_labels: LabelSet,
    destinations: Vec<DestinationInfo>,
}

#[derive(Serialize)]
struct DestinationInfo {
    name: String,
    url: String,
    scheme: String,
    capacity: usize,
    max_samples_per_send: usize,
    batch_send_deadline_ms: u64,
    relabel_rule_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    relabel_rules: Vec<RelabelConfig>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let remote = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&remote, args.relabel);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&remote, args.relabel);
    }

    Ok(())
}

fn build_config_info(remote: &RemoteStorageConfig, with_relabel: bool) -> ConfigInfo {
    let destinations = remote
        .remote_write
        .iter()
        .enumerate()
        .map(|(idx, rw)| DestinationInfo {
            name: rw.display_name(idx),
            url: rw.url.clone(),
            scheme: url_scheme(&rw.url).to_string(),
            capacity: rw.queue.capacity,
            max_samples_per_send: rw.queue.max_samples_per_send,
            batch_send_deadline_ms: rw.queue.batch_send_deadline_ms,
            relabel_rule_count: rw.write_relabel_configs.len(),
            relabel_rules: if with_relabel {
                rw.write_relabel_configs.clone()
            } else {
                Vec::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", remote.version),
        external_labels: remote.global.external_labels.clone(),
        destinations,
    }
}

fn url_scheme(url: &str) -> &str {
    url.split_once("://").map_or("unknown", |(scheme, _)| scheme)
}

fn print_config_info(remote: &RemoteStorageConfig, with_relabel: bool) {
    println!("\n=== Remote Write Configuration ===\n");
    println!("Version: {:?}", remote.version);

    println!("\n--- External Labels ---");
    if remote.global.external_labels.is_empty() {
        println!("  (none)");
    }
    for (name, value) in remote.global.external_labels.iter() {
        println!("  {} = {:?}", name, value);
    }

    println!("\n--- Destinations ({}) ---", remote.remote_write.len());
    for (idx, rw) in remote.remote_write.iter().enumerate() {
        println!("\n  [{}] {}", idx, rw.display_name(idx));
        println!("    URL: {}", rw.url);
        println!(
            "    Queue: capacity={}, max_samples_per_send={}, deadline={}ms",
            rw.queue.capacity, rw.queue.max_samples_per_send, rw.queue.batch_send_deadline_ms
        );
        println!("    Relabel rules: {}", rw.write_relabel_configs.len());

        if with_relabel {
            for rule in &rw.write_relabel_configs {
                println!(
                    "      - {:?} source={:?} regex={:?} target={:?} replacement={:?}",
                    rule.action, rule.source_labels, rule.regex, rule.target_label, rule.replacement
                );
            }
        }
    }

    println!();
}
