//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    destination_count: usize,
    external_label_count: usize,
    relabel_rule_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(remote) => {
            let warnings = collect_warnings(&remote);
            let relabel_rule_count = remote
                .remote_write
                .iter()
                .map(|rw| rw.write_relabel_configs.len())
                .sum();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", remote.version),
                    destination_count: remote.remote_write.len(),
                    external_label_count: remote.global.external_labels.len(),
                    relabel_rule_count,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(remote: &contracts::RemoteStorageConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if remote.remote_write.is_empty() {
        warnings.push("No remote_write destinations configured - samples will be discarded".to_string());
    }

    for (idx, rw) in remote.remote_write.iter().enumerate() {
        if rw.url.starts_with("log:") {
            warnings.push(format!(
                "Destination '{}' only logs batches and delivers nothing",
                rw.display_name(idx)
            ));
        }
        if rw.queue.max_samples_per_send > rw.queue.capacity {
            warnings.push(format!(
                "Destination '{}' has max_samples_per_send ({}) above queue capacity ({})",
                rw.display_name(idx),
                rw.queue.max_samples_per_send,
                rw.queue.capacity
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Destinations: {}", summary.destination_count);
            println!("  External labels: {}", summary.external_label_count);
            println!("  Relabel rules: {}", summary.relabel_rule_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
