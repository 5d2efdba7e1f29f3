//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{InputSource, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let remote = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        destinations = remote.remote_write.len(),
        external_labels = %remote.global.external_labels,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&remote);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        config_path: args.config.clone(),
        remote,
        input: InputSource::from_arg(&args.input),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        samples_appended = stats.samples_appended,
        parse_errors = stats.parse_errors,
        reloads = stats.reloads_applied,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(remote: &contracts::RemoteStorageConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("External labels: {}", remote.global.external_labels);
    println!("\nRemote write ({}):", remote.remote_write.len());
    for (idx, rw) in remote.remote_write.iter().enumerate() {
        println!(
            "  - {} -> {} ({} relabel rules, capacity {})",
            rw.display_name(idx),
            rw.url,
            rw.write_relabel_configs.len(),
            rw.queue.capacity
        );
    }
    println!();
}
