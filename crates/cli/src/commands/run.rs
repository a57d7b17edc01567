//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_collector(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        devices = blueprint.devices.len(),
        sinks = blueprint.sinks.len(),
        queue_capacity = blueprint.queue_capacity(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        duration: if args.duration == 0 {
            None
        } else {
            Some(Duration::from_secs(args.duration))
        },
        channel_capacity: args.channel_capacity,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler: first signal drains, second forces exit
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        warn!("Received shutdown signal, draining collector...");
        let _ = shutdown_tx.send(true);

        wait_for_signal().await;
        warn!("Second shutdown signal, exiting immediately");
        std::process::exit(1);
    });

    info!("Starting collector...");

    let stats = pipeline
        .run(shutdown_rx)
        .await
        .context("Collector execution failed")?;

    info!(
        batches = stats.summary.total_batches,
        records = stats.summary.total_records,
        duration_secs = stats.duration.as_secs_f64(),
        records_per_sec = format!("{:.2}", stats.records_per_sec()),
        "Collector completed successfully"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("Gridpoll finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::CollectorBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Devices ({}):", blueprint.devices.len());
    for device in &blueprint.devices {
        println!(
            "  - {} (every {}s)",
            device.name, device.scheduler.delay_secs
        );
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {}", sink.name());
        }
    }

    println!("\nEngine:");
    println!("  Queue capacity: {}", blueprint.queue_capacity());
    println!(
        "  Channel capacity: {}",
        blueprint.engine.channel_capacity
    );

    println!();
}
