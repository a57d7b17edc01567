//! Pipeline orchestrator - wires configuration into a running engine.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::CollectorBlueprint;
use engine::Engine;
use tokio::sync::watch;
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The collector blueprint configuration
    pub blueprint: CollectorBlueprint,

    /// Stop after this long (None = run until signalled)
    pub duration: Option<Duration>,

    /// Event channel capacity override
    pub channel_capacity: Option<usize>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the collector until shutdown, the configured duration, or an error.
    ///
    /// `shutdown` is the external stop signal; the pipeline forwards it (or
    /// the duration expiry) to the engine so the queue flushes before return.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let duration = self.config.duration;
        let mut blueprint = self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        if let Some(capacity) = self.config.channel_capacity {
            info!(capacity, "Overriding event channel capacity from CLI");
            blueprint.engine.channel_capacity = capacity;
        }

        let active_devices = blueprint.devices.len();
        let active_sinks = blueprint.sinks.len();

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - batches will be discarded");
        }

        info!(
            devices = active_devices,
            sinks = active_sinks,
            queue_capacity = blueprint.queue_capacity(),
            "Building engine"
        );

        let engine = Engine::from_blueprint(&blueprint).context("Failed to build engine")?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let engine_task = engine.spawn(stop_rx);

        info!(duration = ?duration, "Collector running");

        // Wait for the external signal or the duration limit, whichever first
        let external = async {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
        };

        match duration {
            Some(limit) => {
                tokio::select! {
                    _ = external => info!("Shutdown signal received"),
                    _ = tokio::time::sleep(limit) => {
                        info!(limit_secs = limit.as_secs(), "Duration limit reached");
                    }
                }
            }
            None => {
                external.await;
                info!("Shutdown signal received");
            }
        }

        // Flip the engine's stop signal; run() flushes the queue and joins
        // every in-flight commit before returning.
        let _ = stop_tx.send(true);
        let summary = engine_task.await.context("Engine task failed")?;

        let stats = PipelineStats {
            duration: start_time.elapsed(),
            active_devices,
            active_sinks,
            summary,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            records_per_sec = format!("{:.2}", stats.records_per_sec()),
            "Collector shutdown complete"
        );

        Ok(stats)
    }
}
