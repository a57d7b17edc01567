//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::MetricsSummary;

/// Statistics from a collector run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Number of devices that were polled
    pub active_devices: usize,

    /// Number of sinks that received batches
    pub active_sinks: usize,

    /// End-of-run metrics summary from the engine
    pub summary: MetricsSummary,
}

impl PipelineStats {
    /// Calculate committed records per second
    pub fn records_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.summary.total_records as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Collector Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Batches dispatched: {}", self.summary.total_batches);
        println!("   ├─ Records committed: {}", self.summary.total_records);
        println!("   ├─ Records/s: {:.2}", self.records_per_sec());
        println!("   ├─ Active devices: {}", self.active_devices);
        println!("   └─ Active sinks: {}", self.active_sinks);

        println!("\n📈 Pipeline Metrics");
        println!("   ├─ Failed polls: {}", self.summary.total_fetch_failures);
        println!(
            "   ├─ Failed commits: {} ({:.2}%)",
            self.summary.total_failures, self.summary.failure_rate
        );
        println!("   └─ Batch size: {}", self.summary.batch_size);

        if !self.summary.sink_commits.is_empty() {
            println!("\n📤 Sink Commits");
            for (sink, count) in &self.summary.sink_commits {
                println!("   ├─ {}: {}", sink, count);
            }
        }

        println!();
    }
}
