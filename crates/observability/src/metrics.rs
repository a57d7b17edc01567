//! Pipeline metrics collection
//!
//! Records collector activity against the global metrics recorder and keeps
//! an in-memory aggregate for end-of-run summaries.

use metrics::{counter, gauge, histogram};

/// Record a device poll attempt
pub fn record_poll(device: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "collector_polls_total",
        "device" => device.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record records produced by translating one payload
pub fn record_records_translated(device: &str, count: usize) {
    counter!(
        "collector_records_translated_total",
        "device" => device.to_string()
    )
    .increment(count as u64);
}

/// Record current record queue depth
pub fn record_queue_depth(depth: usize) {
    gauge!("collector_queue_depth").set(depth as f64);
}

/// Record a drained batch
pub fn record_batch_dispatched(records: usize) {
    counter!("collector_batches_total").increment(1);
    histogram!("collector_batch_size").record(records as f64);
}

/// Record a finished sink commit
pub fn record_commit(sink_name: &str, success: bool, records: usize) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "collector_commits_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        counter!(
            "collector_records_committed_total",
            "sink" => sink_name.to_string()
        )
        .increment(records as u64);
    }
}

/// Pipeline metrics aggregator
///
/// Aggregates metrics in memory for statistics and summary output.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetricsAggregator {
    /// Total batches dispatched
    pub total_batches: u64,

    /// Total records committed
    pub total_records: u64,

    /// Total failed commits
    pub total_failures: u64,

    /// Total failed polls
    pub total_fetch_failures: u64,

    /// Batch size statistics
    pub batch_stats: RunningStats,

    /// Per-sink commit counts
    pub sink_commits: std::collections::HashMap<String, u64>,
}

impl PipelineMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dispatched batch
    pub fn update_batch(&mut self, records: usize) {
        self.total_batches += 1;
        self.batch_stats.push(records as f64);
    }

    /// Record one finished commit
    pub fn update_commit(&mut self, sink_name: &str, success: bool, records: usize) {
        if success {
            self.total_records += records as u64;
            *self.sink_commits.entry(sink_name.to_string()).or_insert(0) += 1;
        } else {
            self.total_failures += 1;
        }
    }

    /// Record one failed poll
    pub fn update_fetch_failure(&mut self) {
        self.total_fetch_failures += 1;
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_batches: self.total_batches,
            total_records: self.total_records,
            total_failures: self.total_failures,
            total_fetch_failures: self.total_fetch_failures,
            failure_rate: if self.total_batches > 0 {
                self.total_failures as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_stats),
            sink_commits: self.sink_commits.clone(),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub total_records: u64,
    pub total_failures: u64,
    pub total_fetch_failures: u64,
    pub failure_rate: f64,
    pub batch_size: StatsSummary,
    pub sink_commits: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Collector Metrics Summary ===")?;
        writeln!(f, "Total batches: {}", self.total_batches)?;
        writeln!(f, "Total records committed: {}", self.total_records)?;
        writeln!(
            f,
            "Failed commits: {} ({:.2}%)",
            self.total_failures, self.failure_rate
        )?;
        writeln!(f, "Failed polls: {}", self.total_fetch_failures)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;

        if !self.sink_commits.is_empty() {
            writeln!(f, "Sink commit counts:")?;
            for (sink, count) in &self.sink_commits {
                writeln!(f, "  {}: {}", sink, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Push a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
