//! SinkHandle - one sink plus its in-flight commit tasks

use std::sync::Arc;

use contracts::{Event, Record, RecordSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::metrics::SinkMetrics;

/// Handle to a sink and the commit tasks dispatched to it.
///
/// Every drained batch becomes one detached task per sink, so a slow store
/// delays neither the engine loop nor the other sinks. Finished tasks are
/// reaped when their completion event comes back through the engine.
pub struct SinkHandle {
    sink: Arc<dyn RecordSink>,
    metrics: Arc<SinkMetrics>,
    tasks: Vec<JoinHandle<()>>,
}

impl SinkHandle {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self {
            sink,
            metrics: Arc::new(SinkMetrics::new()),
            tasks: Vec::new(),
        }
    }

    /// Sink name
    pub fn name(&self) -> &str {
        self.sink.name()
    }

    /// Current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Run the sink's startup connectivity check.
    pub async fn validate(&self) -> bool {
        self.sink.validate().await
    }

    /// Commit tasks still in flight.
    pub fn inflight(&self) -> usize {
        self.tasks.len()
    }

    /// Dispatch one batch as a detached commit task.
    ///
    /// Completion is reported back on `events` as `Event::CommitFinished`;
    /// a failed commit is logged and counted, never retried.
    pub fn commit(&mut self, batch: Arc<[Record]>, events: mpsc::Sender<Event>) {
        let sink = Arc::clone(&self.sink);
        let metrics = Arc::clone(&self.metrics);
        let name = self.sink.name().to_string();

        let task = tokio::spawn(async move {
            let success = match sink.commit(&batch).await {
                Ok(()) => {
                    metrics.inc_commit_count();
                    true
                }
                Err(e) => {
                    metrics.inc_failure_count();
                    error!(sink = %name, records = batch.len(), error = %e, "Commit failed");
                    false
                }
            };
            observability::record_commit(&name, success, batch.len());

            // the engine may already be gone during shutdown
            let _ = events
                .send(Event::CommitFinished {
                    sink: name,
                    success,
                    records: batch.len(),
                })
                .await;
        });

        self.tasks.push(task);
        self.metrics.set_inflight(self.tasks.len());
    }

    /// Drop handles of finished commit tasks.
    pub fn reap(&mut self) {
        self.tasks.retain(|task| !task.is_finished());
        self.metrics.set_inflight(self.tasks.len());
    }

    /// Wait for every in-flight commit to finish.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.sink.name()))]
    pub async fn shutdown(mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(sink = %self.sink.name(), error = ?e, "Commit task panicked");
            }
        }
        self.metrics.set_inflight(0);
        debug!(sink = %self.sink.name(), "SinkHandle shutdown complete");
    }
}
