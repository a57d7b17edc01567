//! Engine - event loop routing triggers, payloads, and commits

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{CollectorBlueprint, Event, Requester, RequesterType};
use observability::{MetricsSummary, PipelineMetricsAggregator};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};
use translation::{translator_for, Translator};

use crate::error::EngineError;
use crate::handle::SinkHandle;
use crate::metrics::EngineMetrics;
use crate::queue::RecordQueue;
use crate::sinks::build_sink;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    /// Built, not yet running
    Idle,
    /// Routing events
    Running,
    /// Shutdown requested, flushing the queue
    Draining,
    /// Done
    Stopped,
}

/// One registered device: its requester and schedule delay.
struct DeviceEntry {
    requester: Arc<dyn Requester>,
    delay_secs: f64,
}

/// The collector engine.
///
/// Owns the record queue and routes every state change through one event
/// channel; device I/O and sink commits run as detached tasks so the routing
/// loop itself never blocks on the outside world.
pub struct Engine {
    devices: HashMap<String, DeviceEntry>,
    /// Translator per payload dialect, created on first use
    translators: HashMap<RequesterType, Box<dyn Translator>>,
    queue: RecordQueue,
    handles: Vec<SinkHandle>,
    channel_capacity: usize,
    metrics: Arc<EngineMetrics>,
    /// In-memory aggregate, reported when the run ends
    stats: PipelineMetricsAggregator,
    state: EngineState,
}

impl Engine {
    /// Build an engine from a validated blueprint.
    ///
    /// Must be called within a tokio runtime (TTL sinks spawn their sweep).
    ///
    /// Sink construction never fails; sinks with unusable paths are
    /// excluded later by the startup validation in [`Engine::run`].
    ///
    /// # Errors
    /// - Requester construction failure
    #[instrument(
        name = "engine_from_blueprint",
        skip(blueprint),
        fields(devices = blueprint.devices.len(), sinks = blueprint.sinks.len())
    )]
    pub fn from_blueprint(blueprint: &CollectorBlueprint) -> Result<Self, EngineError> {
        let mut devices = HashMap::with_capacity(blueprint.devices.len());
        for device in &blueprint.devices {
            let requester = requesters::build_requester(device)
                .map_err(|e| EngineError::requester_creation(&device.name, e.to_string()))?;
            devices.insert(
                device.name.clone(),
                DeviceEntry {
                    requester,
                    delay_secs: device.scheduler.delay_secs,
                },
            );
        }

        let mut handles = Vec::with_capacity(blueprint.sinks.len());
        for spec in &blueprint.sinks {
            handles.push(SinkHandle::new(build_sink(spec)));
        }

        Ok(Self::assemble(
            devices,
            handles,
            blueprint.queue_capacity(),
            blueprint.engine.channel_capacity,
        ))
    }

    /// Build an engine from already-constructed parts (for testing).
    pub fn with_parts(
        devices: Vec<(String, f64, Arc<dyn Requester>)>,
        handles: Vec<SinkHandle>,
        queue_capacity: usize,
        channel_capacity: usize,
    ) -> Self {
        let devices = devices
            .into_iter()
            .map(|(name, delay_secs, requester)| {
                (
                    name,
                    DeviceEntry {
                        requester,
                        delay_secs,
                    },
                )
            })
            .collect();
        Self::assemble(devices, handles, queue_capacity, channel_capacity)
    }

    fn assemble(
        devices: HashMap<String, DeviceEntry>,
        handles: Vec<SinkHandle>,
        queue_capacity: usize,
        channel_capacity: usize,
    ) -> Self {
        Self {
            devices,
            translators: HashMap::new(),
            queue: RecordQueue::new(queue_capacity),
            handles,
            channel_capacity: channel_capacity.max(1),
            metrics: Arc::new(EngineMetrics::new()),
            stats: PipelineMetricsAggregator::new(),
            state: EngineState::Idle,
        }
    }

    /// Pipeline metrics
    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the engine until `shutdown` flips to `true`.
    ///
    /// Startup drops sinks that fail their connectivity check. Shutdown
    /// flushes the queue as a final batch and waits for every in-flight
    /// commit before returning the run's metrics summary.
    #[instrument(name = "engine_run", skip(self, shutdown))]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> MetricsSummary {
        self.validate_sinks().await;

        let (events_tx, mut events_rx) = mpsc::channel(self.channel_capacity);
        let scheduler_handles = self.spawn_schedulers(&events_tx, &shutdown);

        self.state = EngineState::Running;
        info!(
            devices = self.devices.len(),
            sinks = self.handles.len(),
            queue_capacity = self.queue.capacity(),
            "Engine started"
        );

        loop {
            tokio::select! {
                event = events_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event, &events_tx),
                        None => break,
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.state = EngineState::Draining;
        info!(queued = self.queue.len(), "Engine draining");

        for handle in scheduler_handles {
            handle.abort();
        }

        if !self.queue.is_empty() {
            let batch = self.queue.drain();
            self.dispatch(batch, &events_tx);
        }
        drop(events_tx);

        // in-flight fetch and commit tasks hold the remaining senders; the
        // channel closes once they all finish, so this drain also counts the
        // final batch's completions
        while let Some(event) = events_rx.recv().await {
            if let Event::CommitFinished {
                sink,
                success,
                records,
            } = event
            {
                self.reap_sink(&sink, success, records);
            }
        }

        for handle in self.handles.drain(..) {
            handle.shutdown().await;
        }

        self.state = EngineState::Stopped;
        self.stats.total_fetch_failures = self.metrics.fetch_failures();
        info!(
            enqueued = self.metrics.records_enqueued(),
            invalid = self.metrics.records_invalid(),
            batches = self.metrics.batches_dispatched(),
            fetch_failures = self.metrics.fetch_failures(),
            "Engine stopped"
        );
        self.stats.summary()
    }

    /// Spawn the engine as a background task
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<MetricsSummary> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Drop sinks whose startup check fails; they stay out for the whole run.
    async fn validate_sinks(&mut self) {
        let mut valid = Vec::with_capacity(self.handles.len());
        for handle in self.handles.drain(..) {
            if handle.validate().await {
                valid.push(handle);
            } else {
                warn!(sink = %handle.name(), "sink failed validation, excluded");
            }
        }

        if valid.is_empty() {
            warn!("no valid sinks, batches will be discarded");
        }
        self.handles = valid;
    }

    fn spawn_schedulers(
        &self,
        events_tx: &mpsc::Sender<Event>,
        shutdown: &watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        self.devices
            .iter()
            .map(|(name, entry)| {
                scheduler::IntervalScheduler::new(name.clone(), entry.delay_secs)
                    .spawn(events_tx.clone(), shutdown.clone())
            })
            .collect()
    }

    fn handle_event(&mut self, event: Event, events_tx: &mpsc::Sender<Event>) {
        trace!(kind = event.kind(), "event received");
        match event {
            Event::Triggered { device } => self.handle_trigger(device, events_tx),
            Event::Payload {
                device,
                requester_type,
                raw,
                meta,
            } => self.handle_payload(&device, requester_type, &raw, &meta, events_tx),
            Event::CommitFinished {
                sink,
                success,
                records,
            } => self.reap_sink(&sink, success, records),
        }
    }

    /// Poll the device as a detached task; the payload comes back as an event.
    fn handle_trigger(&self, device: String, events_tx: &mpsc::Sender<Event>) {
        let Some(entry) = self.devices.get(&device) else {
            warn!(device = %device, "trigger for unregistered device");
            return;
        };

        let requester = Arc::clone(&entry.requester);
        let events = events_tx.clone();
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            match requester.fetch().await {
                Ok(raw) => {
                    observability::record_poll(&device, true);
                    let event = Event::Payload {
                        device,
                        requester_type: requester.requester_type(),
                        raw,
                        meta: requester.meta().clone(),
                    };
                    let _ = events.send(event).await;
                }
                Err(e) => {
                    metrics.inc_fetch_failures();
                    observability::record_poll(&device, false);
                    warn!(device = %device, error = %e, "poll failed");
                }
            }
        });
    }

    fn handle_payload(
        &mut self,
        device: &str,
        requester_type: RequesterType,
        raw: &str,
        meta: &contracts::MetaMap,
        events_tx: &mpsc::Sender<Event>,
    ) {
        let translator = self
            .translators
            .entry(requester_type)
            .or_insert_with(|| translator_for(requester_type));

        let records = translator.translate(raw, meta);
        observability::record_records_translated(device, records.len());

        for record in records {
            if !record.is_valid() {
                self.metrics.inc_records_invalid();
                warn!(device = %device, record = %record.name, "record failed validation, dropped");
                continue;
            }

            self.metrics.inc_records_enqueued();
            if let Some(batch) = self.queue.push(record) {
                self.dispatch(batch, events_tx);
            }
        }
        observability::record_queue_depth(self.queue.len());
    }

    /// Fan one immutable batch out to every sink as independent commit tasks.
    fn dispatch(&mut self, batch: Arc<[contracts::Record]>, events_tx: &mpsc::Sender<Event>) {
        self.metrics.inc_batches_dispatched();
        self.stats.update_batch(batch.len());
        observability::record_batch_dispatched(batch.len());
        debug!(records = batch.len(), sinks = self.handles.len(), "batch dispatched");

        for handle in &mut self.handles {
            handle.commit(Arc::clone(&batch), events_tx.clone());
        }
    }

    fn reap_sink(&mut self, sink: &str, success: bool, records: usize) {
        self.stats.update_commit(sink, success, records);
        if let Some(handle) = self.handles.iter_mut().find(|h| h.name() == sink) {
            handle.reap();
        }
    }
}
