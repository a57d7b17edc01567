//! # Engine
//!
//! Record pipeline module.
//!
//! Responsibilities:
//! - Route scheduler triggers, fetched payloads, and commit completions
//! - Buffer validated records in a bounded queue, drain to batches at capacity
//! - Fan batches out to sinks as independent commit tasks

pub mod engine;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod queue;
pub mod sinks;

pub use contracts::{Event, Record, RecordSink};
pub use engine::Engine;
pub use error::EngineError;
pub use handle::SinkHandle;
pub use metrics::{EngineMetrics, MetricsSnapshot, SinkMetrics};
pub use queue::RecordQueue;
pub use sinks::{build_sink, DocumentSink, LogSink, TimeseriesSink};
