//! Sink implementations
//!
//! Contains LogSink, DocumentSink, and TimeseriesSink.

mod document;
mod log;
mod timeseries;

pub use self::document::DocumentSink;
pub use self::log::LogSink;
pub use self::timeseries::TimeseriesSink;

use std::sync::Arc;

use contracts::{RecordSink, SinkSpec};
use tracing::instrument;

/// Create a sink from its blueprint spec.
///
/// Construction is infallible; path problems surface in the sink's
/// `validate()` and exclude it at engine startup.
#[instrument(name = "build_sink", skip(spec), fields(sink = %spec.name()))]
pub fn build_sink(spec: &SinkSpec) -> Arc<dyn RecordSink> {
    match spec {
        SinkSpec::Log { name } => Arc::new(LogSink::new(name)),
        SinkSpec::Document {
            name,
            path,
            entry_delay_secs,
        } => Arc::new(DocumentSink::new(name, path, *entry_delay_secs)),
        SinkSpec::Timeseries {
            name,
            path,
            clean_delay_secs,
        } => Arc::new(TimeseriesSink::new(name, path, *clean_delay_secs)),
    }
}

/// Wall-clock unix seconds, shared by the time-windowed sinks.
pub(crate) fn now_unix() -> i64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => 0,
    }
}
