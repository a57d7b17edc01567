//! LogSink - logs record summaries via tracing

use async_trait::async_trait;
use contracts::{CollectorError, Record, RecordSink};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_record_summary(&self, record: &Record) {
        info!(
            sink = %self.name,
            record = %record.name,
            device = %record.device_name,
            device_type = %record.device_type,
            timestamp = record.timestamp,
            points = record.data.len(),
            parsed = record.parsed.len(),
            "Record committed"
        );
    }
}

#[async_trait]
impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self) -> bool {
        // nothing to reach
        true
    }

    #[instrument(
        name = "log_sink_commit",
        skip(self, batch),
        fields(sink = %self.name, records = batch.len())
    )]
    async fn commit(&self, batch: &[Record]) -> Result<(), CollectorError> {
        for record in batch {
            self.log_record_summary(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MetaMap;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_sink_commit() {
        let sink = LogSink::new("test_log");
        let mut meta = MetaMap::new();
        meta.insert("name".into(), json!("meter"));
        let record = Record::from_meta(&meta);

        assert!(sink.validate().await);
        assert!(sink.commit(&[record]).await.is_ok());
    }

    #[test]
    fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
