//! DocumentSink - one JSON document per accepted record, rate limited per name
//!
//! Applies a per-record-name dedup window: once a record name is accepted,
//! further records under the same name are silently dropped until
//! `entry_delay` seconds have passed. Records are stored as individual JSON
//! documents in the configured directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use contracts::{CollectorError, Record, RecordSink};
use tracing::{debug, instrument, warn};

use super::now_unix;

/// Sink writing deduplicated JSON documents.
pub struct DocumentSink {
    name: String,
    dir: PathBuf,
    entry_delay: i64,
    /// Record name -> unix seconds of the last accepted write
    last_accepted: Mutex<HashMap<String, i64>>,
}

impl DocumentSink {
    /// Create a document sink writing into `dir`.
    ///
    /// Construction never touches the filesystem; a bad path surfaces in
    /// `validate()` so the engine can exclude the sink instead of aborting.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, entry_delay: i64) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            entry_delay,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Commit a batch against an explicit clock, returns accepted count.
    ///
    /// Split out from the trait method so the dedup window is testable
    /// without waiting on wall time.
    pub fn commit_at(&self, batch: &[Record], now: i64) -> Result<usize, CollectorError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CollectorError::sink_write(&self.name, e.to_string()))?;
        let mut accepted = 0;

        for record in batch {
            if !self.accept_record(&record.name, now) {
                debug!(
                    sink = %self.name,
                    record = %record.name,
                    "within dedup window, dropping"
                );
                continue;
            }

            self.write_document(record)
                .map_err(|e| CollectorError::sink_write(&self.name, e.to_string()))?;
            accepted += 1;
        }

        debug!(sink = %self.name, total = batch.len(), accepted, "batch committed");
        Ok(accepted)
    }

    /// Dedup window check; an accepted record restarts its name's window.
    fn accept_record(&self, record_name: &str, now: i64) -> bool {
        // lock scope is the check alone, file IO happens outside
        let mut register = match self.last_accepted.lock() {
            Ok(register) => register,
            Err(poisoned) => poisoned.into_inner(),
        };

        match register.get(record_name) {
            Some(&last) if now - last < self.entry_delay => false,
            _ => {
                register.insert(record_name.to_string(), now);
                true
            }
        }
    }

    fn write_document(&self, record: &Record) -> std::io::Result<()> {
        let mut doc = serde_json::to_value(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // document stores reserve '$'-prefixed keys for operators
        if let Some(meta) = doc.get_mut("meta").and_then(|m| m.as_object_mut()) {
            let offending: Vec<String> = meta
                .keys()
                .filter(|k| k.starts_with('$'))
                .cloned()
                .collect();
            for key in offending {
                if let Some(value) = meta.remove(&key) {
                    meta.insert(key.replace('$', ""), value);
                }
            }
        }

        let path = self
            .dir
            .join(format!("{}-{}.json", record.name, record.timestamp));
        let file = fs::File::create(path)?;
        serde_json::to_writer(file, &doc)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Documents currently stored (test and ops helper).
    pub fn document_count(&self) -> std::io::Result<usize> {
        Ok(fs::read_dir(&self.dir)?.count())
    }

    fn dir_writable(dir: &Path) -> bool {
        fs::create_dir_all(dir).is_ok()
    }
}

#[async_trait]
impl RecordSink for DocumentSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self) -> bool {
        let ok = Self::dir_writable(&self.dir);
        if !ok {
            warn!(sink = %self.name, dir = %self.dir.display(), "store directory not writable");
        }
        ok
    }

    #[instrument(
        name = "document_sink_commit",
        skip(self, batch),
        fields(sink = %self.name, records = batch.len())
    )]
    async fn commit(&self, batch: &[Record]) -> Result<(), CollectorError> {
        self.commit_at(batch, now_unix())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MetaMap;
    use serde_json::json;

    fn record(name: &str, timestamp: i64) -> Record {
        let mut meta = MetaMap::new();
        meta.insert("name".into(), json!(name));
        meta.insert("ttl".into(), json!(300));
        meta.insert("$where".into(), json!("sneaky"));
        let mut record = Record::from_meta(&meta);
        record.device_name = "meter".into();
        record.timestamp = timestamp;
        record
    }

    fn sink(entry_delay: i64) -> (tempfile::TempDir, DocumentSink) {
        let dir = tempfile::tempdir().unwrap();
        let sink = DocumentSink::new("docs", dir.path().join("out"), entry_delay);
        (dir, sink)
    }

    #[test]
    fn test_dedup_window() {
        let (_dir, sink) = sink(100);
        let t0 = 1_000_000;

        // first write accepted, second inside the window dropped
        assert_eq!(sink.commit_at(&[record("m", t0)], t0).unwrap(), 1);
        assert_eq!(sink.commit_at(&[record("m", t0 + 50)], t0 + 50).unwrap(), 0);

        // window expired, accepted again
        assert_eq!(
            sink.commit_at(&[record("m", t0 + 100)], t0 + 100).unwrap(),
            1
        );
        assert_eq!(sink.document_count().unwrap(), 2);
    }

    #[test]
    fn test_window_is_per_record_name() {
        let (_dir, sink) = sink(100);
        let t0 = 1_000_000;

        let batch = [record("wind", t0), record("solar", t0)];
        assert_eq!(sink.commit_at(&batch, t0).unwrap(), 2);
    }

    #[test]
    fn test_dollar_keys_sanitized() {
        let (_dir, sink) = sink(0);
        let t0 = 1_000_000;
        sink.commit_at(&[record("m", t0)], t0).unwrap();

        let path = sink.dir.join(format!("m-{t0}.json"));
        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert!(doc["meta"].get("$where").is_none());
        assert_eq!(doc["meta"]["where"], json!("sneaky"));
    }

    #[tokio::test]
    async fn test_validate_checks_directory() {
        let (_dir, sink) = sink(600);
        assert!(sink.validate().await);
    }

    #[tokio::test]
    async fn test_unwritable_directory_fails_validate_not_construction() {
        // /proc rejects directory creation; construction must still succeed
        // so the engine can exclude the sink at startup
        let sink = DocumentSink::new("docs", "/proc/gridpoll/docs", 600);
        assert!(!sink.validate().await);
        assert!(sink.commit_at(&[record("m", 1_000_000)], 1_000_000).is_err());
    }
}
