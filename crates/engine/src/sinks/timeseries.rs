//! TimeseriesSink - append-only JSONL store with a TTL sweep
//!
//! Records append to a JSONL file; a background sweep removes records whose
//! `timestamp + ttl` has passed. The sweep runs on its own schedule and
//! stops when the sink is dropped.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use contracts::{CollectorError, Record, RecordSink};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::now_unix;

/// Sink appending records to a TTL-swept JSONL store.
pub struct TimeseriesSink {
    name: String,
    path: PathBuf,
    /// Serializes appends against sweep rewrites
    store_lock: Arc<Mutex<()>>,
    sweeper: JoinHandle<()>,
}

impl TimeseriesSink {
    /// Create a time-series sink storing at `path` and spawn its sweep.
    ///
    /// Must be called within a tokio runtime. Construction never touches
    /// the filesystem; a bad path surfaces in `validate()` so the engine
    /// can exclude the sink instead of aborting.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, clean_delay_secs: u64) -> Self {
        let name = name.into();
        let path = path.into();

        let store_lock = Arc::new(Mutex::new(()));
        let sweeper = Self::spawn_sweeper(
            name.clone(),
            path.clone(),
            Arc::clone(&store_lock),
            clean_delay_secs.max(1),
        );

        Self {
            name,
            path,
            store_lock,
            sweeper,
        }
    }

    fn spawn_sweeper(
        name: String,
        path: PathBuf,
        store_lock: Arc<Mutex<()>>,
        clean_delay_secs: u64,
    ) -> JoinHandle<()> {
        debug!(sink = %name, delay_secs = clean_delay_secs, "starting ttl sweep");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(clean_delay_secs));
            loop {
                ticker.tick().await;
                match clean_store(&path, &store_lock, now_unix()) {
                    Ok(0) => {}
                    Ok(deleted) => debug!(sink = %name, deleted, "expired records cleaned"),
                    Err(e) => warn!(sink = %name, error = %e, "ttl sweep failed"),
                }
            }
        })
    }

    /// Run one sweep against an explicit clock, returns deleted count.
    pub fn clean_once_at(&self, now: i64) -> std::io::Result<usize> {
        clean_store(&self.path, &self.store_lock, now)
    }

    /// Records currently stored (test and ops helper).
    pub fn stored_count(&self) -> std::io::Result<usize> {
        let _guard = lock(&self.store_lock);
        if !self.path.exists() {
            return Ok(0);
        }
        let file = fs::File::open(&self.path)?;
        Ok(std::io::BufReader::new(file).lines().count())
    }
}

#[async_trait]
impl RecordSink for TimeseriesSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self) -> bool {
        let writable = self
            .path
            .parent()
            .is_none_or(|parent| fs::create_dir_all(parent).is_ok());
        if !writable {
            warn!(sink = %self.name, path = %self.path.display(), "store path not writable");
        }
        writable
    }

    #[instrument(
        name = "timeseries_sink_commit",
        skip(self, batch),
        fields(sink = %self.name, records = batch.len())
    )]
    async fn commit(&self, batch: &[Record]) -> Result<(), CollectorError> {
        let _guard = lock(&self.store_lock);

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CollectorError::sink_write(&self.name, e.to_string()))?;

        for record in batch {
            let line = serde_json::to_string(record)
                .map_err(|e| CollectorError::sink_write(&self.name, e.to_string()))?;
            writeln!(file, "{line}")
                .map_err(|e| CollectorError::sink_write(&self.name, e.to_string()))?;
        }

        debug!(sink = %self.name, records = batch.len(), "batch appended");
        Ok(())
    }
}

impl Drop for TimeseriesSink {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

fn lock(store_lock: &Mutex<()>) -> std::sync::MutexGuard<'_, ()> {
    match store_lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Rewrite the store keeping only records that are still alive.
fn clean_store(path: &Path, store_lock: &Mutex<()>, now: i64) -> std::io::Result<usize> {
    let _guard = lock(store_lock);

    if !path.exists() {
        return Ok(0);
    }

    let content = fs::read_to_string(path)?;
    let mut kept = String::with_capacity(content.len());
    let mut deleted = 0;

    for line in content.lines() {
        match serde_json::from_str::<Record>(line) {
            Ok(record) if record.timestamp + record.ttl <= now => deleted += 1,
            Ok(_) => {
                kept.push_str(line);
                kept.push('\n');
            }
            Err(e) => {
                warn!(error = %e, "dropping unparsable store line");
                deleted += 1;
            }
        }
    }

    if deleted > 0 {
        fs::write(path, kept)?;
    }
    Ok(deleted)
}
