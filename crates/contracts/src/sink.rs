//! RecordSink trait - engine output interface
//!
//! A sink is a long-lived handle to an output store. Each sink applies its
//! own delivery policy (dedup window, TTL sweep) behind `commit`; policy
//! state is private to the sink and must tolerate concurrent access, since
//! batch commits are dispatched as independent tasks.

use async_trait::async_trait;

use crate::{CollectorError, Record};

/// Record output trait, implemented by all sink variants.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Lazy connectivity check; `false` excludes the sink at startup.
    ///
    /// Never returns an error: an unreachable store is a configuration
    /// warning, not a crash.
    async fn validate(&self) -> bool;

    /// Deliver a drained batch, applying the sink's delivery policy per record.
    ///
    /// # Errors
    /// A failed commit is fatal to this commit attempt only; the engine never
    /// retries the batch.
    async fn commit(&self, batch: &[Record]) -> Result<(), CollectorError>;
}
