//! Event - the engine's single routing currency
//!
//! Every engine state change arrives as an `Event` on one bounded channel:
//! scheduler ticks, fetched payloads, and commit-task completions. Routing
//! over one channel keeps queue mutation single-threaded; only the I/O
//! (fetch, commit) runs as detached tasks.

use crate::{MetaMap, RequesterType};

/// Engine input event.
#[derive(Debug, Clone)]
pub enum Event {
    /// A device's schedule fired; the engine should poll it
    Triggered {
        /// Configured device name
        device: String,
    },

    /// A poll completed; the raw payload is ready for translation
    Payload {
        /// Configured device name
        device: String,
        /// Payload dialect, keys the translator instance
        requester_type: RequesterType,
        /// Raw payload text as fetched
        raw: String,
        /// Metadata configured for the device
        meta: MetaMap,
    },

    /// A detached commit task finished (successfully or not)
    CommitFinished {
        /// Sink the commit belonged to
        sink: String,
        /// Whether the commit succeeded
        success: bool,
        /// Records in the committed batch
        records: usize,
    },
}

impl Event {
    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Triggered { .. } => "triggered",
            Self::Payload { .. } => "payload",
            Self::CommitFinished { .. } => "commit_finished",
        }
    }
}
