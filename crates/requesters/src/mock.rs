//! Mock requester.
//!
//! Replays a fixed payload instead of touching the network. Declares the
//! Obvius dialect so the normal translator path is exercised end to end.

use std::path::PathBuf;

use async_trait::async_trait;
use contracts::{CollectorError, MetaMap, Requester, RequesterType};
use tracing::trace;

/// Payload source for a [`MockRequester`].
enum MockPayload {
    Inline(String),
    Fixture(PathBuf),
}

/// Requester that replays a fixed payload.
pub struct MockRequester {
    payload: MockPayload,
    meta: MetaMap,
}

impl MockRequester {
    /// Replay an inline payload string.
    pub fn inline(payload: impl Into<String>, meta: MetaMap) -> Self {
        Self {
            payload: MockPayload::Inline(payload.into()),
            meta,
        }
    }

    /// Replay the contents of a fixture file, read on every fetch.
    pub fn fixture(path: impl Into<PathBuf>, meta: MetaMap) -> Self {
        Self {
            payload: MockPayload::Fixture(path.into()),
            meta,
        }
    }
}

#[async_trait]
impl Requester for MockRequester {
    fn requester_type(&self) -> RequesterType {
        RequesterType::Obvius
    }

    fn meta(&self) -> &MetaMap {
        &self.meta
    }

    async fn fetch(&self) -> Result<String, CollectorError> {
        match &self.payload {
            MockPayload::Inline(payload) => {
                trace!(bytes = payload.len(), "replaying inline payload");
                Ok(payload.clone())
            }
            MockPayload::Fixture(path) => {
                trace!(path = %path.display(), "replaying fixture payload");
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    CollectorError::connectivity(path.display().to_string(), e.to_string())
                })
            }
        }
    }
}
