//! Requester trait - device polling abstraction
//!
//! A requester performs the device I/O on demand and yields the raw payload
//! plus the metadata configured for its device. Concrete implementations are
//! resolved once at startup through an explicit tag registry; the engine only
//! sees this trait.

use async_trait::async_trait;

use crate::{CollectorError, MetaMap};

/// Declared requester type tag, used to key translator instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequesterType {
    /// Obvius AcquiSuite data acquisition server (XML payloads)
    Obvius,
}

impl std::fmt::Display for RequesterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Obvius => f.write_str("obvius"),
        }
    }
}

/// Device polling trait.
///
/// `fetch` runs outside the engine's routing loop as a detached task; it must
/// not block the caller beyond awaiting its own I/O.
#[async_trait]
pub trait Requester: Send + Sync {
    /// The payload dialect this requester produces
    fn requester_type(&self) -> RequesterType;

    /// Metadata seeded into every record built from this requester's payloads
    fn meta(&self) -> &MetaMap;

    /// Perform one poll and return the raw payload
    async fn fetch(&self) -> Result<String, CollectorError>;
}
