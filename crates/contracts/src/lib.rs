//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Records carry a unix timestamp (seconds, i64) stamped at translation time
//! - `ttl` (seconds) bounds how long a stored record stays alive in TTL-swept sinks

mod blueprint;
mod device;
mod error;
mod event;
mod record;
mod requester;
mod sink;

pub use blueprint::*;
pub use device::DeviceType;
pub use error::*;
pub use event::Event;
pub use record::{Coordinates, MetaMap, Record, RecordPoint};
pub use requester::{Requester, RequesterType};
pub use sink::RecordSink;
