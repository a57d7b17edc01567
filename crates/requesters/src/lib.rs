//! # Requesters
//!
//! Device polling module.
//!
//! Responsibilities:
//! - Build concrete `Requester` instances from `RequesterSpec`
//! - Perform one-shot payload fetches against remote devices
//! - Provide a mock requester for tests and offline runs
//!
//! ## Feature Flags
//!
//! - `http-requester`: Enable the HTTP-backed Obvius requester (requires reqwest)

pub mod factory;
pub mod mock;

#[cfg(feature = "http-requester")]
pub mod obvius;

pub use contracts::{Requester, RequesterSpec, RequesterType};
pub use factory::build_requester;
pub use mock::MockRequester;

#[cfg(feature = "http-requester")]
pub use obvius::ObviusRequester;
