//! # Scheduler
//!
//! Per-device trigger schedules.
//!
//! Responsibilities:
//! - Emit `Event::Triggered` for a device on a fixed interval
//! - Sanitize misconfigured delays instead of failing
//! - Stop promptly on shutdown signal

mod interval;

pub use interval::{IntervalScheduler, DEFAULT_DELAY_SECS};
