//! Fixed-interval trigger schedule.

use std::time::Duration;

use contracts::Event;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

/// Fallback delay applied when a configured delay is unusable.
pub const DEFAULT_DELAY_SECS: f64 = 1.0;

/// Fixed-interval schedule for one device.
///
/// Emits `Event::Triggered` immediately on start and then once per delay.
/// The schedule never performs device I/O itself; a slow poll never holds
/// back the next trigger.
pub struct IntervalScheduler {
    device: String,
    delay: Duration,
}

impl IntervalScheduler {
    /// Create a schedule for `device` firing every `delay_secs`.
    ///
    /// Non-positive or non-finite delays are corrected to
    /// [`DEFAULT_DELAY_SECS`] with a warning; misconfiguration of one device
    /// must not take the collector down.
    pub fn new(device: impl Into<String>, delay_secs: f64) -> Self {
        let device = device.into();
        let delay_secs = if delay_secs.is_finite() && delay_secs > 0.0 {
            delay_secs
        } else {
            warn!(
                device = %device,
                delay_secs,
                "invalid schedule delay, using {DEFAULT_DELAY_SECS}s"
            );
            DEFAULT_DELAY_SECS
        };

        Self {
            device,
            delay: Duration::from_secs_f64(delay_secs),
        }
    }

    /// The configured device name.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// The effective (sanitized) delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawn the trigger loop.
    ///
    /// The loop exits when `shutdown` flips to `true` or the event channel
    /// closes.
    #[instrument(name = "scheduler_spawn", skip(self, events, shutdown), fields(device = %self.device))]
    pub fn spawn(
        self,
        events: mpsc::Sender<Event>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        debug!(delay = ?self.delay, "starting schedule");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.delay);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        trace!(device = %self.device, "schedule tick");
                        let event = Event::Triggered {
                            device: self.device.clone(),
                        };
                        if events.send(event).await.is_err() {
                            debug!(device = %self.device, "event channel closed, schedule exiting");
                            break;
                        }
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            debug!(device = %self.device, "schedule shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_sanitized() {
        assert_eq!(
            IntervalScheduler::new("m", 0.0).delay(),
            Duration::from_secs_f64(DEFAULT_DELAY_SECS)
        );
        assert_eq!(
            IntervalScheduler::new("m", -5.0).delay(),
            Duration::from_secs_f64(DEFAULT_DELAY_SECS)
        );
        assert_eq!(
            IntervalScheduler::new("m", f64::NAN).delay(),
            Duration::from_secs_f64(DEFAULT_DELAY_SECS)
        );
        assert_eq!(
            IntervalScheduler::new("m", 2.5).delay(),
            Duration::from_secs_f64(2.5)
        );
    }

    #[tokio::test]
    async fn test_emits_triggers() {
        let (tx, mut rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = IntervalScheduler::new("turbine", 0.01);
        let handle = scheduler.spawn(tx, shutdown_rx);

        for _ in 0..3 {
            match rx.recv().await {
                Some(Event::Triggered { device }) => assert_eq!(device, "turbine"),
                other => panic!("expected trigger, got {other:?}"),
            }
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_shutdown_stops_schedule() {
        let (tx, mut rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = IntervalScheduler::new("turbine", 0.01);
        let handle = scheduler.spawn(tx, shutdown_rx);

        // first tick fires immediately
        assert!(rx.recv().await.is_some());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // drain whatever was in flight; channel must then be closed
        while rx.try_recv().is_ok() {}
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_channel_stops_schedule() {
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        drop(rx);
        let handle = IntervalScheduler::new("turbine", 0.01).spawn(tx, shutdown_rx);
        handle.await.unwrap();
    }
}
