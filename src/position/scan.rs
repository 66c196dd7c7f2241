//! Cadence of UI scans that feed the position registry.

use std::sync::{
    Mutex,
    PoisonError,
};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{
    Instant,
    MissedTickBehavior,
};

/// Minimum spacing between registry-triggering scans, and the period of re-scans while the
/// editing overlay is shown.
#[derive(Debug)]
pub struct ScanScheduler {
    min_interval: Duration,
    rescan_interval: Duration,
    last_scan: Mutex<Option<Instant>>,
}

impl ScanScheduler {
    #[must_use]
    pub const fn new(min_interval: Duration, rescan_interval: Duration) -> Self {
        Self { min_interval, rescan_interval, last_scan: Mutex::new(None) }
    }

    /// `true` when a scan may run now; the scan is then recorded.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut last_scan = self.last_scan.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = *last_scan
            && now.saturating_duration_since(last) < self.min_interval
        {
            return false;
        }
        *last_scan = Some(now);
        true
    }

    /// Calls `scan` every rescan interval while `editing` is `true`.
    ///
    /// The task idles while editing is off, and ends once the sender of `editing` is dropped.
    pub fn spawn_periodic<F>(&self, mut editing: watch::Receiver<bool>, mut scan: F) -> JoinHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        let period = self.rescan_interval;
        tokio::spawn(async move {
            loop {
                let started = editing.wait_for(|on| *on).await.is_ok();
                if !started {
                    return;
                }
                tracing::debug!(?period, "Editing started, rescanning periodically");

                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => scan(),
                        changed = editing.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            let still_editing = *editing.borrow_and_update();
                            if !still_editing {
                                tracing::debug!("Editing stopped, periodic rescan paused");
                                break;
                            }
                        }
                    }
                }
            }
        })
    }
}
