//! Single-slot debounce timer.
//!
//! One timer, not a queue: scheduling aborts whatever was pending and
//! re-arms the quiet period, so N rapid keystrokes run the work exactly
//! once. The work closure receives the generation it was armed with and
//! is expected to stamp it onto whatever it posts back, so the owner can
//! drop outcomes that were superseded while in flight.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period between the last keystroke and validation.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(400);

pub struct Debouncer {
    quiet_period: Duration,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            generation: 0,
            in_flight: None,
        }
    }

    /// Cancels any pending run and arms a fresh one. Returns the new
    /// generation.
    pub fn schedule<F, Fut>(&mut self, work: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let quiet_period = self.quiet_period;
        self.in_flight = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            work(generation).await;
        }));
        generation
    }

    /// Aborts the pending run, if any. The generation still advances on
    /// the next schedule, so an aborted run that already fired its work
    /// is recognisably stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
