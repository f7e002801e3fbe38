//! Fixed-cadence tick source.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// A spawned task sending `generation` on `tx` once per cadence.
///
/// The first tick fires one full cadence after start. Dropping or cancelling
/// the ticker aborts the task.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
    generation: u64,
}

impl Ticker {
    /// Spawn the tick task. Must be called inside a tokio runtime.
    pub fn start(cadence: Duration, generation: u64, tx: mpsc::UnboundedSender<u64>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval completes its first tick immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if tx.send(generation).is_err() {
                    break;
                }
            }
        });

        debug!(generation, cadence_ms = cadence.as_millis() as u64, "Ticker started");
        Self { handle, generation }
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(generation = self.generation, "Ticker cancelled");
    }
}
