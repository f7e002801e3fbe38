//! Playback state machine.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use wind_common::{RoutePoint, RouteState, RouteTimeSnapshot};

use crate::config::PlaybackConfig;
use crate::ticker::Ticker;

/// Whether the ticker is driving the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Position along an attached route, advanced by hand or by a ticker.
///
/// Every index change (and every attach or reset) is published on a
/// `watch` channel; subscribers redraw from the latest snapshot.
pub struct PlaybackController {
    config: PlaybackConfig,
    route: Option<RouteState>,
    index: usize,
    state: PlaybackState,
    ticker: Option<Ticker>,
    /// Bumped on every play and stop so ticks from an old ticker are ignored.
    generation: u64,
    tick_tx: mpsc::UnboundedSender<u64>,
    tick_rx: mpsc::UnboundedReceiver<u64>,
    publisher: watch::Sender<Option<RouteTimeSnapshot>>,
}

impl PlaybackController {
    pub fn new(config: PlaybackConfig) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (publisher, _) = watch::channel(None);
        Self {
            config,
            route: None,
            index: 0,
            state: PlaybackState::Stopped,
            ticker: None,
            generation: 0,
            tick_tx,
            tick_rx,
            publisher,
        }
    }

    /// Receive the snapshot published on every change.
    pub fn subscribe(&self) -> watch::Receiver<Option<RouteTimeSnapshot>> {
        self.publisher.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn route(&self) -> Option<&RouteState> {
        self.route.as_ref()
    }

    /// Point at the current index.
    pub fn current_point(&self) -> Option<&RoutePoint> {
        self.route.as_ref().and_then(|r| r.point(self.index))
    }

    pub fn snapshot(&self) -> Option<RouteTimeSnapshot> {
        self.route.as_ref().map(|r| r.snapshot(self.index))
    }

    /// Attach a route: stops playback and rewinds to the first point.
    pub fn attach_route(&mut self, route: RouteState) {
        self.cancel_ticker();
        self.state = PlaybackState::Stopped;
        self.index = 0;
        info!(
            points = route.len(),
            step_secs = route.step_duration_secs(),
            start = %route.start(),
            "Route attached"
        );
        self.route = Some(route);
        self.publish();
    }

    /// Move by `delta` points, clamped to the route. State is unchanged.
    pub fn step(&mut self, delta: i64) -> usize {
        if let Some(last) = self.last_index() {
            let target = (self.index as i64).saturating_add(delta).clamp(0, last as i64);
            self.move_to(target as usize);
        }
        self.index
    }

    /// Jump to `index`, clamped to the route. State is unchanged.
    pub fn set_index(&mut self, index: usize) -> usize {
        if let Some(last) = self.last_index() {
            self.move_to(index.min(last));
        }
        self.index
    }

    /// Start ticking. No-op when already playing or without a route.
    pub fn play(&mut self) {
        if self.state == PlaybackState::Playing || self.route.is_none() {
            return;
        }

        self.generation += 1;
        self.ticker = Some(Ticker::start(
            self.config.cadence(),
            self.generation,
            self.tick_tx.clone(),
        ));
        self.state = PlaybackState::Playing;
        info!(index = self.index, cadence_ms = self.config.cadence_ms, "Playback started");
    }

    /// Advance one point, or stop when already at the last one.
    ///
    /// Ignored unless playing. Returns whether the index moved.
    pub fn tick(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }

        match self.last_index() {
            Some(last) if self.index < last => {
                self.move_to(self.index + 1);
                true
            }
            _ => {
                self.stop();
                false
            }
        }
    }

    /// Stop ticking. No further tick is applied after this returns.
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.cancel_ticker();
        self.state = PlaybackState::Stopped;
        info!(index = self.index, "Playback stopped");
    }

    /// Detach the route.
    pub fn reset(&mut self) {
        self.cancel_ticker();
        self.state = PlaybackState::Stopped;
        self.route = None;
        self.index = 0;
        self.publish();
    }

    /// Wait for the next tick of the running ticker and apply it.
    ///
    /// Pending forever while stopped. Ticks sent by a ticker that has since
    /// been stopped are dropped. Returns whether the index moved.
    pub async fn next_tick(&mut self) -> bool {
        loop {
            if self.state != PlaybackState::Playing {
                std::future::pending::<()>().await;
            }

            match self.tick_rx.recv().await {
                Some(generation) if generation == self.generation => return self.tick(),
                Some(stale) => debug!(stale, current = self.generation, "Dropping stale tick"),
                None => std::future::pending::<()>().await,
            }
        }
    }

    fn last_index(&self) -> Option<usize> {
        self.route.as_ref().map(RouteState::last_index)
    }

    fn move_to(&mut self, index: usize) {
        if index != self.index {
            self.index = index;
            self.publish();
        }
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.generation += 1;
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        debug!(index = self.index, "Publishing route time");
        self.publisher.send_replace(snapshot);
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}
