//! Single-entry forecast cache.
//!
//! Holds the most recently loaded `(meta, field)` pair together with the key
//! it was loaded for. Loads are guarded two ways:
//!
//! - a `loading` flag: while a load is in flight, other callers get whatever
//!   is cached right now (possibly nothing) instead of starting a second load;
//! - a generation counter bumped by every load and every invalidation: a load
//!   only commits if its generation is still the latest, so a response that
//!   lands after a forced reload can never overwrite the newer entry.
//!
//! The slot lock is never held across an await. The `loading` flag is owned
//! by a drop guard, so a caller that is cancelled mid-load (aborted task,
//! timeout, `select!`) still releases it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use wind_common::{CacheKey, ForecastMeta, Selector};

use crate::clock::{Clock, SystemClock};
use crate::decoder::{FieldDecoder, ForecastField};
use crate::error::{ForecastError, Result};
use crate::source::ForecastSource;

/// A loaded forecast. Cloning shares the underlying meta and field.
#[derive(Debug, Clone)]
pub struct LoadedForecast {
    pub key: CacheKey,
    pub meta: Arc<ForecastMeta>,
    pub field: Arc<ForecastField>,
    pub loaded_at: DateTime<Utc>,
}

/// Cache counters for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests served from the current entry.
    pub hits: u64,
    /// Requests that started a load.
    pub misses: u64,
    /// Requests answered with the current entry because a load was in flight.
    pub busy: u64,
    /// Loads committed to the cache.
    pub loads: u64,
    /// Loads that finished after a newer request and were not committed.
    pub stale_discarded: u64,
    /// Loads that failed.
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    busy: AtomicU64,
    loads: AtomicU64,
    stale_discarded: AtomicU64,
    failures: AtomicU64,
}

#[derive(Default)]
struct Slot {
    entry: Option<LoadedForecast>,
    loading: bool,
    generation: u64,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears `loading` for its generation unless disarmed first.
struct LoadGuard<'a> {
    slot: &'a Mutex<Slot>,
    generation: u64,
    armed: bool,
}

impl LoadGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slot = lock(self.slot);
        if slot.generation == self.generation {
            slot.loading = false;
            debug!(generation = self.generation, "Forecast load abandoned");
        }
    }
}

/// Cache over one forecast selection at a time.
pub struct ForecastCache {
    source: Arc<dyn ForecastSource>,
    clock: Arc<dyn Clock>,
    slot: Mutex<Slot>,
    counters: Counters,
}

impl ForecastCache {
    /// Create a cache using the system clock.
    pub fn new(source: Arc<dyn ForecastSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn ForecastSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            slot: Mutex::new(Slot::default()),
            counters: Counters::default(),
        }
    }

    /// Return the forecast for `selector`, loading it if needed.
    ///
    /// Returns `Ok(None)` only when another load is in flight and nothing is
    /// cached yet. While a load is in flight every caller gets the current
    /// entry, which may belong to a different key.
    pub async fn ensure_loaded(
        &self,
        selector: &Selector,
        reduced_components: bool,
    ) -> Result<Option<LoadedForecast>> {
        let key = CacheKey::new(selector, reduced_components);

        let generation = {
            let mut slot = lock(&self.slot);

            if slot.loading {
                self.counters.busy.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Forecast load in progress, serving current entry");
                return Ok(slot.entry.clone());
            }

            if let Some(entry) = slot.entry.as_ref().filter(|e| e.key == key) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Forecast cache hit");
                return Ok(Some(entry.clone()));
            }

            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            slot.loading = true;
            slot.generation += 1;
            slot.generation
        };

        let mut guard = LoadGuard {
            slot: &self.slot,
            generation,
            armed: true,
        };
        let result = self.load(selector, reduced_components, key).await;
        guard.disarm();

        let mut slot = lock(&self.slot);
        let current = slot.generation == generation;
        if current {
            slot.loading = false;
        }

        match result {
            Ok(loaded) => {
                if current {
                    self.counters.loads.fetch_add(1, Ordering::Relaxed);
                    slot.entry = Some(loaded.clone());
                } else {
                    self.counters.stale_discarded.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        key = %loaded.key,
                        generation = generation,
                        latest = slot.generation,
                        "Discarding superseded forecast load"
                    );
                }
                Ok(Some(loaded))
            }
            Err(err) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "Forecast load failed");
                Err(err)
            }
        }
    }

    /// Drop the current entry and load `selector` again.
    ///
    /// Any load still in flight is superseded and will not commit.
    pub async fn force_reload(
        &self,
        selector: &Selector,
        reduced_components: bool,
    ) -> Result<Option<LoadedForecast>> {
        self.invalidate().await;
        self.ensure_loaded(selector, reduced_components).await
    }

    /// Clear the entry and supersede any in-flight load.
    pub async fn invalidate(&self) {
        let mut slot = lock(&self.slot);
        slot.entry = None;
        slot.loading = false;
        slot.generation += 1;
        debug!(generation = slot.generation, "Forecast cache invalidated");
    }

    /// The current entry, if any.
    pub async fn current(&self) -> Option<LoadedForecast> {
        lock(&self.slot).entry.clone()
    }

    pub async fn is_loading(&self) -> bool {
        lock(&self.slot).loading
    }

    /// Whether the cached dataset is the server file `file_name`.
    pub async fn matches_file(&self, file_name: &str) -> bool {
        lock(&self.slot)
            .entry
            .as_ref()
            .is_some_and(|e| e.meta.source == file_name)
    }

    /// Fetch and validate the metadata of `selector` without loading its dump.
    ///
    /// The cached entry is left untouched.
    #[instrument(skip(self), fields(selector = %selector))]
    pub async fn fetch_meta(&self, selector: &Selector) -> Result<ForecastMeta> {
        let meta = self.source.fetch_meta(selector).await?;
        meta.validate()?;
        debug!(file = %meta.source, steps = meta.step_count(), "Fetched forecast metadata");
        Ok(meta)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            busy: self.counters.busy.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            stale_discarded: self.counters.stale_discarded.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    #[instrument(skip(self, key), fields(key = %key))]
    async fn load(
        &self,
        selector: &Selector,
        reduced_components: bool,
        key: CacheKey,
    ) -> Result<LoadedForecast> {
        let started = Instant::now();

        let meta = self.fetch_meta(selector).await?;

        let dump = self.source.fetch_dump(selector, reduced_components).await?;
        let header = dump
            .components
            .as_deref()
            .ok_or_else(|| ForecastError::protocol("dump response has no components header"))?;

        let field = FieldDecoder::for_meta(&meta, reduced_components).decode(header, &dump.body)?;

        info!(
            file = %meta.source,
            steps = meta.step_count(),
            lat_count = meta.grid.lat_count,
            lon_count = meta.grid.lon_count,
            components = field.component_count(),
            bytes = field.memory_bytes(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Forecast loaded"
        );

        Ok(LoadedForecast {
            key,
            meta: Arc::new(meta),
            field: Arc::new(field),
            loaded_at: self.clock.now(),
        })
    }
}
