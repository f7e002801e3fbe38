//! In-memory forecast source and clock for cache and session tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use forecast_client::{Clock, DumpResponse, FieldDims, ForecastError, ForecastSource, Result};
use tokio::sync::Notify;
use wind_common::{ForecastMeta, Selector};

use crate::generators::{create_indexed_values, encode_le};

#[derive(Debug, Clone)]
struct Served {
    meta: ForecastMeta,
    header: Option<String>,
    body: Bytes,
    status: Option<u16>,
}

/// A [`ForecastSource`] serving whatever it was last told to.
///
/// `fetch_meta` snapshots the current response before waiting on the gate
/// (if one is armed), so a held load keeps the data it started with even if
/// the test swaps the response in the meantime.
pub struct FakeSource {
    served: Mutex<Served>,
    snapshot: Mutex<Option<Served>>,
    gate: Mutex<Option<Arc<Notify>>>,
    meta_calls: AtomicUsize,
    dump_calls: AtomicUsize,
}

impl FakeSource {
    /// Serve `meta` with an indexed body whose header lists the meta's names.
    pub fn new(meta: ForecastMeta) -> Self {
        let header = meta.components.join(",");
        let body = encode_le(&create_indexed_values(FieldDims::from_meta(&meta), meta.component_count));
        Self {
            served: Mutex::new(Served {
                meta,
                header: Some(header),
                body: Bytes::from(body),
                status: None,
            }),
            snapshot: Mutex::new(None),
            gate: Mutex::new(None),
            meta_calls: AtomicUsize::new(0),
            dump_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the served metadata and regenerate a matching indexed body.
    pub fn set_meta(&self, meta: ForecastMeta) {
        let header = meta.components.join(",");
        let body = encode_le(&create_indexed_values(FieldDims::from_meta(&meta), meta.component_count));
        let mut served = self.served.lock().unwrap();
        served.meta = meta;
        served.header = Some(header);
        served.body = Bytes::from(body);
    }

    /// Replace the dump body and components header.
    pub fn set_dump(&self, header: Option<&str>, values: &[f32]) {
        let mut served = self.served.lock().unwrap();
        served.header = header.map(str::to_string);
        served.body = Bytes::from(encode_le(values));
    }

    /// Replace the dump body with raw bytes.
    pub fn set_raw_body(&self, body: Vec<u8>) {
        self.served.lock().unwrap().body = Bytes::from(body);
    }

    /// Make every request fail with an HTTP status, or succeed again with `None`.
    pub fn set_status(&self, status: Option<u16>) {
        self.served.lock().unwrap().status = status;
    }

    /// Hold the next load after it has fetched metadata, until the returned
    /// handle is notified.
    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn meta_calls(&self) -> usize {
        self.meta_calls.load(Ordering::SeqCst)
    }

    pub fn dump_calls(&self) -> usize {
        self.dump_calls.load(Ordering::SeqCst)
    }

    fn check_status(status: Option<u16>) -> Result<()> {
        match status {
            Some(status) => Err(ForecastError::Transport {
                status,
                url: "fake://forecast".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ForecastSource for FakeSource {
    async fn fetch_meta(&self, _selector: &Selector) -> Result<ForecastMeta> {
        self.meta_calls.fetch_add(1, Ordering::SeqCst);
        let served = self.served.lock().unwrap().clone();
        Self::check_status(served.status)?;
        *self.snapshot.lock().unwrap() = Some(served.clone());

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        Ok(served.meta)
    }

    async fn fetch_dump(&self, _selector: &Selector, _reduced: bool) -> Result<DumpResponse> {
        self.dump_calls.fetch_add(1, Ordering::SeqCst);
        let served = self
            .snapshot
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| self.served.lock().unwrap().clone());
        Self::check_status(served.status)?;

        Ok(DumpResponse {
            components: served.header,
            body: served.body,
        })
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
