//! Forecast loading for the wind playback workspace.
//!
//! - [`FieldDecoder`] turns a header-described binary dump into a
//!   [`ForecastField`] with random access by (time, lat, lon).
//! - [`ForecastSource`] is the server seam; [`HttpForecastSource`] talks to the
//!   real forecast server.
//! - [`ForecastCache`] keeps one loaded forecast and guarantees a single
//!   in-flight load.
//!
//! ```text
//! ensure_loaded(selector, reduced)
//!      │
//!      ├─► key matches current entry ──► return cached (meta, field)
//!      │
//!      └─► fetch_meta ─► fetch_dump ─► FieldDecoder::decode ─► commit if
//!                                                             generation
//!                                                             is current
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod decoder;
pub mod error;
pub mod http;
pub mod source;

pub use cache::{CacheStats, ForecastCache, LoadedForecast};
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use decoder::{FieldDecoder, FieldDims, ForecastField, WindSample};
pub use error::{ForecastError, Result};
pub use http::HttpForecastSource;
pub use source::{parse_meta, DumpResponse, ForecastSource, MetaResponse};
