//! Route playback.
//!
//! [`PlaybackController`] owns the position along an attached route and
//! publishes a [`wind_common::RouteTimeSnapshot`] on every index change so
//! the renderer can resample the forecast. Playback advances on a fixed
//! cadence driven by a [`Ticker`] task that `stop` cancels.

pub mod config;
pub mod controller;
pub mod ticker;

pub use config::PlaybackConfig;
pub use controller::{PlaybackController, PlaybackState};
pub use ticker::Ticker;
