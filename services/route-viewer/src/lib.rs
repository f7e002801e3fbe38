//! Route viewer: loads a forecast, plays a route over it and renders frames.

pub mod config;
pub mod frames;
pub mod session;

pub use config::{ForecastSection, OutputSection, OverlayStyle, ViewerConfig};
pub use frames::{FrameRecord, FrameWriter};
pub use session::ViewerSession;
