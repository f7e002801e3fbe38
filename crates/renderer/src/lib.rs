//! Wind barb rendering for forecast playback.
//!
//! The renderer samples a decoded forecast field on a zoom-dependent grid
//! stride, culls and de-duplicates candidates in screen space, and draws one
//! wind barb per surviving cell:
//!
//! ```text
//! (meta, field) + snapshot ──> WindRenderer ──> BarbGlyph ──> Canvas
//!                                   │
//!                                MapView (bounds, zoom, project)
//! ```
//!
//! `Canvas` and `MapView` are the seams to the host map. `PixmapCanvas`
//! (tiny-skia) and `WebMercatorView` are the bundled implementations.

pub mod barbs;
pub mod canvas;
pub mod error;
pub mod png;
pub mod sampler;
pub mod style;
pub mod view;

pub use barbs::{BarbFlags, BarbGlyph};
pub use canvas::{Canvas, PixmapCanvas};
pub use error::{RenderError, Result};
pub use png::encode_png;
pub use sampler::{stride_for_zoom, RedrawStats, WindRenderer};
pub use style::{BarbStyle, Rgba};
pub use view::{MapView, ScreenPoint, WebMercatorView};
