//! Drawing surface used by the barb renderer and route overlays.

use tiny_skia::{FillRule, LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::{RenderError, Result};
use crate::png::encode_png;
use crate::style::Rgba;
use crate::view::ScreenPoint;

/// A 2D surface in screen pixels.
pub trait Canvas {
    /// Erase everything drawn so far.
    fn clear(&mut self);

    /// Stroke an open polyline.
    fn stroke_polyline(&mut self, points: &[ScreenPoint], color: Rgba, width: f32);

    /// Fill a closed polygon.
    fn fill_polygon(&mut self, points: &[ScreenPoint], color: Rgba);

    /// Stroke a circle outline.
    fn stroke_circle(&mut self, center: ScreenPoint, radius: f32, color: Rgba, width: f32);

    /// Fill a disc.
    fn fill_circle(&mut self, center: ScreenPoint, radius: f32, color: Rgba);

    fn stroke_line(&mut self, from: ScreenPoint, to: ScreenPoint, color: Rgba, width: f32) {
        self.stroke_polyline(&[from, to], color, width);
    }
}

/// An anti-aliased raster canvas backed by a tiny-skia pixmap.
pub struct PixmapCanvas {
    pixmap: Pixmap,
    background: Rgba,
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

impl PixmapCanvas {
    /// Create a transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_background(width, height, Rgba::TRANSPARENT)
    }

    /// Create a canvas that clears to `background`.
    pub fn with_background(width: u32, height: u32, background: Rgba) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::CanvasSize { width, height })?;
        let mut canvas = Self { pixmap, background };
        canvas.clear();
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha RGBA bytes, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Pixel at (x, y), `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Rgba {
                r: c.red(),
                g: c.green(),
                b: c.blue(),
                a: c.alpha(),
            }
        })
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.to_rgba(), self.width() as usize, self.height() as usize)
    }

    fn fill(&mut self, builder: PathBuilder, color: Rgba) {
        if let Some(path) = builder.finish() {
            self.pixmap
                .fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn stroke(&mut self, builder: PathBuilder, color: Rgba, width: f32) {
        if let Some(path) = builder.finish() {
            let stroke = Stroke {
                width,
                line_cap: LineCap::Round,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
        }
    }
}

fn polyline(points: &[ScreenPoint]) -> PathBuilder {
    let mut pb = PathBuilder::new();
    if let Some((first, rest)) = points.split_first() {
        pb.move_to(first.x, first.y);
        for p in rest {
            pb.line_to(p.x, p.y);
        }
    }
    pb
}

fn circle(center: ScreenPoint, radius: f32) -> PathBuilder {
    let mut pb = PathBuilder::new();
    pb.push_circle(center.x, center.y, radius);
    pb
}

impl Canvas for PixmapCanvas {
    fn clear(&mut self) {
        let bg = self.background;
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
    }

    fn stroke_polyline(&mut self, points: &[ScreenPoint], color: Rgba, width: f32) {
        if points.len() < 2 {
            return;
        }
        self.stroke(polyline(points), color, width);
    }

    fn fill_polygon(&mut self, points: &[ScreenPoint], color: Rgba) {
        if points.len() < 3 {
            return;
        }
        let mut pb = polyline(points);
        pb.close();
        self.fill(pb, color);
    }

    fn stroke_circle(&mut self, center: ScreenPoint, radius: f32, color: Rgba, width: f32) {
        self.stroke(circle(center, radius), color, width);
    }

    fn fill_circle(&mut self, center: ScreenPoint, radius: f32, color: Rgba) {
        self.fill(circle(center, radius), color);
    }
}
