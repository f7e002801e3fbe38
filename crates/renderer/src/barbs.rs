//! Wind barb glyphs.
//!
//! A barb is a shaft pointing toward where the wind blows from, with flags
//! along it encoding speed in knots: a pennant per 50 kt, a full barb per
//! 10 kt, and a half barb for a remaining 5 kt. Flags start at the shaft head
//! and step toward the station point.

use crate::canvas::Canvas;
use crate::style::BarbStyle;
use crate::view::ScreenPoint;

/// Knots per metre per second.
pub const KNOTS_PER_MS: f64 = 1.943_844;

/// Speeds below this (knots) are drawn as a calm circle.
pub const CALM_KNOTS: f64 = 2.0;

/// Added to the speed before it is split into flags.
pub const SPEED_BIAS_KNOTS: f64 = 2.5;

/// Shaft length in pixels.
pub const SHAFT_LENGTH: f32 = 15.0;

/// Length of a full barb and height of a pennant, in pixels.
pub const FLAG_LENGTH: f32 = 8.0;

/// Distance between successive flags along the shaft, in pixels.
pub const FLAG_SPACING: f32 = 3.0;

/// How far a barb tip leans toward the shaft head.
const FLAG_SLANT: f32 = 2.0;

/// Speed split into flag counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarbFlags {
    pub pennants: u32,
    pub barbs: u32,
    pub half: bool,
}

impl BarbFlags {
    /// Decompose a speed in knots. The calibration bias is applied here.
    pub fn from_knots(knots: f64) -> Self {
        let resolved = (knots + SPEED_BIAS_KNOTS).max(0.0);
        let pennants = (resolved / 50.0).floor();
        let rest = resolved - pennants * 50.0;
        let barbs = (rest / 10.0).floor();
        let rest = rest - barbs * 10.0;

        Self {
            pennants: pennants as u32,
            barbs: barbs as u32,
            half: rest >= 5.0,
        }
    }
}

/// Convert U/V (m/s) to knots.
pub fn speed_knots(u: f32, v: f32) -> f64 {
    let (u, v) = (u as f64, v as f64);
    (u * u + v * v).sqrt() * KNOTS_PER_MS
}

/// Screen-space direction the shaft points to: toward where the wind comes
/// from, with v positive northward and screen y growing downward.
pub fn shaft_direction(u: f32, v: f32) -> Option<ScreenPoint> {
    ScreenPoint::new(-u, v).normalized()
}

/// Geometry of one glyph in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum BarbGlyph {
    Calm {
        center: ScreenPoint,
    },
    Barb {
        /// Station point, then shaft head.
        shaft: [ScreenPoint; 2],
        pennants: Vec<[ScreenPoint; 3]>,
        /// Full and half barbs, as line segments from the shaft outward.
        barbs: Vec<[ScreenPoint; 2]>,
        flags: BarbFlags,
    },
}

impl BarbGlyph {
    /// Build the glyph for wind `(u, v)` in m/s at screen point `at`.
    ///
    /// Returns `None` for non-finite components.
    pub fn new(at: ScreenPoint, u: f32, v: f32) -> Option<Self> {
        if !(u.is_finite() && v.is_finite()) {
            return None;
        }

        let knots = speed_knots(u, v);
        if knots < CALM_KNOTS {
            return Some(Self::Calm { center: at });
        }

        let dir = shaft_direction(u, v)?;
        let side = dir.perpendicular();
        let head = at + dir * SHAFT_LENGTH;
        let flags = BarbFlags::from_knots(knots);

        let mut offset = 0.0;
        let mut pennants = Vec::with_capacity(flags.pennants as usize);
        for _ in 0..flags.pennants {
            let base = head - dir * offset;
            pennants.push([base, base + side * FLAG_LENGTH, base - dir * FLAG_SPACING]);
            offset += FLAG_SPACING;
        }

        let mut barbs = Vec::with_capacity(flags.barbs as usize + 1);
        for _ in 0..flags.barbs {
            let root = head - dir * offset;
            barbs.push([root, root + side * FLAG_LENGTH + dir * FLAG_SLANT]);
            offset += FLAG_SPACING;
        }

        if flags.half {
            // A lone half barb sits one step in from the head.
            if offset == 0.0 {
                offset = FLAG_SPACING;
            }
            let root = head - dir * offset;
            barbs.push([
                root,
                root + side * (FLAG_LENGTH / 2.0) + dir * (FLAG_SLANT / 2.0),
            ]);
        }

        Some(Self::Barb {
            shaft: [at, head],
            pennants,
            barbs,
            flags,
        })
    }

    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, style: &BarbStyle) {
        match self {
            Self::Calm { center } => {
                canvas.stroke_circle(*center, style.calm_radius, style.color, style.line_width);
            }
            Self::Barb {
                shaft,
                pennants,
                barbs,
                ..
            } => {
                canvas.stroke_line(shaft[0], shaft[1], style.color, style.line_width);
                for triangle in pennants {
                    canvas.fill_polygon(triangle, style.color);
                }
                for segment in barbs {
                    canvas.stroke_line(segment[0], segment[1], style.color, style.line_width);
                }
            }
        }
    }
}
