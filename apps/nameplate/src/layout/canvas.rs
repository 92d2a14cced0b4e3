//! Canvas configuration — page size, margins, fill target, and candidate font sizes.
//!
//! The default canvas is A4 landscape at 300 DPI (3508 × 2480 px) with 5% margins on
//! every side and a 90% fill target for the longest line. Any positive size is accepted.
//! The DPI only sets the physical size recorded in the encoded PNG.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Errors raised by the layout engine. Font-loading problems never appear here:
/// a missing or unreadable font falls back to the built-in face.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid canvas: {0}")]
    InvalidCanvas(String),

    #[error("Invalid font size range: {0}")]
    InvalidSizeRange(String),

    #[error("Canvas of {width}x{height} pixels is too large to allocate")]
    CanvasTooLarge { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas spec
// ────────────────────────────────────────────────────────────────────────────

pub const A4_LANDSCAPE_300DPI: (u32, u32) = (3508, 2480);
pub const DEFAULT_MARGIN_RATIO: f32 = 0.05;
pub const DEFAULT_FILL_RATIO: f32 = 0.9;
pub const DEFAULT_DPI: u32 = 300;

/// Output canvas geometry. Fields missing from serialized input take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    /// Left/right margin as a fraction of `width`. Must be in [0, 0.5).
    pub margin_x_ratio: f32,
    /// Top/bottom margin as a fraction of `height`. Must be in [0, 0.5).
    pub margin_y_ratio: f32,
    /// Fraction of the available width the longest line may occupy. Must be in (0, 1].
    pub fill_ratio: f32,
    /// Print resolution written to the PNG `pHYs` chunk.
    pub dpi: u32,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        let (width, height) = A4_LANDSCAPE_300DPI;
        Self {
            width,
            height,
            margin_x_ratio: DEFAULT_MARGIN_RATIO,
            margin_y_ratio: DEFAULT_MARGIN_RATIO,
            fill_ratio: DEFAULT_FILL_RATIO,
            dpi: DEFAULT_DPI,
        }
    }
}

impl CanvasSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Rejects non-positive dimensions and out-of-range ratios.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.width == 0 || self.height == 0 {
            return Err(LayoutError::InvalidCanvas(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        for (name, ratio) in [
            ("margin_x_ratio", self.margin_x_ratio),
            ("margin_y_ratio", self.margin_y_ratio),
        ] {
            if !(0.0..0.5).contains(&ratio) {
                return Err(LayoutError::InvalidCanvas(format!(
                    "{name} must be in [0, 0.5), got {ratio}"
                )));
            }
        }
        if !(self.fill_ratio > 0.0 && self.fill_ratio <= 1.0) {
            return Err(LayoutError::InvalidCanvas(format!(
                "fill_ratio must be in (0, 1], got {}",
                self.fill_ratio
            )));
        }
        if self.dpi == 0 {
            return Err(LayoutError::InvalidCanvas("dpi must be positive".to_string()));
        }
        Ok(())
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn margin_x(&self) -> u32 {
        (self.width as f32 * self.margin_x_ratio) as u32
    }

    pub fn margin_y(&self) -> u32 {
        (self.height as f32 * self.margin_y_ratio) as u32
    }

    pub fn available_width(&self) -> u32 {
        self.width - 2 * self.margin_x()
    }

    pub fn available_height(&self) -> u32 {
        self.height - 2 * self.margin_y()
    }

    /// Widest a line may be, in pixels, and still count as fitting.
    pub fn width_limit(&self) -> f32 {
        self.available_width() as f32 * self.fill_ratio
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate font sizes
// ────────────────────────────────────────────────────────────────────────────

/// Ascending candidate font sizes: `min, min + step, …` strictly below `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl Default for SizeRange {
    fn default() -> Self {
        Self {
            min: 50,
            max: 800,
            step: 10,
        }
    }
}

impl SizeRange {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.min == 0 || self.step == 0 || self.min >= self.max {
            return Err(LayoutError::InvalidSizeRange(format!(
                "need 0 < min < max and step > 0, got {}..{} step {}",
                self.min, self.max, self.step
            )));
        }
        Ok(())
    }

    pub fn sizes(&self) -> impl Iterator<Item = u32> {
        (self.min..self.max).step_by(self.step.max(1) as usize)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
