//! Block layout — stacks lines at one shared size and centers the block vertically.

use serde::Serialize;

use crate::layout::canvas::CanvasSpec;
use crate::layout::font_metrics::{FontCandidate, TextBounds};
use crate::layout::lines::TextLine;
use crate::layout::size_search::SizeSearch;

/// Inter-line spacing as a fraction of the font size.
pub const LINE_SPACING_RATIO: f32 = 0.3;

/// Where one line's ink box lands on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePlacement {
    pub text: TextLine,
    /// Top-left of the tight ink box, in canvas pixels.
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bounds: TextBounds,
}

/// The complete layout for one render: one font size for every line.
#[derive(Debug, Clone)]
pub struct FittedLayout {
    pub font: FontCandidate,
    pub search: SizeSearch,
    pub spacing: u32,
    pub block_height: u32,
    /// May be negative when the block is taller than the vertical band.
    pub start_y: i32,
    pub placements: Vec<LinePlacement>,
}

/// Serializable digest of a `FittedLayout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSummary {
    pub font: String,
    pub font_size: u32,
    pub fallback_size: bool,
    pub builtin_font: bool,
    pub spacing: u32,
    pub block_height: u32,
    pub start_y: i32,
    pub lines: Vec<LinePlacement>,
}

impl FittedLayout {
    pub fn size(&self) -> u32 {
        self.font.size()
    }

    pub fn summary(&self) -> LayoutSummary {
        LayoutSummary {
            font: self.font.face().name(),
            font_size: self.size(),
            fallback_size: self.search.fallback,
            builtin_font: self.font.face().is_builtin(),
            spacing: self.spacing,
            block_height: self.block_height,
            start_y: self.start_y,
            lines: self.placements.clone(),
        }
    }
}

pub fn line_spacing(size: u32) -> u32 {
    (size as f32 * LINE_SPACING_RATIO) as u32
}

/// Measures every line at `font`, then stacks them top-to-bottom at the left margin,
/// centering the whole block inside the vertical margin band.
pub fn layout_block(
    lines: &[TextLine],
    font: FontCandidate,
    search: SizeSearch,
    canvas: &CanvasSpec,
) -> FittedLayout {
    let bounds: Vec<TextBounds> = lines.iter().map(|l| font.measure(l.as_str())).collect();
    let spacing = line_spacing(font.size());

    let gaps = lines.len().saturating_sub(1) as u32;
    let block_height = bounds.iter().map(TextBounds::height).sum::<u32>() + gaps * spacing;

    let margin_y = canvas.margin_y() as i64;
    let band = canvas.available_height() as i64;
    let start_y = (margin_y + (band - block_height as i64).div_euclid(2)) as i32;
    let left_x = canvas.margin_x() as i32;

    let mut placements = Vec::with_capacity(lines.len());
    let mut y = start_y;
    for (line, b) in lines.iter().zip(&bounds) {
        placements.push(LinePlacement {
            text: line.clone(),
            x: left_x,
            y,
            width: b.width(),
            height: b.height(),
            bounds: *b,
        });
        y += (b.height() + spacing) as i32;
    }

    FittedLayout {
        font,
        search,
        spacing,
        block_height,
        start_y,
        placements,
    }
}
