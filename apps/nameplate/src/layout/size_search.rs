//! Font-size search — largest candidate size at which the longest line fits.
//!
//! Linear ascending scan: each size whose width fits becomes the current best; the
//! first size that overflows ends the scan. Widths are assumed non-decreasing in size,
//! so nothing past the first overflow is tried. If even the smallest candidate
//! overflows, the smallest candidate is returned anyway.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::canvas::SizeRange;
use crate::layout::font_metrics::{FontCandidate, FontFace};
use crate::layout::lines::TextLine;

/// Outcome of a size search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSearch {
    pub size: u32,
    /// True when no candidate fit and the smallest size was used as a last resort.
    pub fallback: bool,
    /// Number of candidate sizes measured.
    pub sizes_tried: u32,
    /// Width of the measured string at `size`.
    pub width_at_size: u32,
    /// Index of the line that governed the search.
    pub longest_index: usize,
}

/// Scans `range` with `measure_width(size)` and returns the largest size whose width
/// is ≤ `width_limit`, stopping at the first size that overflows. `longest_index` is
/// left at 0 for the caller to fill in.
pub fn search_font_size<F>(range: &SizeRange, width_limit: f32, mut measure_width: F) -> SizeSearch
where
    F: FnMut(u32) -> u32,
{
    let mut best: Option<(u32, u32)> = None;
    let mut sizes_tried = 0u32;
    let mut first: Option<(u32, u32)> = None;

    for size in range.sizes() {
        sizes_tried += 1;
        let width = measure_width(size);
        if first.is_none() {
            first = Some((size, width));
        }
        if width as f32 <= width_limit {
            best = Some((size, width));
        } else {
            break;
        }
    }

    match best {
        Some((size, width_at_size)) => SizeSearch {
            size,
            fallback: false,
            sizes_tried,
            width_at_size,
            longest_index: 0,
        },
        None => {
            let (size, width_at_size) = first.unwrap_or((range.min, 0));
            debug!(size, width_limit, "No candidate size fits; using smallest size");
            SizeSearch {
                size,
                fallback: true,
                sizes_tried,
                width_at_size,
                longest_index: 0,
            }
        }
    }
}

/// Index of the widest line measured at the smallest candidate size.
/// Ties go to the earlier line. `None` for an empty slice.
pub fn longest_line_index(lines: &[TextLine], face: &Arc<FontFace>, range: &SizeRange) -> Option<usize> {
    let reference = FontCandidate::new(Arc::clone(face), range.min);
    let mut longest: Option<(usize, u32)> = None;
    for (idx, line) in lines.iter().enumerate() {
        let width = reference.measure(line.as_str()).width();
        match longest {
            Some((_, w)) if w >= width => {}
            _ => longest = Some((idx, width)),
        }
    }
    longest.map(|(idx, _)| idx)
}

/// Finds the best size for `lines` in `face`. Returns `None` when there is nothing to fit.
pub fn fit_lines(
    lines: &[TextLine],
    face: &Arc<FontFace>,
    range: &SizeRange,
    width_limit: f32,
) -> Option<SizeSearch> {
    let idx = longest_line_index(lines, face, range)?;
    let longest = lines[idx].as_str();
    let search = SizeSearch {
        longest_index: idx,
        ..search_font_size(range, width_limit, |size| {
            FontCandidate::new(Arc::clone(face), size).measure(longest).width()
        })
    };
    debug!(
        longest,
        size = search.size,
        tried = search.sizes_tried,
        fallback = search.fallback,
        "Font size search finished"
    );
    Some(search)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
