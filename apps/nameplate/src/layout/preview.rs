//! Print preview — what would be printed for a name card, without painting anything.

use serde::Serialize;

use crate::layout::block::FittedLayout;
use crate::layout::canvas::CanvasSpec;
use crate::layout::lines::{NameCard, TextLine};

pub const EMPTY_HINT: &str = "Enter first name or last name to see preview";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewLine {
    pub field: &'static str,
    pub text: TextLine,
}

/// Preview shown to the operator before printing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintPreview {
    pub lines: Vec<PreviewLine>,
    /// Line that governs the font size.
    pub longest: Option<TextLine>,
    pub font_size: Option<u32>,
    pub font: Option<String>,
    pub layout: String,
    /// Set when there is nothing to print.
    pub hint: Option<String>,
}

pub fn build_preview(card: &NameCard, layout: Option<&FittedLayout>, canvas: &CanvasSpec) -> PrintPreview {
    let lines: Vec<PreviewLine> = [
        ("first_name", card.first_name.as_deref()),
        ("last_name", card.last_name.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, raw)| {
        let text = TextLine::new(raw?)?;
        Some(PreviewLine { field, text })
    })
    .collect();

    let hint = lines.is_empty().then(|| EMPTY_HINT.to_string());

    let longest = layout.and_then(|l| {
        l.placements
            .get(l.search.longest_index)
            .map(|p| p.text.clone())
    });

    PrintPreview {
        lines,
        longest,
        font_size: layout.map(FittedLayout::size),
        font: layout.map(|l| l.font.face().name()),
        layout: format!(
            "{}x{} px, left-aligned, size automatically maximized",
            canvas.width, canvas.height
        ),
        hint,
    }
}
