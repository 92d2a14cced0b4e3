// Layout engine: best-fit sizing of one or two name lines on a fixed canvas.
// Pipeline: text measurement → font-size search → block layout → compositor.
// Rendering is CPU-bound; async callers must run it inside tokio::task::spawn_blocking.

pub mod block;
pub mod canvas;
pub mod compositor;
pub mod font_metrics;
pub mod lines;
pub mod preview;
pub mod size_search;

use std::sync::Arc;

use tracing::info;

pub use block::{FittedLayout, LayoutSummary};
pub use canvas::{CanvasSpec, LayoutError, SizeRange};
pub use compositor::RenderedImage;
pub use font_metrics::{FileFontSource, FontCandidate, FontFace, FontSource};
pub use lines::{NameCard, TextLine};

/// Result of a render request. `NoContent` is not an error: the caller decides
/// whether to tell the operator or silently skip printing.
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered {
        image: RenderedImage,
        layout: FittedLayout,
    },
    NoContent,
}

/// Chooses the size and placement of `lines` in `face`. `None` when `lines` is empty.
///
/// Inputs are assumed validated; see `LayoutEngine::plan` for the checked version.
pub fn fit(
    lines: &[TextLine],
    canvas: &CanvasSpec,
    sizes: &SizeRange,
    face: Arc<FontFace>,
) -> Option<FittedLayout> {
    let search = size_search::fit_lines(lines, &face, sizes, canvas.width_limit())?;
    let font = FontCandidate::new(face, search.size);
    Some(block::layout_block(lines, font, search, canvas))
}

/// Validates the request, fits the lines, and paints them. All-or-nothing: either a
/// complete image is returned or none is.
pub fn render<S: AsRef<str>>(
    raw_lines: &[S],
    canvas: &CanvasSpec,
    sizes: &SizeRange,
    fonts: &dyn FontSource,
) -> Result<RenderOutcome, LayoutError> {
    canvas.validate()?;
    sizes.validate()?;

    let lines = lines::normalize_lines(raw_lines);
    if lines.is_empty() {
        info!("Nothing to render");
        return Ok(RenderOutcome::NoContent);
    }

    let face = fonts.acquire();
    let Some(layout) = fit(&lines, canvas, sizes, face) else {
        return Ok(RenderOutcome::NoContent);
    };
    let image = compositor::composite(&layout, canvas)?;

    info!(
        lines = lines.len(),
        font = %layout.font.face().name(),
        size = layout.size(),
        fallback = layout.search.fallback,
        "Rendered name card"
    );
    Ok(RenderOutcome::Rendered { image, layout })
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// A canvas, a size range, and a font source bundled for repeated requests.
/// Holds no per-request state; clones share the font source.
#[derive(Clone)]
pub struct LayoutEngine {
    pub canvas: CanvasSpec,
    pub sizes: SizeRange,
    pub fonts: Arc<dyn FontSource>,
}

impl LayoutEngine {
    pub fn new(canvas: CanvasSpec, sizes: SizeRange, fonts: Arc<dyn FontSource>) -> Self {
        Self {
            canvas,
            sizes,
            fonts,
        }
    }

    pub fn render_card(&self, card: &NameCard) -> Result<RenderOutcome, LayoutError> {
        let lines = card.lines();
        let raw: Vec<&str> = lines.iter().map(TextLine::as_str).collect();
        render(&raw, &self.canvas, &self.sizes, self.fonts.as_ref())
    }

    /// Layout without painting, for previews.
    pub fn plan(&self, card: &NameCard) -> Result<Option<FittedLayout>, LayoutError> {
        self.canvas.validate()?;
        self.sizes.validate()?;
        let lines = card.lines();
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(fit(&lines, &self.canvas, &self.sizes, self.fonts.acquire()))
    }
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("canvas", &self.canvas)
            .field("sizes", &self.sizes)
            .finish_non_exhaustive()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compositor::ink_bounds;
    use crate::layout::font_metrics::BuiltinFontSource;

    fn render_builtin(lines: &[&str], canvas: &CanvasSpec) -> Result<RenderOutcome, LayoutError> {
        render(lines, canvas, &SizeRange::default(), &BuiltinFontSource)
    }

    fn rendered(outcome: RenderOutcome) -> (RenderedImage, FittedLayout) {
        match outcome {
            RenderOutcome::Rendered { image, layout } => (image, layout),
            RenderOutcome::NoContent => panic!("expected an image"),
        }
    }

    #[test]
    fn test_scenario_single_line_left_aligned_and_centered() {
        let canvas = CanvasSpec::default();
        let (image, layout) = rendered(render_builtin(&["John"], &canvas).unwrap());
        assert_eq!((image.width(), image.height()), (3508, 2480));
        assert_eq!(layout.placements.len(), 1);

        let (x0, y0, _, y1) = ink_bounds(&image).unwrap();
        assert_eq!(x0, 175);
        let top_gap = y0 as i64 - canvas.margin_y() as i64;
        let bottom_gap = (canvas.height - canvas.margin_y()) as i64 - y1 as i64;
        assert!((top_gap - bottom_gap).abs() <= 1, "block not vertically centered");
    }

    #[test]
    fn test_scenario_longer_second_line_governs_size() {
        let canvas = CanvasSpec::default();
        let (_, layout) = rendered(render_builtin(&["alexander", "christopherson"], &canvas).unwrap());
        let solo = fit(
            &lines::normalize_lines(&["christopherson"]),
            &canvas,
            &SizeRange::default(),
            Arc::new(FontFace::Builtin),
        )
        .unwrap();
        assert_eq!(layout.size(), solo.size());
        assert_eq!(layout.placements[1].width, layout.search.width_at_size);
        assert_eq!(
            layout.block_height,
            layout.placements[0].height + layout.placements[1].height + layout.spacing
        );
    }

    #[test]
    fn test_scenario_missing_font_asset_still_renders() {
        let fonts = FileFontSource::new(["/no/such/font.ttf"]);
        let outcome = render(&["John"], &CanvasSpec::default(), &SizeRange::default(), &fonts).unwrap();
        let (_, layout) = rendered(outcome);
        assert!(layout.font.face().is_builtin());
        let expected = rendered(render_builtin(&["John"], &CanvasSpec::default()).unwrap()).1;
        assert_eq!(layout.size(), expected.size());
    }

    #[test]
    fn test_scenario_zero_width_is_configuration_error() {
        let err = render_builtin(&["John"], &CanvasSpec::new(0, 2480)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidCanvas(_)));
    }

    #[test]
    fn test_empty_input_is_no_content() {
        let outcome = render_builtin(&[], &CanvasSpec::default()).unwrap();
        assert!(matches!(outcome, RenderOutcome::NoContent));
        let outcome = render_builtin(&["  ", ""], &CanvasSpec::default()).unwrap();
        assert!(matches!(outcome, RenderOutcome::NoContent));
    }

    #[test]
    fn test_system_font_render_respects_width_limit() {
        let fonts = FileFontSource::default();
        if fonts.load_face().is_none() {
            eprintln!("no system TrueType font found; skipping");
            return;
        }
        let canvas = CanvasSpec::new(1200, 800);
        let outcome = render(&["alexander", "christopherson"], &canvas, &SizeRange::default(), &fonts).unwrap();
        let (image, layout) = rendered(outcome);

        assert!(!layout.font.face().is_builtin());
        assert!(!layout.search.fallback);
        assert!(layout.search.width_at_size as f32 <= canvas.width_limit());
        assert_eq!(layout.placements[1].width, layout.search.width_at_size);

        let next = FontCandidate::new(fonts.acquire(), layout.size() + 10)
            .measure("CHRISTOPHERSON")
            .width();
        assert!(next as f32 > canvas.width_limit() || layout.size() == 790);

        // Antialiased edge pixels may round back to white.
        let (x0, _, _, _) = ink_bounds(&image).unwrap();
        assert!((canvas.margin_x()..=canvas.margin_x() + 1).contains(&x0));
    }

    #[test]
    fn test_oversized_canvas_is_an_error_not_an_abort() {
        let canvas = CanvasSpec::new(200_000, 200_000);
        let err = render_builtin(&["A"], &canvas).unwrap_err();
        assert!(matches!(err, LayoutError::CanvasTooLarge { .. }));
    }

    #[test]
    fn test_render_is_idempotent() {
        let canvas = CanvasSpec::new(1200, 800);
        let (a, _) = rendered(render_builtin(&["Ada", "Lovelace"], &canvas).unwrap());
        let (b, _) = rendered(render_builtin(&["Ada", "Lovelace"], &canvas).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_width_within_limit_or_fallback() {
        let canvas = CanvasSpec::new(800, 600);
        for name in ["A", "JOHN", "CHRISTOPHERSON", "WOLFESCHLEGELSTEINHAUSENBERGERDORFF"] {
            let (_, layout) = rendered(render_builtin(&[name], &canvas).unwrap());
            let width = layout.placements[0].width as f32;
            assert!(
                width <= canvas.width_limit() || layout.size() == SizeRange::default().min,
                "{name}: width {width} exceeds limit at size {}",
                layout.size()
            );
        }
    }

    #[test]
    fn test_tiny_canvas_uses_smallest_size() {
        let canvas = CanvasSpec::new(100, 100);
        let (_, layout) = rendered(render_builtin(&["CHRISTOPHERSON"], &canvas).unwrap());
        assert_eq!(layout.size(), 50);
        assert!(layout.search.fallback);
    }

    #[test]
    fn test_engine_plan_matches_render() {
        let engine = LayoutEngine::new(
            CanvasSpec::new(1000, 700),
            SizeRange::default(),
            Arc::new(BuiltinFontSource),
        );
        let card = NameCard::new("grace", "hopper");
        let planned = engine.plan(&card).unwrap().unwrap();
        let (_, layout) = rendered(engine.render_card(&card).unwrap());
        assert_eq!(planned.size(), layout.size());
        assert_eq!(planned.start_y, layout.start_y);
    }

    #[test]
    fn test_engine_plan_empty_card_is_none() {
        let engine = LayoutEngine::new(
            CanvasSpec::default(),
            SizeRange::default(),
            Arc::new(BuiltinFontSource),
        );
        assert!(engine.plan(&NameCard::default()).unwrap().is_none());
    }
}
