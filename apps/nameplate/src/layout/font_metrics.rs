//! Text measurement — font faces, font sources, and tight pixel bounding boxes.
//!
//! A `FontSource` yields a `FontFace` once per render call. TrueType faces are
//! rasterized with rusttype; when no configured font file can be loaded the
//! source falls back to the built-in block face, which is drawn from static
//! 5×7 glyph tables and scales linearly with the requested size.
//!
//! Coordinates are in pixels with the pen origin at the top-left of the line box
//! (y grows downward), so a measured box can be placed anywhere by translation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusttype::{point, Font, Scale};
use tracing::{debug, warn};

// ────────────────────────────────────────────────────────────────────────────
// Bounding boxes
// ────────────────────────────────────────────────────────────────────────────

/// Tight ink bounding box of a rendered string, relative to the pen origin.
/// `max_*` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TextBounds {
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    fn union(self, other: TextBounds) -> TextBounds {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        TextBounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font faces and candidates
// ────────────────────────────────────────────────────────────────────────────

/// A loaded font face, independent of size.
pub enum FontFace {
    TrueType { font: Font<'static>, origin: PathBuf },
    /// Built-in block face used when no font file can be loaded.
    Builtin,
}

impl FontFace {
    /// Human-readable face name for logs and previews.
    pub fn name(&self) -> String {
        match self {
            FontFace::TrueType { origin, .. } => origin.display().to_string(),
            FontFace::Builtin => "builtin".to_string(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, FontFace::Builtin)
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FontFace").field(&self.name()).finish()
    }
}

/// A font face at a specific integer size (em size in pixels).
#[derive(Debug, Clone)]
pub struct FontCandidate {
    face: Arc<FontFace>,
    size: u32,
}

impl FontCandidate {
    pub fn new(face: Arc<FontFace>, size: u32) -> Self {
        Self { face, size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    /// Tight pixel bounding box of `text` drawn with the pen at (0, 0).
    pub fn measure(&self, text: &str) -> TextBounds {
        let mut bounds = TextBounds::default();
        self.for_each_glyph_box(text, 0, 0, |b| bounds = bounds.union(b));
        bounds
    }

    /// Rasterizes `text` with the pen at (`pen_x`, `pen_y`), calling `plot(x, y, coverage)`
    /// for every touched pixel. Coverage is in 0.0..=1.0.
    pub fn draw<F>(&self, text: &str, pen_x: i32, pen_y: i32, mut plot: F)
    where
        F: FnMut(i32, i32, f32),
    {
        match self.face.as_ref() {
            FontFace::TrueType { font, .. } => {
                let (scale, ascent) = truetype_scale(font, self.size);
                let origin = point(pen_x as f32, pen_y as f32 + ascent);
                for glyph in font.layout(text, scale, origin) {
                    if let Some(bb) = glyph.pixel_bounding_box() {
                        glyph.draw(|gx, gy, v| plot(bb.min.x + gx as i32, bb.min.y + gy as i32, v));
                    }
                }
            }
            FontFace::Builtin => {
                let unit = builtin_unit(self.size);
                for cell in builtin_cells(text, unit) {
                    let x0 = pen_x + cell.x;
                    let y0 = pen_y + cell.y;
                    for y in y0..y0 + unit {
                        for x in x0..x0 + unit {
                            plot(x, y, 1.0);
                        }
                    }
                }
            }
        }
    }

    fn for_each_glyph_box<F>(&self, text: &str, pen_x: i32, pen_y: i32, mut f: F)
    where
        F: FnMut(TextBounds),
    {
        match self.face.as_ref() {
            FontFace::TrueType { font, .. } => {
                let (scale, ascent) = truetype_scale(font, self.size);
                let origin = point(pen_x as f32, pen_y as f32 + ascent);
                for glyph in font.layout(text, scale, origin) {
                    if let Some(bb) = glyph.pixel_bounding_box() {
                        f(TextBounds {
                            min_x: bb.min.x,
                            min_y: bb.min.y,
                            max_x: bb.max.x,
                            max_y: bb.max.y,
                        });
                    }
                }
            }
            FontFace::Builtin => {
                let unit = builtin_unit(self.size);
                for cell in builtin_cells(text, unit) {
                    f(TextBounds {
                        min_x: pen_x + cell.x,
                        min_y: pen_y + cell.y,
                        max_x: pen_x + cell.x + unit,
                        max_y: pen_y + cell.y + unit,
                    });
                }
            }
        }
    }
}

/// Maps an em size in pixels to a rusttype scale (which is expressed as the
/// ascent-to-descent height) and returns the scaled ascent.
fn truetype_scale(font: &Font<'static>, size: u32) -> (Scale, f32) {
    let unscaled = font.v_metrics_unscaled();
    let units_per_em = f32::from(font.units_per_em().max(1));
    let line_height_units = (unscaled.ascent - unscaled.descent).max(1.0);
    let scale = Scale::uniform(size as f32 * line_height_units / units_per_em);
    let ascent = font.v_metrics(scale).ascent;
    (scale, ascent)
}

// ────────────────────────────────────────────────────────────────────────────
// Font sources
// ────────────────────────────────────────────────────────────────────────────

/// Where font faces come from. Implementations are consulted once per render call.
pub trait FontSource: Send + Sync {
    /// Loads the preferred face, or `None` when it is unavailable.
    fn load_face(&self) -> Option<FontFace>;

    /// Loads the preferred face, substituting the built-in face when unavailable.
    fn acquire(&self) -> Arc<FontFace> {
        match self.load_face() {
            Some(face) => Arc::new(face),
            None => {
                warn!("No usable font file found; falling back to the built-in face");
                Arc::new(FontFace::Builtin)
            }
        }
    }

    /// The font at `size`. Never fails: unavailability resolves to the built-in face.
    fn font_at(&self, size: u32) -> FontCandidate {
        FontCandidate::new(self.acquire(), size)
    }
}

/// Search list used when no explicit font paths are configured.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    r"C:\Windows\Fonts\arial.ttf",
    r"C:\Windows\Fonts\calibri.ttf",
    "arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
];

/// Loads the first readable, parseable TrueType/OpenType file from an ordered list.
#[derive(Debug, Clone)]
pub struct FileFontSource {
    paths: Vec<PathBuf>,
}

impl FileFontSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    fn try_load(path: &Path) -> Option<FontFace> {
        if !path.exists() {
            debug!(path = %path.display(), "Font file not present");
            return None;
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), "Failed to read font file: {e}");
                return None;
            }
        };
        match Font::try_from_vec(bytes) {
            Some(font) => Some(FontFace::TrueType {
                font,
                origin: path.to_path_buf(),
            }),
            None => {
                warn!(path = %path.display(), "File is not a usable font");
                None
            }
        }
    }
}

impl Default for FileFontSource {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_PATHS.iter().copied())
    }
}

impl FontSource for FileFontSource {
    fn load_face(&self) -> Option<FontFace> {
        let face = self.paths.iter().find_map(|p| Self::try_load(p))?;
        debug!(font = %face.name(), "Loaded font face");
        Some(face)
    }
}

/// Always yields the built-in face. Deterministic across machines.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFontSource;

impl FontSource for BuiltinFontSource {
    fn load_face(&self) -> Option<FontFace> {
        Some(FontFace::Builtin)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in block face (5×7 cells)
// ────────────────────────────────────────────────────────────────────────────

const CELL_COLUMNS: i32 = 5;
const CELL_ROWS: usize = 7;
/// Pen advance per character, in units: 5 glyph columns + 1 column of spacing.
const ADVANCE_UNITS: i32 = 6;

/// Side length in pixels of one glyph cell at `size`. Cap height is 7 units ≈ 0.7 em.
fn builtin_unit(size: u32) -> i32 {
    (size / 10).max(1) as i32
}

/// Rows are top to bottom; bit 4 is the leftmost column.
#[rustfmt::skip]
static BUILTIN_LETTERS: [[u8; CELL_ROWS]; 26] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];

#[rustfmt::skip]
static BUILTIN_DIGITS: [[u8; CELL_ROWS]; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
];

const BLANK_GLYPH: [u8; CELL_ROWS] = [0; CELL_ROWS];
const MISSING_GLYPH: [u8; CELL_ROWS] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

fn builtin_glyph(c: char) -> [u8; CELL_ROWS] {
    let c = c.to_ascii_uppercase();
    match c {
        'A'..='Z' => BUILTIN_LETTERS[(c as u8 - b'A') as usize],
        '0'..='9' => BUILTIN_DIGITS[(c as u8 - b'0') as usize],
        ' ' => BLANK_GLYPH,
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        c if c.is_whitespace() => BLANK_GLYPH,
        _ => MISSING_GLYPH,
    }
}

/// Top-left corner of one inked cell, relative to the pen origin.
#[derive(Debug, Clone, Copy)]
struct Cell {
    x: i32,
    y: i32,
}

fn builtin_cells(text: &str, unit: i32) -> impl Iterator<Item = Cell> + '_ {
    text.chars().enumerate().flat_map(move |(i, c)| {
        let pen_x = i as i32 * ADVANCE_UNITS * unit;
        let rows = builtin_glyph(c);
        (0..CELL_ROWS).flat_map(move |row| {
            (0..CELL_COLUMNS).filter_map(move |col| {
                let bit = 1u8 << (CELL_COLUMNS - 1 - col);
                (rows[row] & bit != 0).then(|| Cell {
                    x: pen_x + col * unit,
                    y: row as i32 * unit,
                })
            })
        })
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_at(size: u32) -> FontCandidate {
        BuiltinFontSource.font_at(size)
    }

    #[test]
    fn test_builtin_single_letter_bounds() {
        // "H" has ink in every column and row: 5 × 7 units, unit = 10 px at size 100.
        let bounds = builtin_at(100).measure("H");
        assert_eq!(bounds.width(), 50);
        assert_eq!(bounds.height(), 70);
        assert_eq!((bounds.min_x, bounds.min_y), (0, 0));
    }

    #[test]
    fn test_builtin_word_width_includes_spacing() {
        // Four glyphs: 3 full advances (6 units) + one 5-unit glyph = 23 units.
        let bounds = builtin_at(100).measure("JOHN");
        assert_eq!(bounds.width(), 230);
    }

    #[test]
    fn test_builtin_tight_box_skips_blank_columns() {
        // "I" only inks columns 1..=3.
        let bounds = builtin_at(100).measure("I");
        assert_eq!(bounds.min_x, 10);
        assert_eq!(bounds.width(), 30);
    }

    #[test]
    fn test_measure_empty_string_is_empty() {
        assert!(builtin_at(100).measure("").is_empty());
        assert!(builtin_at(100).measure("   ").is_empty());
    }

    #[test]
    fn test_builtin_width_monotonic_in_size() {
        let mut previous = 0;
        for size in (50..800).step_by(10) {
            let width = builtin_at(size).measure("CHRISTOPHERSON").width();
            assert!(width >= previous, "width shrank at size {size}");
            previous = width;
        }
    }

    #[test]
    fn test_builtin_measure_is_deterministic() {
        let a = builtin_at(370).measure("ALEXANDER");
        let b = builtin_at(370).measure("ALEXANDER");
        assert_eq!(a, b);
    }

    #[test]
    fn test_draw_covers_measured_box() {
        let font = builtin_at(20);
        let bounds = font.measure("AB");
        let mut min = (i32::MAX, i32::MAX);
        let mut max = (i32::MIN, i32::MIN);
        font.draw("AB", 0, 0, |x, y, _| {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x + 1), max.1.max(y + 1));
        });
        assert_eq!((min.0, min.1, max.0, max.1), (bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y));
    }

    #[test]
    fn test_missing_font_paths_fall_back_to_builtin() {
        let source = FileFontSource::new(["/definitely/not/here.ttf"]);
        assert!(source.load_face().is_none());
        assert!(source.font_at(100).face().is_builtin());
    }

    #[test]
    fn test_unparseable_font_file_falls_back_to_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a font").unwrap();
        let source = FileFontSource::new([file.path()]);
        assert!(source.acquire().is_builtin());
    }

    // ── TrueType faces ──
    // These load a system font from the default search list and are skipped on
    // machines that have none of them installed.

    fn system_face() -> Option<Arc<FontFace>> {
        match FileFontSource::default().load_face() {
            Some(face) => Some(Arc::new(face)),
            None => {
                eprintln!("no system TrueType font found; skipping");
                None
            }
        }
    }

    #[test]
    fn test_truetype_width_monotonic_in_size() {
        let Some(face) = system_face() else { return };
        let mut previous = 0;
        for size in (50..800).step_by(10) {
            let width = FontCandidate::new(Arc::clone(&face), size)
                .measure("CHRISTOPHERSON")
                .width();
            assert!(width >= previous, "width shrank at size {size}");
            previous = width;
        }
    }

    #[test]
    fn test_truetype_size_is_em_size() {
        // Latin cap height sits near 0.7 em in the default faces.
        let Some(face) = system_face() else { return };
        let height = FontCandidate::new(face, 100).measure("H").height();
        assert!((60..=80).contains(&height), "cap height {height} at em size 100");
    }

    #[test]
    fn test_truetype_draw_covers_measured_box() {
        let Some(face) = system_face() else { return };
        let font = FontCandidate::new(face, 120);
        let bounds = font.measure("JOHN");
        assert!(!bounds.is_empty());
        let mut min = (i32::MAX, i32::MAX);
        let mut max = (i32::MIN, i32::MIN);
        font.draw("JOHN", 0, 0, |x, y, _| {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x + 1), max.1.max(y + 1));
        });
        assert_eq!((min.0, min.1, max.0, max.1), (bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y));
    }

    #[test]
    fn test_truetype_ink_sits_below_line_top() {
        let Some(face) = system_face() else { return };
        let font = FontCandidate::new(face, 200);
        let bounds = font.measure("A");
        // Ink starts below the pen origin because the origin is the top of the line box.
        assert!(bounds.min_y >= 0);
        assert!(bounds.width() > 0);
    }

    #[test]
    fn test_unknown_glyph_renders_box() {
        let bounds = builtin_at(10).measure("\u{00DF}");
        assert_eq!((bounds.width(), bounds.height()), (5, 7));
    }
}
