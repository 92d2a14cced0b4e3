//! Canvas compositor — paints a fitted layout onto a white grayscale bitmap.

use bytes::Bytes;
use image::GrayImage;

use crate::layout::block::FittedLayout;
use crate::layout::canvas::{CanvasSpec, LayoutError};

const BACKGROUND: u8 = 255;
const FOREGROUND: u8 = 0;
const METERS_PER_INCH: f64 = 0.0254;
/// Largest bitmap the compositor will try to allocate (4 GiB of 8-bit pixels).
pub const MAX_CANVAS_PIXELS: u64 = 1 << 32;

/// A finished page bitmap. The engine keeps no reference to it once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    bitmap: GrayImage,
    dpi: u32,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// Encodes the bitmap as 8-bit grayscale PNG with a `pHYs` chunk, so the page
    /// prints at its physical size.
    pub fn to_png(&self) -> Result<Bytes, LayoutError> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width(), self.height());
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let ppu = pixels_per_meter(self.dpi);
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppu,
                yppu: ppu,
                unit: png::Unit::Meter,
            }));
            let mut writer = encoder.write_header()?;
            writer.write_image_data(self.bitmap.as_raw())?;
            writer.finish()?;
        }
        Ok(Bytes::from(buf))
    }
}

fn pixels_per_meter(dpi: u32) -> u32 {
    (f64::from(dpi) / METERS_PER_INCH).round() as u32
}

/// Allocates a white canvas. An allocation the system refuses is an error, not an abort.
fn blank_canvas(canvas: &CanvasSpec) -> Result<GrayImage, LayoutError> {
    let too_large = || LayoutError::CanvasTooLarge {
        width: canvas.width,
        height: canvas.height,
    };
    let len = Some(canvas.pixel_count())
        .filter(|&n| n <= MAX_CANVAS_PIXELS)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or_else(too_large)?;

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).map_err(|_| too_large())?;
    pixels.resize(len, BACKGROUND);
    GrayImage::from_raw(canvas.width, canvas.height, pixels).ok_or_else(too_large)
}

/// Paints every placed line. Each line's tight ink box lands on its placement's (x, y);
/// pixels outside the canvas are clipped.
pub fn composite(layout: &FittedLayout, canvas: &CanvasSpec) -> Result<RenderedImage, LayoutError> {
    let mut bitmap = blank_canvas(canvas)?;
    let (width, height) = (canvas.width as i32, canvas.height as i32);

    for placement in &layout.placements {
        let pen_x = placement.x - placement.bounds.min_x;
        let pen_y = placement.y - placement.bounds.min_y;
        layout
            .font
            .draw(placement.text.as_str(), pen_x, pen_y, |x, y, coverage| {
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }
                let px = bitmap.get_pixel_mut(x as u32, y as u32);
                px.0[0] = blend(px.0[0], coverage);
            });
    }

    Ok(RenderedImage {
        bitmap,
        dpi: canvas.dpi,
    })
}

/// Blends the foreground over `current` at `coverage`; overlapping glyphs only darken.
fn blend(current: u8, coverage: f32) -> u8 {
    let coverage = coverage.clamp(0.0, 1.0);
    let painted = (BACKGROUND as f32 * (1.0 - coverage) + FOREGROUND as f32 * coverage).round() as u8;
    current.min(painted)
}

/// Box around every non-background pixel as `(x0, y0, x1, y1)`, ends exclusive.
#[cfg(test)]
pub(crate) fn ink_bounds(image: &RenderedImage) -> Option<(u32, u32, u32, u32)> {
    let mut found: Option<(u32, u32, u32, u32)> = None;
    for (x, y, image::Luma([v])) in image.bitmap.enumerate_pixels() {
        if *v == BACKGROUND {
            continue;
        }
        found = Some(match found {
            None => (x, y, x + 1, y + 1),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
        });
    }
    found
}
