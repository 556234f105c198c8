//! Text layout: auto-fit size search, greedy wrapping, alignment and glyph rasterization.

pub(crate) mod fit;
pub(crate) mod shaper;

use std::path::{Path, PathBuf};

use crate::foundation::core::{PremulRgba8, Rgba8};
use crate::foundation::error::MediaResult;
use crate::model::frame::{AlignH, AlignV, TextSpec};

pub use fit::{
    FitOutcome, MAX_FIT_ITERATIONS, TextExtent, TextMeasure, fit_font_size, pt_to_px, sanitize,
    wrap_lines,
};

/// Point size used by wrapped text that asks for auto-fit.
pub const WRAP_FALLBACK_PT: f32 = 12.0;

/// Premultiplied coverage of one shaped string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied pixels.
    pub pixels: Vec<PremulRgba8>,
}

impl GlyphBitmap {
    /// Zero-sized bitmap.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A glyph bitmap positioned relative to its frame's origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedBitmap {
    /// Rasterized text.
    pub bitmap: GlyphBitmap,
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
}

/// Pixel rectangle with a signed origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Rectangle at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// `true` when no pixel is covered.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same rectangle moved by `(dx, dy)`.
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Overlap of two rectangles, `None` when they do not touch.
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + i64::from(self.width)).min(other.x + i64::from(other.width));
        let y1 = (self.y + i64::from(self.height)).min(other.y + i64::from(other.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Self {
            x: x0,
            y: y0,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// A measurer that can also paint what it measures.
pub trait TextRaster: TextMeasure {
    /// Rasterize the part of `text` inside `window`, given in pixels relative to the text's
    /// top-left corner. The bitmap is exactly `window` sized.
    fn rasterize(
        &mut self,
        text: &str,
        size_px: f32,
        color: Rgba8,
        window: PixelRect,
    ) -> MediaResult<GlyphBitmap>;
}

/// Frame rectangle the text is laid out in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextBox {
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Border thickness, inset on every side.
    pub inset: u32,
    /// Part of the output canvas, relative to the frame's origin. Text outside it is never
    /// rasterized.
    pub visible: PixelRect,
}

impl TextBox {
    /// Box whose whole area is visible.
    pub fn new(width: u32, height: u32, inset: u32) -> Self {
        Self {
            width,
            height,
            inset,
            visible: PixelRect::sized(width, height),
        }
    }
}

fn available(edge: u32, pad: u32, inset: u32) -> u32 {
    let used = 2 * (u64::from(pad) + u64::from(inset));
    u64::from(edge).saturating_sub(used) as u32
}

/// Lay out `text` inside `bx`, returning bitmaps in paint order.
///
/// Non-wrapped text is sanitized and drawn as one block, auto-fitted when its size is 0.
/// Wrapped text is broken into lines at the available width and stacked line by line.
pub fn layout<R: TextRaster + ?Sized>(
    text: &TextSpec,
    bx: TextBox,
    raster: &mut R,
) -> MediaResult<Vec<PlacedBitmap>> {
    if text.string.is_empty() {
        return Ok(Vec::new());
    }

    let dpi = text.effective_dpi();
    let avail_w = available(bx.width, text.pad_x, bx.inset);
    let avail_h = available(bx.height, text.pad_y, bx.inset);

    let (lines, size_px) = if text.wrap {
        let size_pt = if text.font_size > 0.0 {
            text.font_size
        } else {
            WRAP_FALLBACK_PT
        };
        let size_px = pt_to_px(size_pt, dpi);
        (wrap_lines(raster, &text.string, avail_w, size_px)?, size_px)
    } else {
        let block = sanitize(&text.string);
        let size_pt = if text.is_auto_fit() {
            if avail_w == 0 || avail_h == 0 {
                tracing::debug!(avail_w, avail_h, "no room for auto-fit text");
                return Ok(Vec::new());
            }
            fit_font_size(raster, &block, avail_w, avail_h, dpi)?.size_pt
        } else {
            text.font_size
        };
        (vec![block], pt_to_px(size_pt, dpi))
    };

    if !size_px.is_finite() || size_px <= 0.0 {
        return Ok(Vec::new());
    }

    let mut extents = Vec::with_capacity(lines.len());
    for line in &lines {
        let extent = if line.is_empty() {
            TextExtent {
                width: 0.0,
                height: raster.measure(" ", size_px)?.height,
            }
        } else {
            raster.measure(line, size_px)?
        };
        extents.push(extent);
    }
    let text_w = f64::from(extents.iter().map(|e| e.width).fold(0.0f32, f32::max));
    let text_h: f64 = extents.iter().map(|e| f64::from(e.height)).sum();

    let w = f64::from(bx.width);
    let h = f64::from(bx.height);
    let inset = f64::from(bx.inset);
    let x = match text.align_h {
        AlignH::Left => f64::from(text.pad_x) + inset,
        AlignH::Right => w - f64::from(text.pad_x) - inset - text_w,
        AlignH::Center => w / 2.0 - text_w / 2.0,
    };
    let y = match text.align_v {
        AlignV::Top => f64::from(text.pad_y) + inset,
        AlignV::Bottom => h - f64::from(text.pad_y) - inset - text_h,
        AlignV::Center => h / 2.0 - text_h / 2.0,
    };

    let color = text.text_color();
    let mut placed = Vec::with_capacity(lines.len());
    let mut cursor = y;
    for (line, extent) in lines.iter().zip(&extents) {
        let (left, top) = (x.round() as i64, cursor.round() as i64);
        cursor += f64::from(extent.height);
        if line.is_empty() {
            continue;
        }

        let full = PixelRect::sized(extent.width.ceil() as u32, extent.height.ceil() as u32);
        let Some(window) = full.intersect(bx.visible.offset(-left, -top)) else {
            tracing::trace!(line = %line, "text line outside the canvas");
            continue;
        };
        let bitmap = raster.rasterize(line, size_px, color, window)?;
        if bitmap.width > 0 && bitmap.height > 0 {
            placed.push(PlacedBitmap {
                bitmap,
                x: left + window.x,
                y: top + window.y,
            });
        }
    }
    Ok(placed)
}

/// Produces positioned glyph bitmaps for a frame's text.
pub trait GlyphSource: Send + Sync {
    /// Lay out and rasterize `text` inside `bx`.
    fn layout(&self, text: &TextSpec, bx: TextBox) -> MediaResult<Vec<PlacedBitmap>>;
}

/// `.ttf` files in one directory, shaped with Parley and painted with vello_cpu.
#[derive(Clone, Debug)]
pub struct FontLibrary {
    dir: PathBuf,
    default_font: String,
}

impl FontLibrary {
    /// Fonts resolve as `<dir>/<name>.ttf`; `default_font` is used when a text names none.
    pub fn new(dir: impl Into<PathBuf>, default_font: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_font: default_font.into(),
        }
    }

    /// Font directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the font file for `name`.
    pub fn font_file(&self, name: Option<&str>) -> PathBuf {
        let name = name.unwrap_or(&self.default_font);
        self.dir.join(format!("{name}.ttf"))
    }
}

impl GlyphSource for FontLibrary {
    fn layout(&self, text: &TextSpec, bx: TextBox) -> MediaResult<Vec<PlacedBitmap>> {
        if text.string.is_empty() {
            return Ok(Vec::new());
        }
        let path = self.font_file(text.font_name.as_deref());
        shaper::with_font(&path, |face| layout(text, bx, face))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
