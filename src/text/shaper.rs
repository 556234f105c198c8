use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{MediaError, MediaResult};
use crate::text::fit::{TextExtent, TextMeasure};
use crate::text::{GlyphBitmap, PixelRect, TextRaster};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub(crate) struct TextBrush {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// One font file with a font context holding only that file.
///
/// Families are selected by name, so two weights of one family never share a context.
struct LoadedFont {
    font_ctx: parley::FontContext,
    family: String,
    data: vello_cpu::peniko::FontData,
}

impl LoadedFont {
    fn load(path: &Path) -> MediaResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| MediaError::font(format!("read font '{}': {e}", path.display())))?;
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            MediaError::font(format!("no font families in '{}'", path.display()))
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                MediaError::font(format!("font family in '{}' has no name", path.display()))
            })?
            .to_string();

        tracing::debug!(path = %path.display(), %family, "font registered");
        Ok(Self {
            font_ctx,
            family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        })
    }
}

/// Layout scratch plus the fonts loaded so far, one per thread.
struct Shaper {
    layout_ctx: parley::LayoutContext<TextBrush>,
    fonts: HashMap<PathBuf, LoadedFont>,
}

thread_local! {
    static SHAPER: RefCell<Shaper> = RefCell::new(Shaper {
        layout_ctx: parley::LayoutContext::new(),
        fonts: HashMap::new(),
    });
}

/// A font file bound to this thread's layout context.
pub(crate) struct FontFace<'a> {
    layout_ctx: &'a mut parley::LayoutContext<TextBrush>,
    font: &'a mut LoadedFont,
}

impl FontFace<'_> {
    fn build(&mut self, text: &str, size_px: f32, brush: TextBrush) -> parley::Layout<TextBrush> {
        let family = self.font.family.clone();
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// Run `f` with the font at `path`, loading and caching it for the current thread.
pub(crate) fn with_font<R>(
    path: &Path,
    f: impl FnOnce(&mut FontFace<'_>) -> MediaResult<R>,
) -> MediaResult<R> {
    SHAPER.with(|cell| {
        let mut shaper = cell.borrow_mut();
        let Shaper { layout_ctx, fonts } = &mut *shaper;
        let font = match fonts.entry(path.to_path_buf()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(LoadedFont::load(path)?),
        };
        let mut face = FontFace { layout_ctx, font };
        f(&mut face)
    })
}

impl TextMeasure for FontFace<'_> {
    fn measure(&mut self, text: &str, size_px: f32) -> MediaResult<TextExtent> {
        if text.is_empty() || !size_px.is_finite() || size_px <= 0.0 {
            return Ok(TextExtent::default());
        }
        let layout = self.build(text, size_px, TextBrush::default());
        Ok(TextExtent {
            width: layout.width(),
            height: layout.height(),
        })
    }
}

impl TextRaster for FontFace<'_> {
    fn rasterize(
        &mut self,
        text: &str,
        size_px: f32,
        color: Rgba8,
        window: PixelRect,
    ) -> MediaResult<GlyphBitmap> {
        if text.is_empty() || !size_px.is_finite() || size_px <= 0.0 || window.is_empty() {
            return Ok(GlyphBitmap::empty());
        }
        let w: u16 = window
            .width
            .try_into()
            .map_err(|_| MediaError::render("text window width exceeds u16"))?;
        let h: u16 = window
            .height
            .try_into()
            .map_err(|_| MediaError::render("text window height exceeds u16"))?;

        let layout = self.build(text, size_px, color.into());
        let (dx, dy) = (window.x as f32, window.y as f32);

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                // The context holds this file alone, so every run was shaped with it.
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x - dx,
                    y: g.y - dy,
                });
                ctx.glyph_run(&self.font.data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        let pixels = pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();

        Ok(GlyphBitmap {
            width: u32::from(w),
            height: u32::from(h),
            pixels,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/shaper.rs"]
mod tests;
