use image::RgbaImage;
use image::imageops::FilterType;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{MediaError, MediaResult};
use crate::model::frame::FrameSpec;
use crate::render::canvas::Canvas;
use crate::store::content::ContentStore;
use crate::store::tier::Tier;
use crate::text::{GlyphSource, PixelRect, TextBox};

/// Paints a [`FrameSpec`] tree into a single image.
///
/// Background images are read from the full tier of `images`; text goes through `glyphs`.
pub struct Compositor<'a, G: GlyphSource + ?Sized> {
    images: &'a ContentStore,
    glyphs: &'a G,
}

impl<'a, G: GlyphSource + ?Sized> Compositor<'a, G> {
    /// Compositor reading background images from `images`.
    pub fn new(images: &'a ContentStore, glyphs: &'a G) -> Self {
        Self { images, glyphs }
    }

    /// Render `spec` into a `spec.width x spec.height` image.
    ///
    /// The root's own offset shifts everything it paints; content falling outside the canvas is
    /// clipped.
    pub fn render(&self, spec: &FrameSpec) -> MediaResult<RgbaImage> {
        let mut canvas = Canvas::new(spec.width, spec.height);
        let origin = (i64::from(spec.x_offset), i64::from(spec.y_offset));
        self.paint_node(&mut canvas, spec, origin)?;
        canvas.to_rgba_image()
    }

    fn paint_node(
        &self,
        canvas: &mut Canvas,
        node: &FrameSpec,
        (x, y): (i64, i64),
    ) -> MediaResult<()> {
        if let Some(bg) = node.background {
            canvas.fill_rect(x, y, node.width, node.height, bg.premul());
        }

        if let Some(key) = &node.background_image {
            match self.images.read(Tier::Full, key) {
                Ok(bytes) => {
                    let img = image::load_from_memory(&bytes)
                        .map_err(|e| MediaError::render(format!("background image {key}: {e}")))?
                        .to_rgba8();
                    let img = image::imageops::resize(
                        &img,
                        node.width,
                        node.height,
                        FilterType::Nearest,
                    );
                    canvas.draw_image(x, y, &img)?;
                }
                Err(MediaError::NotFound(_)) => {
                    tracing::warn!(%key, "background image not in store, skipping");
                }
                Err(e) => {
                    return Err(MediaError::render(format!("background image {key}: {e}")));
                }
            }
        }

        if node.border_thickness > 0 {
            paint_border(canvas, node, (x, y));
        }

        if let Some(text) = &node.text {
            let bx = TextBox {
                width: node.width,
                height: node.height,
                inset: node.border_thickness,
                visible: PixelRect::sized(canvas.width(), canvas.height()).offset(-x, -y),
            };
            for placed in self.glyphs.layout(text, bx)? {
                canvas.blit(
                    x + placed.x,
                    y + placed.y,
                    placed.bitmap.width,
                    placed.bitmap.height,
                    &placed.bitmap.pixels,
                )?;
            }
        }

        for child in &node.children {
            let origin = (x + i64::from(child.x_offset), y + i64::from(child.y_offset));
            self.paint_node(canvas, child, origin)?;
        }
        Ok(())
    }
}

/// Four non-overlapping bands of `border_thickness` along the node's edges.
fn paint_border(canvas: &mut Canvas, node: &FrameSpec, (x, y): (i64, i64)) {
    let color = node.border_color.unwrap_or(Rgba8::BLACK).premul();
    let t = node.border_thickness.min(node.width).min(node.height);
    let (w, h) = (node.width, node.height);
    if 2 * t >= h || 2 * t >= w {
        canvas.fill_rect(x, y, w, h, color);
        return;
    }
    let t64 = i64::from(t);
    let inner = h - 2 * t;

    canvas.fill_rect(x, y, w, t, color);
    canvas.fill_rect(x, y + i64::from(h) - t64, w, t, color);
    canvas.fill_rect(x, y + t64, t, inner, color);
    canvas.fill_rect(x + i64::from(w) - t64, y + t64, t, inner, color);
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
