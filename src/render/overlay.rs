use image::RgbaImage;
use vello_cpu::kurbo::{BezPath, Point, RoundedRect, Shape as _};

use crate::foundation::error::{MediaError, MediaResult};
use crate::foundation::math::round_to_u32;
use crate::render::canvas::Canvas;

/// Aspect ratio of the overlay glyph (width / height).
pub const OVERLAY_ASPECT: f64 = 16.0 / 9.0;

/// Rasterize the play-button glyph at `height` pixels, 16:9, premultiplied.
///
/// The glyph is a translucent red rounded rectangle with a white triangle, centred on an
/// otherwise transparent field.
pub fn play_button(height: u32) -> MediaResult<(u32, u32, Vec<[u8; 4]>)> {
    let width = round_to_u32(f64::from(height) * OVERLAY_ASPECT).max(1);
    let w: u16 = width
        .try_into()
        .map_err(|_| MediaError::render("overlay width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| MediaError::render("overlay height exceeds u16"))?;
    if h == 0 {
        return Err(MediaError::render("overlay height must be > 0"));
    }

    let (fw, fh) = (f64::from(w), f64::from(h));
    let (cx, cy) = (fw / 2.0, fh / 2.0);
    let btn_h = fh * 0.2;
    let btn_w = btn_h * 1.42;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(230, 33, 23, 224));
    let body = RoundedRect::new(
        cx - btn_w / 2.0,
        cy - btn_h / 2.0,
        cx + btn_w / 2.0,
        cy + btn_h / 2.0,
        btn_h * 0.25,
    );
    ctx.fill_path(&body.to_path(0.1));

    let tri = btn_h * 0.5;
    let mut arrow = BezPath::new();
    arrow.move_to(Point::new(cx - tri * 0.4, cy - tri / 2.0));
    arrow.line_to(Point::new(cx + tri * 0.55, cy));
    arrow.line_to(Point::new(cx - tri * 0.4, cy + tri / 2.0));
    arrow.close_path();
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    ctx.fill_path(&arrow);
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    let pixels = pixmap
        .data_as_u8_slice()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();
    Ok((u32::from(w), u32::from(h), pixels))
}

/// Composite the play-button glyph over `img`, scaled to its height and centred horizontally.
pub fn apply_play_overlay(img: &RgbaImage) -> MediaResult<RgbaImage> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(MediaError::decode("thumbnail has no pixels"));
    }
    let mut canvas = Canvas::new(width, height);
    canvas.draw_image(0, 0, img)?;

    let (ow, oh, glyph) = play_button(height)?;
    let x = (i64::from(width) - i64::from(ow)) / 2;
    canvas.blit(x, 0, ow, oh, &glyph)?;
    canvas.to_rgba_image()
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
