use image::RgbaImage;

use crate::foundation::core::PremulRgba8;
use crate::foundation::error::{MediaError, MediaResult};
use crate::foundation::math::{mul_div255_u8, unpremul_u8};

/// Source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let inv = 255u16 - u16::from(sa);
            let mut out = [0u8; 4];
            for i in 0..4 {
                out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
            }
            out
        }
    }
}

/// Premultiplied RGBA8 raster with clipped source-over drawing.
///
/// Coordinates are signed; anything outside `[0,width) x [0,height)` is dropped, which is how
/// overflowing child frames get cropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<PremulRgba8>,
}

/// Intersection of a placed `w x h` rectangle with the canvas, in canvas and source coordinates.
struct Clip {
    dst_x: usize,
    dst_y: usize,
    src_x: usize,
    src_y: usize,
    w: usize,
    h: usize,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            data: vec![[0, 0, 0, 0]; len],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    fn clip(&self, x: i64, y: i64, w: u32, h: u32) -> Option<Clip> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(w)).min(i64::from(self.width));
        let y1 = (y + i64::from(h)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Clip {
            dst_x: x0 as usize,
            dst_y: y0 as usize,
            src_x: (x0 - x) as usize,
            src_y: (y0 - y) as usize,
            w: (x1 - x0) as usize,
            h: (y1 - y0) as usize,
        })
    }

    /// Composite a solid rectangle.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: PremulRgba8) {
        if color[3] == 0 {
            return;
        }
        let Some(c) = self.clip(x, y, w, h) else {
            return;
        };
        let stride = self.width as usize;
        for row in c.dst_y..c.dst_y + c.h {
            let start = row * stride + c.dst_x;
            for px in &mut self.data[start..start + c.w] {
                *px = over(*px, color);
            }
        }
    }

    /// Composite a premultiplied `w x h` buffer with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, x: i64, y: i64, w: u32, h: u32, src: &[PremulRgba8]) -> MediaResult<()> {
        if src.len() != w as usize * h as usize {
            return Err(MediaError::render(format!(
                "blit expects {w}x{h} pixels, got {}",
                src.len()
            )));
        }
        let Some(c) = self.clip(x, y, w, h) else {
            return Ok(());
        };
        let stride = self.width as usize;
        let src_stride = w as usize;
        for row in 0..c.h {
            let d0 = (c.dst_y + row) * stride + c.dst_x;
            let s0 = (c.src_y + row) * src_stride + c.src_x;
            for (d, s) in self.data[d0..d0 + c.w]
                .iter_mut()
                .zip(&src[s0..s0 + c.w])
            {
                *d = over(*d, *s);
            }
        }
        Ok(())
    }

    /// Composite a straight-alpha image with its top-left corner at `(x, y)`.
    pub fn draw_image(&mut self, x: i64, y: i64, img: &RgbaImage) -> MediaResult<()> {
        let pixels: Vec<PremulRgba8> = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                crate::foundation::core::Rgba8::new(r, g, b, a).premul()
            })
            .collect();
        self.blit(x, y, img.width(), img.height(), &pixels)
    }

    /// Straight-alpha copy of the canvas.
    pub fn to_rgba_image(&self) -> MediaResult<RgbaImage> {
        let mut bytes = Vec::with_capacity(self.data.len() * 4);
        for &[r, g, b, a] in &self.data {
            bytes.extend_from_slice(&[unpremul_u8(r, a), unpremul_u8(g, a), unpremul_u8(b, a), a]);
        }
        RgbaImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| MediaError::render("canvas buffer size mismatch"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
