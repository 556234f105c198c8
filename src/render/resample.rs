use image::RgbaImage;
use image::imageops::FilterType;

use crate::foundation::error::{MediaError, MediaResult};
use crate::foundation::math::round_to_u32;

/// Output size for fitting `width x height` into `budget` pixels with the same aspect ratio.
///
/// Images already within the budget keep their size; scaled edges never drop below 1.
pub fn target_dimensions(width: u32, height: u32, budget: u64) -> MediaResult<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(MediaError::validation(format!(
            "cannot resample a {width}x{height} image"
        )));
    }
    if budget == 0 {
        return Err(MediaError::validation("pixel budget must be > 0"));
    }
    let pixels = u64::from(width) * u64::from(height);
    if pixels <= budget {
        return Ok((width, height));
    }

    let scale = (budget as f64 / pixels as f64).sqrt();
    let w = round_to_u32(f64::from(width) * scale).max(1);
    let h = round_to_u32(f64::from(height) * scale).max(1);
    Ok((w, h))
}

/// Aspect-preserving bilinear downscale to roughly `budget` pixels.
pub fn downscale(img: &RgbaImage, budget: u64) -> MediaResult<RgbaImage> {
    let (w, h) = target_dimensions(img.width(), img.height(), budget)?;
    if (w, h) == img.dimensions() {
        return Ok(img.clone());
    }
    Ok(image::imageops::resize(img, w, h, FilterType::Triangle))
}

#[cfg(test)]
#[path = "../../tests/unit/render/resample.rs"]
mod tests;
