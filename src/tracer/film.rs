//! Presentation of accumulated frames

use glam::{Vec3, Vec4};
use image::{ImageBuffer, ImageResult, Rgb, RgbImage};
use std::path::Path;

/// Average and gamma-correct an accumulator: `pow(rgb / w, 1 / gamma)`.
///
/// `accum` is row-major from the top. Pixels that never recorded an event,
/// or have no entry, stay black.
pub fn present(accum: &[Vec4], width: u32, height: u32, gamma: f32) -> RgbImage {
    let inv_gamma = 1.0 / gamma;
    ImageBuffer::from_fn(width, height, |x, y| {
        let index = y as usize * width as usize + x as usize;
        let pixel = accum.get(index).copied().unwrap_or(Vec4::ZERO);
        if pixel.w <= 0.0 {
            return Rgb([0, 0, 0]);
        }
        let rgb = (pixel.truncate() / pixel.w).max(Vec3::ZERO).powf(inv_gamma);
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb([byte(rgb.x), byte(rgb.y), byte(rgb.z)])
    })
}

/// Write `image` to `path`; the format follows the extension (`.png`, `.ppm`)
pub fn save(image: &RgbImage, path: impl AsRef<Path>) -> ImageResult<()> {
    image.save(path)
}
