//! Bitmap transforms applied to the logo before tiling.
//!
//! Resize (Lanczos3 via fast_image_resize), rotate with canvas expansion,
//! and alpha fading. All functions take straight-alpha RGBA and return
//! straight-alpha RGBA.

use super::WatermarkError;
use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::{imageops, RgbaImage};
use resvg::tiny_skia;
use std::num::NonZeroU32;

/// Tolerance used when snapping rotated extents to whole pixels.
const EXTENT_EPSILON: f64 = 1e-6;

/// Resize an RGBA bitmap with a Lanczos3 filter.
///
/// Alpha is premultiplied during convolution so transparent pixels do not
/// bleed their color into visible edges.
pub fn resize_lanczos(
    src: &RgbaImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbaImage, WatermarkError> {
    if src.width() == target_w && src.height() == target_h {
        return Ok(src.clone());
    }

    let src_width = NonZeroU32::new(src.width())
        .ok_or_else(|| WatermarkError::ResizeError("Source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(src.height())
        .ok_or_else(|| WatermarkError::ResizeError("Source height is 0".to_string()))?;
    let dst_width = NonZeroU32::new(target_w)
        .ok_or_else(|| WatermarkError::ResizeError("Target width is 0".to_string()))?;
    let dst_height = NonZeroU32::new(target_h)
        .ok_or_else(|| WatermarkError::ResizeError("Target height is 0".to_string()))?;

    let mut src_image = Image::from_vec_u8(
        src_width,
        src_height,
        src.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| WatermarkError::ResizeError(format!("Failed to create source image: {:?}", e)))?;

    let alpha_mul_div = MulDiv::default();
    alpha_mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| WatermarkError::ResizeError(format!("Failed to premultiply: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::ResizeError(format!("Resize operation failed: {:?}", e)))?;

    alpha_mul_div
        .divide_alpha_inplace(&mut dst_image.view_mut())
        .map_err(|e| WatermarkError::ResizeError(format!("Failed to demultiply: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| WatermarkError::ResizeError("Failed to create output image buffer".to_string()))
}

/// Size of the canvas that fully contains a `width x height` bitmap rotated
/// by `angle` degrees.
pub fn rotated_extent(width: u32, height: u32, angle: f32) -> (u32, u32) {
    let radians = (angle as f64).to_radians();
    let (sin, cos) = radians.sin_cos();
    let w = width as f64;
    let h = height as f64;
    let new_w = (w * cos.abs() + h * sin.abs() - EXTENT_EPSILON).ceil();
    let new_h = (w * sin.abs() + h * cos.abs() - EXTENT_EPSILON).ceil();
    (new_w.max(1.0) as u32, new_h.max(1.0) as u32)
}

/// Rotate counter-clockwise by `angle` degrees about the center, expanding
/// the canvas so no corner is clipped.
///
/// Quarter turns are exact pixel permutations; other angles are resampled
/// bilinearly onto a transparent canvas.
pub fn rotate_expand(src: &RgbaImage, angle: f32) -> Result<RgbaImage, WatermarkError> {
    if !angle.is_finite() {
        return Err(WatermarkError::RotateError(format!(
            "angle must be finite, got {}",
            angle
        )));
    }

    let normalized = angle.rem_euclid(360.0);
    // image's rotate helpers turn clockwise
    if normalized == 0.0 {
        return Ok(src.clone());
    } else if normalized == 90.0 {
        return Ok(imageops::rotate270(src));
    } else if normalized == 180.0 {
        return Ok(imageops::rotate180(src));
    } else if normalized == 270.0 {
        return Ok(imageops::rotate90(src));
    }

    rotate_affine(src, normalized)
}

fn rotate_affine(src: &RgbaImage, angle: f32) -> Result<RgbaImage, WatermarkError> {
    let (src_w, src_h) = src.dimensions();
    let (dst_w, dst_h) = rotated_extent(src_w, src_h, angle);

    let mut source = tiny_skia::Pixmap::new(src_w, src_h)
        .ok_or_else(|| WatermarkError::RotateError(format!("invalid source size {}x{}", src_w, src_h)))?;
    for (dst, px) in source.pixels_mut().iter_mut().zip(src.pixels()) {
        let [r, g, b, a] = px.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    let mut canvas = tiny_skia::Pixmap::new(dst_w, dst_h)
        .ok_or_else(|| WatermarkError::RotateError(format!("invalid canvas size {}x{}", dst_w, dst_h)))?;

    // Screen space has y pointing down, so a counter-clockwise turn is a
    // negative angle in the rotation matrix.
    let radians = -(angle as f64).to_radians();
    let (sin, cos) = radians.sin_cos();
    let (cx, cy) = (src_w as f64 / 2.0, src_h as f64 / 2.0);
    let (dx, dy) = (dst_w as f64 / 2.0, dst_h as f64 / 2.0);
    let tx = dx - cos * cx + sin * cy;
    let ty = dy - sin * cx - cos * cy;
    let transform = tiny_skia::Transform::from_row(
        cos as f32,
        sin as f32,
        -sin as f32,
        cos as f32,
        tx as f32,
        ty as f32,
    );

    let paint = tiny_skia::PixmapPaint {
        quality: tiny_skia::FilterQuality::Bilinear,
        ..Default::default()
    };
    canvas.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);

    let mut rgba = Vec::with_capacity(canvas.pixels().len() * 4);
    for pixel in canvas.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    RgbaImage::from_raw(dst_w, dst_h, rgba)
        .ok_or_else(|| WatermarkError::RotateError("rotated buffer has unexpected size".to_string()))
}

/// Multiply every pixel's alpha by `opacity`, leaving color untouched.
///
/// `opacity >= 1.0` is a no-op.
pub fn apply_opacity(image: &mut RgbaImage, opacity: f32) {
    if opacity >= 1.0 {
        return;
    }
    let factor = opacity.max(0.0);
    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * factor).round().clamp(0.0, 255.0) as u8;
    }
}
