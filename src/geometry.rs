//! Geometric normalization: resize-to-cover plus center-crop.
//!
//! Every accepted upload leaves this module at exactly the configured
//! target dimensions. The image is first scaled, preserving aspect ratio,
//! so that both dimensions cover the target box, then the centered
//! `target_w x target_h` window is cut out.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{Error, Result};

/// Compute the resize-to-cover dimensions for an image.
///
/// The returned `(width, height)` preserves the source aspect ratio and
/// satisfies `width >= target_w && height >= target_h`, so the subsequent
/// crop never needs padding.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn cover_dimensions(width: u32, height: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    let target_ratio = f64::from(target_w) / f64::from(target_h);
    let image_ratio = f64::from(width) / f64::from(height);

    if image_ratio > target_ratio {
        // Relatively wider than the target: fit height, let width overflow.
        let new_h = target_h;
        let new_w = (f64::from(new_h) * image_ratio).round() as u32;
        (new_w, new_h)
    } else {
        let new_w = target_w;
        let new_h = (f64::from(new_w) / image_ratio).round() as u32;
        (new_w, new_h)
    }
}

/// Normalize an image to exactly `target_w x target_h`.
///
/// Scales with Lanczos3 (resampling quality is part of the output
/// contract, not an optimization knob) and center-crops, truncating
/// fractional crop offsets. The resize is skipped when the source already
/// matches the cover dimensions, so an already-normalized image passes
/// through pixel-identical.
///
/// # Errors
///
/// Returns [`Error::TooNarrow`] if the *original* width is below
/// `min_width`. Height is never checked.
pub fn normalize(
    image: &RgbImage,
    target_w: u32,
    target_h: u32,
    min_width: u32,
) -> Result<RgbImage> {
    if image.width() < min_width {
        return Err(Error::TooNarrow {
            width: image.width(),
            min_width,
        });
    }

    let (new_w, new_h) = cover_dimensions(image.width(), image.height(), target_w, target_h);

    let resized = if (new_w, new_h) == (image.width(), image.height()) {
        image.clone()
    } else {
        imageops::resize(image, new_w, new_h, FilterType::Lanczos3)
    };

    let left = (new_w - target_w) / 2;
    let top = (new_h - target_h) / 2;

    Ok(imageops::crop_imm(&resized, left, top, target_w, target_h).to_image())
}
