//! Watermark box layout and layered compositing.
//!
//! The watermark is a translucent white panel anchored to the bottom-left
//! corner of the image, sized to fit the caption text plus fixed padding,
//! with the text drawn in opaque black on top. The panel is rendered on a
//! transparent overlay the size of the image, alpha-composited over the
//! source with the Porter-Duff "over" operator, and the result flattened
//! to opaque RGB for JPEG encoding.
//!
//! Box geometry is intentionally *not* clamped to the image: a caption
//! wider or taller than the image produces a box extending past the edge,
//! and only the pixel writes clip. This mirrors the deployed behavior.

use image::{Rgb, Rgba, RgbaImage, RgbImage};

use crate::font::FontFace;

/// Watermark font size in pixels.
pub const FONT_SIZE: f32 = 70.0;

/// Watermark text plus the fixed rendering parameters.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    /// Caption lines, drawn top to bottom. An empty list renders as a
    /// single empty line (the panel is never skipped entirely).
    pub lines: Vec<String>,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color.
    pub text_color: Rgba<u8>,
    /// Panel fill color; alpha 130/255 reads as ~51% opacity.
    pub box_fill: Rgba<u8>,
    /// Extra vertical space between lines, in pixels.
    pub line_spacing: f32,
    /// Panel padding: top, bottom, left, right.
    pub padding: Padding,
}

/// Per-side padding of the watermark panel.
#[derive(Debug, Clone, Copy)]
pub struct Padding {
    /// Space above the first line.
    pub top: f32,
    /// Space below the last line.
    pub bottom: f32,
    /// Space left of the text block.
    pub left: f32,
    /// Space right of the text block.
    pub right: f32,
}

impl WatermarkSpec {
    /// A spec with the deployed constants: 70px black text on white at
    /// 51% opacity, 2px line spacing, 10/10/10/60 padding.
    #[must_use]
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            font_size: FONT_SIZE,
            text_color: Rgba([0, 0, 0, 255]),
            box_fill: Rgba([255, 255, 255, 130]),
            line_spacing: 2.0,
            padding: Padding {
                top: 10.0,
                bottom: 10.0,
                left: 10.0,
                right: 60.0,
            },
        }
    }
}

/// Computed panel geometry, in image coordinates.
///
/// `top` may be negative and `width` may exceed the image width; see the
/// module docs.
#[derive(Debug, Clone, Copy)]
pub struct BoxLayout {
    /// Vertical space per line including spacing.
    pub line_height: f32,
    /// Panel width (text block + left/right padding).
    pub width: f32,
    /// Panel height (text block + top/bottom padding).
    pub height: f32,
    /// Y of the panel's top edge; the bottom edge is the image height.
    pub top: f32,
}

/// Size and place the watermark panel for an image of the given height.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn layout(spec: &WatermarkSpec, font: &FontFace, image_height: u32) -> BoxLayout {
    let line_height = font.line_height(spec.line_spacing);

    let line_count = spec.lines.len().max(1);
    // No trailing spacing after the last line.
    let block_height = line_count as f32 * line_height - spec.line_spacing;
    let block_width = spec
        .lines
        .iter()
        .map(|line| font.line_width(line))
        .fold(0.0f32, f32::max);

    let width = block_width + spec.padding.left + spec.padding.right;
    let height = block_height + spec.padding.top + spec.padding.bottom;

    BoxLayout {
        line_height,
        width,
        height,
        top: image_height as f32 - height,
    }
}

/// Composite the watermark panel onto an image.
///
/// Always succeeds: font problems were already absorbed during font
/// resolution, and out-of-bounds panel pixels are dropped. The returned
/// image is fully opaque and has the same dimensions as the input.
#[must_use]
pub fn composite(image: RgbImage, spec: &WatermarkSpec, font: &FontFace) -> RgbImage {
    let layout = layout(spec, font, image.height());

    let mut overlay = RgbaImage::new(image.width(), image.height());
    fill_box(&mut overlay, &layout, spec.box_fill);

    let mut cursor_y = layout.top + spec.padding.top;
    for line in &spec.lines {
        font.draw_line(&mut overlay, spec.padding.left, cursor_y, line, spec.text_color);
        cursor_y += layout.line_height;
    }

    flatten(image, &overlay)
}

/// Fill the panel rectangle on the overlay, clipping to the canvas.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill_box(overlay: &mut RgbaImage, layout: &BoxLayout, fill: Rgba<u8>) {
    let right = (layout.width.round() as i64).min(i64::from(overlay.width()));
    let top = (layout.top.round() as i64).max(0);
    let bottom = i64::from(overlay.height());

    for y in top..bottom {
        for x in 0..right {
            overlay.put_pixel(x as u32, y as u32, fill);
        }
    }
}

/// Alpha-composite the overlay over the opaque base and drop the alpha
/// channel. With an opaque destination the "over" operator reduces to a
/// straight lerp by the source alpha.
fn flatten(mut base: RgbImage, overlay: &RgbaImage) -> RgbImage {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());

    for (base_px, over_px) in base.pixels_mut().zip(overlay.pixels()) {
        if over_px[3] == 0 {
            continue;
        }
        let alpha = f32::from(over_px[3]) / 255.0;
        let inv = 1.0 - alpha;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mix = |s: u8, d: u8| -> u8 {
            (f32::from(s) * alpha + f32::from(d) * inv)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        *base_px = Rgb([
            mix(over_px[0], base_px[0]),
            mix(over_px[1], base_px[1]),
            mix(over_px[2], base_px[2]),
        ]);
    }

    base
}

/// Porter-Duff "over" with straight alpha, used while building the
/// overlay (text coverage over the panel fill).
#[must_use]
pub(crate) fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let src_a = f32::from(src[3]) / 255.0;
    let dst_a = f32::from(dst[3]) / 255.0;

    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channel = |s: u8, d: u8| -> u8 {
        let s = f32::from(s) / 255.0;
        let d = f32::from(d) / 255.0;
        let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        (out * 255.0).round().clamp(0.0, 255.0) as u8
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let alpha = (out_a * 255.0).round() as u8;

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        alpha,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_lines(n: usize) -> WatermarkSpec {
        WatermarkSpec::new((0..n).map(|i| format!("Line {i}")).collect())
    }

    #[test]
    fn box_height_scales_linearly_with_line_count() {
        let font = FontFace::Builtin;
        for n in 1..6 {
            let a = layout(&spec_with_lines(n), &font, 500);
            let b = layout(&spec_with_lines(n + 1), &font, 500);
            assert!(
                ((b.height - a.height) - a.line_height).abs() < 1e-4,
                "height step for n={n} was {}",
                b.height - a.height
            );
        }
    }

    #[test]
    fn box_is_anchored_bottom_left() {
        let font = FontFace::Builtin;
        for image_height in [100u32, 2250, 9000] {
            let l = layout(&spec_with_lines(3), &font, image_height);
            // Bottom edge sits exactly on the image height.
            #[allow(clippy::cast_precision_loss)]
            let bottom = image_height as f32;
            assert!((l.top + l.height - bottom).abs() < 1e-3);
        }
    }

    #[test]
    fn box_width_tracks_longest_line() {
        let font = FontFace::Builtin;
        let spec = WatermarkSpec::new(vec![
            "short".to_string(),
            "a much longer caption line".to_string(),
            String::new(),
        ]);
        let l = layout(&spec, &font, 500);
        let longest = font.line_width("a much longer caption line");
        assert!((l.width - (longest + 10.0 + 60.0)).abs() < 1e-4);
    }

    #[test]
    fn empty_line_list_still_produces_a_panel() {
        let font = FontFace::Builtin;
        let l = layout(&WatermarkSpec::new(Vec::new()), &font, 500);
        // One empty line: paddings plus a single line height minus spacing.
        assert!(l.height > 10.0 + 10.0);
        assert!((l.width - (10.0 + 60.0)).abs() < 1e-4);
    }

    #[test]
    fn composite_preserves_dimensions_and_lightens_corner() {
        let image = RgbImage::new(300, 200); // all black
        let spec = WatermarkSpec::new(vec!["Latitude: 12.34".to_string()]);
        let out = composite(image, &spec, &FontFace::Builtin);

        assert_eq!(out.dimensions(), (300, 200));

        // Inside the panel: white at 130/255 over black is ~130.
        let panel = out.get_pixel(3, 195);
        assert!(panel[0] > 100, "panel fill missing, got {panel:?}");

        // Far corner untouched.
        assert_eq!(*out.get_pixel(299, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn composite_with_oversized_box_clips_instead_of_panicking() {
        let image = RgbImage::new(20, 10);
        let spec = WatermarkSpec::new(vec![
            "a line far wider than a twenty pixel image".to_string();
            8
        ]);
        let out = composite(image, &spec, &FontFace::Builtin);
        assert_eq!(out.dimensions(), (20, 10));
        // The whole image sits under the panel.
        assert!(out.pixels().all(|p| p[0] > 100));
    }

    #[test]
    fn blend_over_full_alpha_replaces_destination() {
        let out = blend_over(Rgba([255, 255, 255, 130]), Rgba([0, 0, 0, 255]));
        assert_eq!(out, Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn blend_over_half_alpha_mixes() {
        let out = blend_over(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 130]));
        assert_eq!(out[3], 255);
        assert!((i32::from(out[0]) - 130).abs() <= 1);
    }

    #[test]
    fn blend_over_transparent_source_is_identity() {
        let dst = Rgba([10, 20, 30, 200]);
        assert_eq!(blend_over(dst, Rgba([0, 0, 0, 0])), dst);
    }
}
