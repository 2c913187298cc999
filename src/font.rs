//! Watermark font resolution, metrics, and glyph drawing.
//!
//! Font loading is an ordered strategy list, evaluated until one source
//! succeeds:
//!
//! 1. the configured font file,
//! 2. well-known system font locations,
//! 3. a built-in minimal 5x7 bitmap face (always succeeds).
//!
//! Line height and line width each go through their own explicit fallback
//! chain (metrics API, glyph-bounds API, fixed constant), so a missing or
//! degenerate font can never fail a request.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::compositor::blend_over;

/// Last-resort line height when no font metric is available, in pixels.
/// Line spacing is added on top.
pub const FALLBACK_LINE_HEIGHT: f32 = 15.0;

/// Horizontal advance of one built-in glyph cell (5px glyph + 1px gap).
const BUILTIN_ADVANCE: u32 = 6;

/// Pixel height of a built-in glyph.
const BUILTIN_GLYPH_HEIGHT: u32 = 7;

/// System font files probed when the configured font is unavailable.
const SYSTEM_FONT_FILES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// One place to look for a watermark font.
#[derive(Debug, Clone)]
pub enum FontSource {
    /// The configured font file.
    Configured(PathBuf),
    /// A well-known system font location.
    System(&'static str),
    /// The built-in bitmap face. Loading this never fails.
    Builtin,
}

/// The full resolution order for a given configuration.
#[must_use]
pub fn default_sources(configured: Option<&Path>) -> Vec<FontSource> {
    let mut sources = Vec::with_capacity(SYSTEM_FONT_FILES.len() + 2);
    if let Some(path) = configured {
        sources.push(FontSource::Configured(path.to_path_buf()));
    }
    for path in SYSTEM_FONT_FILES {
        sources.push(FontSource::System(path));
    }
    sources.push(FontSource::Builtin);
    sources
}

/// Strategies for deriving the base line height, in priority order.
#[derive(Debug, Clone, Copy)]
enum MetricsStrategy {
    /// Ascent plus descent from the font's vertical metrics.
    AscentDescent,
    /// Height of the bounding box of a reference glyph (`A`).
    GlyphBounds,
}

const METRICS_CHAIN: &[MetricsStrategy] =
    &[MetricsStrategy::AscentDescent, MetricsStrategy::GlyphBounds];

/// Strategies for measuring a line's pixel width, in priority order.
#[derive(Debug, Clone, Copy)]
enum WidthStrategy {
    /// Sum of per-glyph horizontal advances (with kerning).
    Advance,
    /// Right edge of the union of rendered glyph bounds.
    GlyphBounds,
    /// Character count times half the font size.
    FixedAdvance,
}

const WIDTH_CHAIN: &[WidthStrategy] = &[
    WidthStrategy::Advance,
    WidthStrategy::GlyphBounds,
    WidthStrategy::FixedAdvance,
];

/// A resolved watermark font.
///
/// Resolve once per engine with [`FontFace::resolve`] and share read-only
/// across requests.
pub enum FontFace {
    /// An outline font loaded through `ab_glyph`.
    Outline(OutlineFace),
    /// The built-in 5x7 bitmap face.
    Builtin,
}

/// An outline font plus the pixel scale it is rendered at.
pub struct OutlineFace {
    font: FontVec,
    scale: PxScale,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Outline(face) => f
                .debug_struct("Outline")
                .field("scale", &face.scale)
                .finish(),
            FontFace::Builtin => f.write_str("Builtin"),
        }
    }
}

impl FontFace {
    /// Resolve a font by walking `sources` in order.
    ///
    /// The built-in face acts as the terminal strategy, so resolution
    /// always produces a usable face.
    #[must_use]
    pub fn resolve(sources: &[FontSource], size: f32) -> Self {
        for source in sources {
            if let Some(face) = Self::try_load(source, size) {
                return face;
            }
        }
        FontFace::Builtin
    }

    /// Attempt to load a single source. `None` means "try the next one".
    fn try_load(source: &FontSource, size: f32) -> Option<Self> {
        let path: &Path = match source {
            FontSource::Configured(p) => p.as_path(),
            FontSource::System(p) => Path::new(p),
            FontSource::Builtin => return Some(FontFace::Builtin),
        };
        let bytes = std::fs::read(path).ok()?;
        let font = FontVec::try_from_vec(bytes).ok()?;
        Some(FontFace::Outline(OutlineFace {
            font,
            scale: PxScale::from(size),
        }))
    }

    /// Vertical space one rendered line occupies, including inter-line
    /// spacing: base height from the metrics chain plus `line_spacing`.
    #[must_use]
    pub fn line_height(&self, line_spacing: f32) -> f32 {
        let base = METRICS_CHAIN
            .iter()
            .find_map(|s| self.try_metrics(*s))
            .unwrap_or(FALLBACK_LINE_HEIGHT);
        base + line_spacing
    }

    fn try_metrics(&self, strategy: MetricsStrategy) -> Option<f32> {
        match (self, strategy) {
            (FontFace::Outline(face), MetricsStrategy::AscentDescent) => {
                let scaled = face.font.as_scaled(face.scale);
                // ab_glyph reports descent as a negative offset from the
                // baseline; ascent - descent is the full ascent+descent span.
                let height = scaled.ascent() - scaled.descent();
                (height.is_finite() && height > 0.0).then_some(height)
            }
            (FontFace::Outline(face), MetricsStrategy::GlyphBounds) => {
                let glyph = face
                    .font
                    .glyph_id('A')
                    .with_scale_and_position(face.scale, ab_glyph::point(0.0, 0.0));
                let outlined = face.font.outline_glyph(glyph)?;
                let h = outlined.px_bounds().height();
                (h > 0.0).then_some(h)
            }
            // The bitmap face has no ascent/descent metrics.
            (FontFace::Builtin, MetricsStrategy::AscentDescent) => None,
            #[allow(clippy::cast_precision_loss)]
            (FontFace::Builtin, MetricsStrategy::GlyphBounds) => {
                Some(BUILTIN_GLYPH_HEIGHT as f32)
            }
        }
    }

    /// Measured pixel width of one line of text.
    #[must_use]
    pub fn line_width(&self, text: &str) -> f32 {
        WIDTH_CHAIN
            .iter()
            .find_map(|s| self.try_width(*s, text))
            .unwrap_or(0.0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn try_width(&self, strategy: WidthStrategy, text: &str) -> Option<f32> {
        match (self, strategy) {
            (FontFace::Outline(face), WidthStrategy::Advance) => {
                let scaled = face.font.as_scaled(face.scale);
                let mut width = 0.0f32;
                let mut prev = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = prev {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width.is_finite().then_some(width)
            }
            (FontFace::Outline(face), WidthStrategy::GlyphBounds) => {
                let scaled = face.font.as_scaled(face.scale);
                let mut cursor = 0.0f32;
                let mut right = 0.0f32;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    let glyph = id
                        .with_scale_and_position(face.scale, ab_glyph::point(cursor, 0.0));
                    if let Some(outlined) = face.font.outline_glyph(glyph) {
                        right = right.max(outlined.px_bounds().max.x);
                    }
                    cursor += scaled.h_advance(id);
                }
                Some(right)
            }
            (FontFace::Outline(face), WidthStrategy::FixedAdvance) => {
                Some(text.chars().count() as f32 * face.scale.x * 0.5)
            }
            // The bitmap face is monospaced; the advance is its capability.
            (FontFace::Builtin, WidthStrategy::Advance) => {
                Some((text.chars().count() as u32 * BUILTIN_ADVANCE) as f32)
            }
            (FontFace::Builtin, _) => None,
        }
    }

    /// Draw one line of text onto an RGBA canvas.
    ///
    /// `(x, y)` is the top-left of the line's layout box (not the
    /// baseline). Pixels outside the canvas are dropped; glyph coverage is
    /// alpha-blended over whatever is already on the canvas.
    pub fn draw_line(&self, canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgba<u8>) {
        match self {
            FontFace::Outline(face) => face.draw_line(canvas, x, y, text, color),
            FontFace::Builtin => draw_builtin_line(canvas, x, y, text, color),
        }
    }
}

impl OutlineFace {
    #[allow(clippy::cast_possible_truncation)]
    fn draw_line(&self, canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgba<u8>) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = y + scaled.ascent();

        let mut cursor = x;
        let mut prev = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                cursor += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(self.scale, ab_glyph::point(cursor, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = gx as i64 + bounds.min.x as i64;
                    let py = gy as i64 + bounds.min.y as i64;
                    let alpha = (coverage * f32::from(color[3])) as u8;
                    if alpha > 0 {
                        put_blended(canvas, px, py, Rgba([color[0], color[1], color[2], alpha]));
                    }
                });
            }
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
    }
}

/// Blend a pixel onto the canvas if `(x, y)` is in bounds.
fn put_blended(canvas: &mut RgbaImage, x: i64, y: i64, src: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x, y) = (x as u32, y as u32);
    let dst = canvas.get_pixel(x, y);
    canvas.put_pixel(x, y, blend_over(*dst, src));
}

#[allow(clippy::cast_possible_truncation)]
fn draw_builtin_line(canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgba<u8>) {
    let mut cursor = x.round() as i64;
    let top = y.round() as i64;
    for c in text.chars() {
        if let Some(rows) = builtin_glyph(c) {
            for (dy, row) in rows.iter().enumerate() {
                for dx in 0..5u8 {
                    if row & (0b1_0000 >> dx) != 0 {
                        put_blended(canvas, cursor + i64::from(dx), top + dy as i64, color);
                    }
                }
            }
        }
        // Unknown characters advance the cursor but draw nothing.
        cursor += i64::from(BUILTIN_ADVANCE);
    }
}

/// 5x7 bitmaps for printable ASCII (0x20..=0x7E), one row per byte, the
/// low five bits left-to-right from bit 4 down to bit 0.
fn builtin_glyph(c: char) -> Option<&'static [u8; 7]> {
    let idx = (c as usize).checked_sub(0x20)?;
    BUILTIN_GLYPHS.get(idx)
}

#[rustfmt::skip]
static BUILTIN_GLYPHS: [[u8; 7]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04], // !
    [0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x0A, 0x1F, 0x0A, 0x0A, 0x1F, 0x0A, 0x00], // #
    [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04], // $
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // %
    [0x08, 0x14, 0x14, 0x08, 0x15, 0x12, 0x0D], // &
    [0x04, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02], // (
    [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08], // )
    [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00], // *
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x08], // ,
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // .
    [0x01, 0x02, 0x02, 0x04, 0x08, 0x08, 0x10], // /
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // :
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08], // ;
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02], // <
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00], // =
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08], // >
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // ?
    [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E], // @
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
    [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E], // [
    [0x10, 0x08, 0x08, 0x04, 0x02, 0x02, 0x01], // backslash
    [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E], // ]
    [0x04, 0x0A, 0x11, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F], // _
    [0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00], // `
    [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F], // a
    [0x10, 0x10, 0x1E, 0x11, 0x11, 0x11, 0x1E], // b
    [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E], // c
    [0x01, 0x01, 0x0F, 0x11, 0x11, 0x11, 0x0F], // d
    [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E], // e
    [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08], // f
    [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x0E], // g
    [0x10, 0x10, 0x1E, 0x11, 0x11, 0x11, 0x11], // h
    [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E], // i
    [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C], // j
    [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12], // k
    [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // l
    [0x00, 0x00, 0x1A, 0x15, 0x15, 0x15, 0x15], // m
    [0x00, 0x00, 0x1E, 0x11, 0x11, 0x11, 0x11], // n
    [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E], // o
    [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10], // p
    [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x01], // q
    [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10], // r
    [0x00, 0x00, 0x0F, 0x10, 0x0E, 0x01, 0x1E], // s
    [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06], // t
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D], // u
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04], // v
    [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A], // w
    [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11], // x
    [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E], // y
    [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F], // z
    [0x02, 0x04, 0x04, 0x08, 0x04, 0x04, 0x02], // {
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // |
    [0x08, 0x04, 0x04, 0x02, 0x04, 0x04, 0x08], // }
    [0x00, 0x08, 0x15, 0x02, 0x00, 0x00, 0x00], // ~
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_falls_through_to_builtin() {
        let sources = default_sources(Some(Path::new("/nonexistent/nope.ttf")));
        // Every file source may fail on a bare system; the terminal
        // strategy still yields a usable face.
        let face = FontFace::resolve(&sources, 70.0);
        assert!(face.line_height(2.0) > 0.0);
    }

    #[test]
    fn builtin_is_terminal_source() {
        let sources = default_sources(None);
        assert!(matches!(sources.last(), Some(FontSource::Builtin)));
    }

    #[test]
    fn configured_font_is_probed_first() {
        let sources = default_sources(Some(Path::new("fonts/custom.ttf")));
        assert!(matches!(sources.first(), Some(FontSource::Configured(_))));
    }

    #[test]
    fn builtin_line_height_comes_from_glyph_bounds() {
        let face = FontFace::Builtin;
        // No ascent/descent metrics: 7px glyph bounds + spacing.
        assert!((face.line_height(2.0) - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn builtin_width_is_monospaced() {
        let face = FontFace::Builtin;
        assert!((face.line_width("Hello") - 30.0).abs() < f32::EPSILON);
        assert!((face.line_width("") - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn builtin_width_counts_unknown_characters() {
        let face = FontFace::Builtin;
        // Non-ASCII advances the cursor without drawing.
        assert!((face.line_width("±±") - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn builtin_draw_marks_pixels() {
        let face = FontFace::Builtin;
        let mut canvas = RgbaImage::new(40, 20);
        face.draw_line(&mut canvas, 2.0, 2.0, "A1", Rgba([0, 0, 0, 255]));
        let inked = canvas.pixels().filter(|p| p[3] > 0).count();
        assert!(inked > 10, "expected glyph coverage, got {inked} pixels");
    }

    #[test]
    fn builtin_draw_clips_at_canvas_edges() {
        let face = FontFace::Builtin;
        let mut canvas = RgbaImage::new(8, 8);
        // Mostly off-canvas on every side; must not panic.
        face.draw_line(&mut canvas, -4.0, -4.0, "W", Rgba([0, 0, 0, 255]));
        face.draw_line(&mut canvas, 6.0, 6.0, "W", Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn glyph_table_covers_printable_ascii() {
        for c in ' '..='~' {
            assert!(builtin_glyph(c).is_some(), "missing glyph for {c:?}");
        }
        assert!(builtin_glyph('±').is_none());
        assert!(builtin_glyph('\n').is_none());
    }
}
