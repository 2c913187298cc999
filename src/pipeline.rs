//! The photo processing engine.
//!
//! Ties the stages together: decode, minimum-width gate, geometric
//! normalization, watermark compositing, JPEG encoding. One [`Engine`]
//! is built at startup and shared read-only across requests; every
//! intermediate bitmap is local to a single [`Engine::process`] call.

use crate::caption::Caption;
use crate::compositor::{self, WatermarkSpec};
use crate::config::PipelineConfig;
use crate::encode;
use crate::error::{Error, Result};
use crate::font::{self, FontFace};
use crate::geometry;

/// The processing engine holding the configuration and the resolved
/// watermark font.
///
/// Font resolution happens once, here; it degrades through the strategy
/// chain and never fails, so construction is infallible.
pub struct Engine {
    config: PipelineConfig,
    font: FontFace,
}

impl Engine {
    /// Build an engine from an immutable configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let sources = font::default_sources(config.font_path.as_deref());
        let font = FontFace::resolve(&sources, compositor::FONT_SIZE);
        tracing::debug!(font = ?font, "watermark font resolved");
        Self { config, font }
    }

    /// The configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline on an encoded upload.
    ///
    /// `bytes` may be in any format the decoder supports; the output is
    /// always JPEG at the configured quality and DPI, exactly
    /// `target_width x target_height`, with the caption watermark in the
    /// bottom-left corner.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] for unrecognized image data, [`Error::TooNarrow`]
    /// when the original is below the minimum width, [`Error::Image`] for
    /// encoding failures.
    pub fn process(&self, bytes: &[u8], caption: &Caption) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(bytes)
            .map_err(Error::Decode)?
            .to_rgb8();
        tracing::debug!(
            width = decoded.width(),
            height = decoded.height(),
            "decoded upload"
        );

        let normalized = geometry::normalize(
            &decoded,
            self.config.target_width,
            self.config.target_height,
            self.config.min_width,
        )?;

        let spec = WatermarkSpec::new(caption.lines());
        let stamped = compositor::composite(normalized, &spec, &self.font);

        encode::encode_jpeg(&stamped, self.config.jpeg_quality, self.config.dpi)
    }
}

/// Download filename suggested for a processed upload.
#[must_use]
pub fn suggested_filename(original: &str) -> String {
    format!("processed_{original}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Cursor;

    /// Small geometry so tests stay fast; same ratios as production.
    fn test_config() -> PipelineConfig {
        PipelineConfig {
            min_width: 80,
            target_width: 400,
            target_height: 225,
            font_path: None,
            ..PipelineConfig::default()
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbImage::new(width, height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
        }
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn process_produces_jpeg_at_target_dimensions() {
        let engine = Engine::new(test_config());
        let out = engine
            .process(&png_bytes(200, 200), &Caption::default())
            .unwrap();

        assert_eq!(&out[0..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 225));
        assert_eq!(decoded.color().channel_count(), 3);
    }

    #[test]
    fn process_rejects_narrow_upload_before_any_work() {
        let engine = Engine::new(test_config());
        let err = engine
            .process(&png_bytes(79, 4000), &Caption::default())
            .unwrap_err();
        assert!(matches!(err, Error::TooNarrow { width: 79, .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn process_rejects_garbage_bytes_as_decode_error() {
        let engine = Engine::new(test_config());
        let err = engine
            .process(b"definitely not an image", &Caption::default())
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn process_stamps_caption_in_bottom_left() {
        let engine = Engine::new(test_config());
        let caption = Caption::new([
            Some("12.34".to_string()),
            Some("56.78".to_string()),
            None,
            None,
            None,
            None,
            None,
        ]);
        let out = engine.process(&png_bytes(800, 450), &caption).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();

        // The panel lightens the bottom-left corner relative to the
        // untouched top-right corner of the dark gradient source.
        let panel = decoded.get_pixel(2, decoded.height() - 3);
        let far = decoded.get_pixel(decoded.width() - 3, 2);
        assert!(
            panel[2] > far[2],
            "expected a lighter panel pixel, got {panel:?} vs {far:?}"
        );
    }

    #[test]
    fn suggested_filename_prefixes_original() {
        assert_eq!(suggested_filename("site.jpg"), "processed_site.jpg");
        assert_eq!(suggested_filename(""), "processed_");
    }
}
