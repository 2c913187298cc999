//! Pipeline configuration.
//!
//! All tunables live in one immutable struct built at startup and passed
//! into [`Engine::new`](crate::Engine::new). Nothing here changes after
//! construction, so the engine can be shared freely across requests.

use std::path::PathBuf;

/// Immutable configuration for the photo pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum accepted width of the *original* upload, in pixels.
    pub min_width: u32,
    /// Minimum height counterpart to `min_width`.
    ///
    /// Never checked anywhere in the pipeline. Kept for parity with the
    /// deployed behavior, where the constant exists but no code reads it.
    pub min_height: u32,
    /// Output width in pixels.
    pub target_width: u32,
    /// Output height in pixels.
    pub target_height: u32,
    /// Dots-per-inch pair written into the JPEG JFIF density tag.
    pub dpi: (u16, u16),
    /// JPEG encoder quality (1-100).
    pub jpeg_quality: u8,
    /// Preferred watermark font file. `None`, or a load failure, falls
    /// through the system-font and built-in strategies in [`crate::font`].
    pub font_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_width: 800,
            min_height: 600,
            target_width: 4000,
            target_height: 2250,
            dpi: (96, 96),
            jpeg_quality: 95,
            font_path: Some(PathBuf::from("static/fonts/Roboto-Regular.ttf")),
        }
    }
}

impl PipelineConfig {
    /// Target aspect ratio (width / height).
    #[must_use]
    pub fn target_ratio(&self) -> f64 {
        f64::from(self.target_width) / f64::from(self.target_height)
    }
}
