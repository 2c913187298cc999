//! Error types for the geostamp crate.

/// Errors that can occur while processing an uploaded photo.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The uploaded bytes could not be decoded as an image.
    #[error("unrecognized image data: {0}")]
    Decode(image::ImageError),

    /// The original image is narrower than the minimum width threshold.
    ///
    /// Checked on the image as uploaded, before any resize. There is no
    /// matching height check (see [`PipelineConfig::min_height`]).
    ///
    /// [`PipelineConfig::min_height`]: crate::config::PipelineConfig::min_height
    #[error("image too small: width {width}px is below the {min_width}px minimum")]
    TooNarrow {
        /// Width of the uploaded image in pixels.
        width: u32,
        /// Configured minimum width in pixels.
        min_width: u32,
    },

    /// An error occurred during resize, crop, or encode.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// An I/O error occurred while writing encoded output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is the client's fault (bad upload) rather than a
    /// processing failure. Drives the 400/500 split at the HTTP boundary.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::TooNarrow { .. })
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
