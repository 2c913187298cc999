//! JPEG encoding for the pipeline output.
//!
//! Encodes in memory at the configured quality and stamps the configured
//! DPI into the JFIF APP0 density fields. The `image` encoder always
//! emits a JFIF header but only with aspect-ratio units, so the density
//! is patched in place afterwards; the segment layout is fixed by the
//! JFIF spec (units at byte 13, X/Y density big-endian at 14 and 16).

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::Result;

/// JFIF density units: dots per inch.
const DENSITY_UNIT_DPI: u8 = 1;

/// Encode an opaque image as JPEG with the given quality and DPI tag.
///
/// # Errors
///
/// Returns [`Error::Image`](crate::Error::Image) if encoding fails.
pub fn encode_jpeg(image: &RgbImage, quality: u8, dpi: (u16, u16)) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(image)?;

    let mut bytes = buf.into_inner();
    set_jfif_density(&mut bytes, dpi);
    Ok(bytes)
}

/// Rewrite the JFIF APP0 density fields to `dpi` in dots-per-inch units.
///
/// Leaves the bytes untouched if the stream does not start with an SOI
/// marker followed by a JFIF APP0 segment.
fn set_jfif_density(bytes: &mut [u8], dpi: (u16, u16)) {
    // SOI, APP0 marker, 2-byte length, "JFIF\0", 2-byte version,
    // units, Xdensity, Ydensity.
    if bytes.len() < 18 {
        return;
    }
    if bytes[0..2] != [0xFF, 0xD8] || bytes[2..4] != [0xFF, 0xE0] {
        return;
    }
    if &bytes[6..11] != b"JFIF\0" {
        return;
    }

    bytes[13] = DENSITY_UNIT_DPI;
    bytes[14..16].copy_from_slice(&dpi.0.to_be_bytes());
    bytes[16..18].copy_from_slice(&dpi.1.to_be_bytes());
}
