//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! three-channel 8-bit raster every solver stage works on.

use image::RgbImage;

use crate::types::SolveError;

/// Decode raw image bytes into an RGB raster.
///
/// Alpha is dropped and grayscale inputs are expanded to three equal
/// channels, so downstream stages always see `Rgb<u8>` pixels.
///
/// # Errors
///
/// Returns [`SolveError::EmptyInput`] if `bytes` is empty or the image
/// has a zero dimension.
/// Returns [`SolveError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, SolveError> {
    if bytes.is_empty() {
        return Err(SolveError::EmptyInput);
    }

    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(SolveError::EmptyInput);
    }
    Ok(rgb)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode_rgb(&[]), Err(SolveError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_rgb(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(SolveError::ImageDecode(_))));
    }

    #[test]
    fn alpha_is_dropped() {
        let img = image::RgbaImage::from_fn(3, 2, |_, _| image::Rgba([10, 20, 30, 0]));
        let rgb = decode_rgb(&encode_png(&img)).unwrap();
        assert_eq!(rgb.width(), 3);
        assert_eq!(rgb.height(), 2);
        for pixel in rgb.pixels() {
            assert_eq!(pixel.0, [10, 20, 30]);
        }
    }
}
