//! Per-channel helpers for three-channel rasters.
//!
//! `imageproc`'s grayscale morphology and thresholding only accept
//! `GrayImage`. Applying them to an `RgbImage` means splitting it into
//! three single-channel planes, transforming each, and reassembling.
//! Morphology is a per-channel operation, so the result matches
//! running it directly on the color image.

use image::{GrayImage, RgbImage};

/// Split an RGB image into its R, G and B planes.
#[must_use]
pub fn split_channels(image: &RgbImage) -> [GrayImage; 3] {
    let (w, h) = image.dimensions();
    std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    })
}

/// Reassemble three planes of equal size into an RGB image.
#[must_use]
pub fn merge_channels(channels: &[GrayImage; 3]) -> RgbImage {
    let (w, h) = channels[0].dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([
            channels[0].get_pixel(x, y).0[0],
            channels[1].get_pixel(x, y).0[0],
            channels[2].get_pixel(x, y).0[0],
        ])
    })
}

/// Apply `op` independently to every channel of `image`.
#[must_use]
pub fn map_channels(image: &RgbImage, op: impl Fn(&GrayImage) -> GrayImage) -> RgbImage {
    let planes = split_channels(image);
    let mapped: [GrayImage; 3] = std::array::from_fn(|c| op(&planes[c]));
    merge_channels(&mapped)
}
