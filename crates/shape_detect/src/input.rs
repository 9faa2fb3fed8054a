//! Conversion of raw pixel buffers into the grayscale grid every stage reads.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{Result, ShapeError};

/// Build a luma image from row-major interleaved pixels.
///
/// `channels` must be 1 (gray), 3 (RGB) or 4 (RGBA) and `data` must hold
/// exactly `width * height * channels` bytes.
pub fn luma_from_raw(width: u32, height: u32, channels: u8, data: &[u8]) -> Result<GrayImage> {
    if width == 0 || height == 0 {
        return Err(ShapeError::InvalidInput(format!(
            "image has no pixels ({width}x{height})"
        )));
    }

    let expected = width as usize * height as usize * channels as usize;
    if data.len() != expected {
        return Err(ShapeError::InvalidInput(format!(
            "buffer holds {} bytes, expected {expected} for {width}x{height}x{channels}",
            data.len()
        )));
    }

    let mismatch = || ShapeError::InvalidInput("buffer does not fit the image size".to_string());
    let pixels = data.to_vec();
    match channels {
        1 => GrayImage::from_raw(width, height, pixels).ok_or_else(mismatch),
        3 => RgbImage::from_raw(width, height, pixels)
            .map(|rgb| DynamicImage::ImageRgb8(rgb).to_luma8())
            .ok_or_else(mismatch),
        4 => RgbaImage::from_raw(width, height, pixels)
            .map(|rgba| DynamicImage::ImageRgba8(rgba).to_luma8())
            .ok_or_else(mismatch),
        other => Err(ShapeError::InvalidInput(format!(
            "unsupported channel count {other}, expected 1, 3 or 4"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_buffer_is_taken_as_is() {
        let data = [0, 10, 20, 30, 40, 50];
        let image = luma_from_raw(3, 2, 1, &data).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.as_raw().as_slice(), &data);
    }

    #[test]
    fn color_buffers_reduce_to_luma() {
        let white_rgb = [255u8; 2 * 2 * 3];
        let image = luma_from_raw(2, 2, 3, &white_rgb).unwrap();
        assert!(image.pixels().all(|p| p.0[0] == 255));

        let mut black_rgba = vec![0u8; 2 * 2 * 4];
        black_rgba.chunks_mut(4).for_each(|px| px[3] = 255);
        let image = luma_from_raw(2, 2, 4, &black_rgba).unwrap();
        assert!(image.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let result = luma_from_raw(4, 4, 3, &[0u8; 47]);
        assert!(matches!(result, Err(ShapeError::InvalidInput(_))));
    }

    #[test]
    fn unsupported_channels_are_rejected() {
        let result = luma_from_raw(2, 2, 2, &[0u8; 8]);
        assert!(matches!(result, Err(ShapeError::InvalidInput(_))));
    }

    #[test]
    fn empty_image_is_rejected() {
        assert!(matches!(
            luma_from_raw(0, 5, 1, &[]),
            Err(ShapeError::InvalidInput(_))
        ));
    }
}
