//! Resampling and layout sizing.
//!
//! `resize` backs the crop renderer whenever the destination surface differs
//! from the source rectangle. `fit_display_size` is the layout helper hosts
//! use to decide how large an image is shown before the selection widget
//! attaches to it.

use super::{DecodeError, DecodedImage, FilterType};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for a zero target dimension and
/// `DecodeError::CorruptedFile` if the pixel buffer does not match the
/// declared dimensions.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Pixel buffer size mismatch".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Displayed size of an image laid out inside a `max_width` x `max_height` box.
///
/// The aspect ratio is preserved and images are never enlarged. Returns
/// fractional sizes, like a browser layout does.
pub fn fit_display_size(width: u32, height: u32, max_width: f64, max_height: f64) -> (f64, f64) {
    if width == 0 || height == 0 || max_width <= 0.0 || max_height <= 0.0 {
        return (0.0, 0.0);
    }

    let (w, h) = (width as f64, height as f64);
    let scale = (max_width / w).min(max_height / h).min(1.0);
    (w * scale, h * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gradient_image;

    #[test]
    fn test_resize_basic() {
        let img = gradient_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();

        assert_eq!(resized.dimensions(), (50, 25));
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions_is_copy() {
        let img = gradient_image(40, 30);
        let resized = resize(&img, 40, 30, FilterType::Lanczos3).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_upscale() {
        let img = gradient_image(50, 25);
        let resized = resize(&img, 100, 50, FilterType::Lanczos3).unwrap();
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = gradient_image(100, 50);

        assert!(resize(&img, 0, 50, FilterType::Bilinear).is_err());
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_mismatched_buffer() {
        let img = DecodedImage {
            width: 10,
            height: 10,
            pixels: vec![0; 12],
        };
        assert!(matches!(
            resize(&img, 5, 5, FilterType::Nearest),
            Err(DecodeError::CorruptedFile(_))
        ));
    }

    #[test]
    fn test_fit_display_size_landscape() {
        let (w, h) = fit_display_size(4000, 2000, 800.0, 600.0);
        assert_eq!((w, h), (800.0, 400.0));
    }

    #[test]
    fn test_fit_display_size_portrait() {
        let (w, h) = fit_display_size(1000, 2000, 800.0, 600.0);
        assert_eq!((w, h), (300.0, 600.0));
    }

    #[test]
    fn test_fit_display_size_never_enlarges() {
        let (w, h) = fit_display_size(100, 50, 800.0, 600.0);
        assert_eq!((w, h), (100.0, 50.0));
    }

    #[test]
    fn test_fit_display_size_degenerate() {
        assert_eq!(fit_display_size(0, 50, 800.0, 600.0), (0.0, 0.0));
        assert_eq!(fit_display_size(50, 50, 0.0, 600.0), (0.0, 0.0));
    }
}
