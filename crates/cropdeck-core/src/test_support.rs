//! Fixture images shared by unit tests.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use crate::decode::DecodedImage;
use crate::session::InputFile;

/// Red ramps along x, green along y, blue fixed at 128.
pub(crate) fn gradient_image(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(128);
        }
    }
    DecodedImage::new(width, height, pixels)
}

/// Gray image whose value encodes the pixel index: `(y * width + x) % 256`.
pub(crate) fn position_image(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = ((y * width + x) % 256) as u8;
            pixels.extend_from_slice(&[v, v, v]);
        }
    }
    DecodedImage::new(width, height, pixels)
}

fn encoded(image: &DecodedImage, format: ImageFormat) -> Vec<u8> {
    let rgb = RgbImage::from_raw(image.width, image.height, image.pixels.clone()).unwrap();
    let mut bytes = Cursor::new(Vec::new());
    rgb.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}

pub(crate) fn png_bytes(image: &DecodedImage) -> Vec<u8> {
    encoded(image, ImageFormat::Png)
}

pub(crate) fn jpeg_bytes(image: &DecodedImage) -> Vec<u8> {
    encoded(image, ImageFormat::Jpeg)
}

/// A picked PNG file with a gradient of the given size.
pub(crate) fn png_file(name: &str, width: u32, height: u32) -> InputFile {
    InputFile::new(name, png_bytes(&gradient_image(width, height))).with_mime_type("image/png")
}
