//! WASM-compatible wrapper types.
//!
//! This module provides JavaScript-friendly types that wrap the core Cropdeck
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use cropdeck_core::decode::FilterType;
use cropdeck_core::{CropError, Download, InputFile, LoadReport, Surface};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// A file picked by the user, ready to hand to a batch.
#[wasm_bindgen]
pub struct JsInputFile {
    name: String,
    mime_type: Option<String>,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl JsInputFile {
    /// # Arguments
    /// * `name` - File name shown to the user
    /// * `mime_type` - `File.type`, if the browser reported one
    /// * `bytes` - File contents
    #[wasm_bindgen(constructor)]
    pub fn new(name: String, mime_type: Option<String>, bytes: Vec<u8>) -> JsInputFile {
        JsInputFile {
            name,
            mime_type,
            bytes,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.name.clone()
    }
}

impl From<JsInputFile> for InputFile {
    fn from(file: JsInputFile) -> Self {
        let input = InputFile::new(file.name, file.bytes);
        match file.mime_type {
            Some(mime) if !mime.is_empty() => input.with_mime_type(mime),
            _ => input,
        }
    }
}

/// A rendered crop.
///
/// `width`/`height` are backing pixels; `display_width`/`display_height` are
/// the CSS size the surface should be shown at.
#[wasm_bindgen]
pub struct JsSurface {
    width: u32,
    height: u32,
    display_width: u32,
    display_height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsSurface {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn display_width(&self) -> u32 {
        self.display_width
    }

    #[wasm_bindgen(getter)]
    pub fn display_height(&self) -> u32 {
        self.display_height
    }

    /// Returns RGB pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// RGBA pixel data, ready for `new ImageData(...)`.
    pub fn rgba_pixels(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for rgb in self.pixels.chunks_exact(3) {
            rgba.extend_from_slice(rgb);
            rgba.push(255);
        }
        rgba
    }
}

impl From<Surface> for JsSurface {
    fn from(surface: Surface) -> Self {
        Self {
            width: surface.width(),
            height: surface.height(),
            display_width: surface.display_width,
            display_height: surface.display_height,
            pixels: surface.image.pixels,
        }
    }
}

/// A file to hand to the browser's download trigger.
#[wasm_bindgen]
pub struct JsDownload {
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl JsDownload {
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    /// Returns the file contents as Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl From<Download> for JsDownload {
    fn from(download: Download) -> Self {
        Self {
            filename: download.filename,
            mime_type: download.mime_type,
            bytes: download.bytes,
        }
    }
}

/// Plain-object summary of a load, serialized with `serde-wasm-bindgen`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoadSummary {
    pub epoch: u64,
    pub loaded: usize,
    pub failures: Vec<FailedFile>,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct FailedFile {
    pub name: String,
    pub message: String,
}

impl From<LoadReport> for LoadSummary {
    fn from(report: LoadReport) -> Self {
        Self {
            epoch: report.epoch,
            loaded: report.loaded,
            failures: report
                .failures
                .into_iter()
                .map(|f| FailedFile {
                    name: f.name,
                    message: f.error.to_string(),
                })
                .collect(),
        }
    }
}

/// On-screen size of the active image.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct DisplayedSize {
    pub width: f64,
    pub height: f64,
}

/// Convert a u8 filter value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest
/// - 1 = Bilinear
/// - 2 = CatmullRom
/// - 3 = Lanczos3
///
/// Any other value defaults to Lanczos3.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        1 => FilterType::Bilinear,
        2 => FilterType::CatmullRom,
        _ => FilterType::Lanczos3,
    }
}

/// Convert a core error into a JS `Error`.
///
/// The error carries a boolean `retryable` property so callers can offer a
/// retry for busy or failed-encode saves.
pub(crate) fn to_js_error(err: CropError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    if js_sys::Reflect::set(&error, &"retryable".into(), &err.is_retryable().into()).is_err() {
        log::warn!("Could not tag error '{}' with retryability", err);
    }
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropdeck_core::decode::DecodedImage;
    use cropdeck_core::FileFailure;

    #[test]
    fn test_input_file_conversion() {
        let file = JsInputFile::new("a.png".into(), Some("image/png".into()), vec![1, 2]);
        assert_eq!(file.name(), "a.png");

        let input: InputFile = file.into();
        assert_eq!(input.name, "a.png");
        assert_eq!(input.mime_type.as_deref(), Some("image/png"));
        assert_eq!(input.bytes, vec![1, 2]);
    }

    #[test]
    fn test_input_file_empty_mime_is_unknown() {
        let input: InputFile = JsInputFile::new("a".into(), Some(String::new()), vec![]).into();
        assert!(input.mime_type.is_none());
    }

    #[test]
    fn test_surface_conversion() {
        let surface = Surface {
            image: DecodedImage::new(2, 1, vec![10, 20, 30, 40, 50, 60]),
            pixel_density: 2.0,
            display_width: 1,
            display_height: 1,
        };
        let js = JsSurface::from(surface);

        assert_eq!(js.width(), 2);
        assert_eq!(js.height(), 1);
        assert_eq!(js.display_width(), 1);
        assert_eq!(js.pixels(), vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(js.rgba_pixels(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_download_conversion() {
        let js = JsDownload::from(Download {
            filename: "cropped_images.zip".into(),
            mime_type: "application/zip".into(),
            bytes: b"PK".to_vec(),
        });
        assert_eq!(js.filename(), "cropped_images.zip");
        assert_eq!(js.mime_type(), "application/zip");
        assert_eq!(js.bytes(), b"PK".to_vec());
    }

    #[test]
    fn test_load_summary_from_report() {
        let report = LoadReport {
            epoch: 4,
            loaded: 2,
            failures: vec![FileFailure {
                name: "bad.jpg".into(),
                error: CropError::NoActiveImage,
            }],
        };
        let summary = LoadSummary::from(report);

        assert_eq!(summary.epoch, 4);
        assert_eq!(summary.loaded, 2);
        assert_eq!(
            summary.failures,
            vec![FailedFile {
                name: "bad.jpg".into(),
                message: "No image is loaded".into(),
            }]
        );
    }

    #[test]
    fn test_filter_from_u8() {
        assert_eq!(filter_from_u8(0), FilterType::Nearest);
        assert_eq!(filter_from_u8(1), FilterType::Bilinear);
        assert_eq!(filter_from_u8(2), FilterType::CatmullRom);
        assert_eq!(filter_from_u8(3), FilterType::Lanczos3);
        // Unknown values default to Lanczos3
        assert_eq!(filter_from_u8(255), FilterType::Lanczos3);
    }
}
