//! Workflow settings.
//!
//! Everything the browser used to supply implicitly (device pixel ratio,
//! encoder quality, download names) is passed explicitly through
//! [`CropSettings`]. Hosts can deserialize it from a partial object; missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;

/// Settings for rendering, encoding and naming exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropSettings {
    /// Device pixel ratio used to size rendered surfaces.
    pub pixel_density: f64,
    /// JPEG quality for saved crops (0.0 to 1.0).
    pub jpeg_quality: f32,
    /// Resampling filter for rendering.
    pub resample: FilterType,
    /// Saved crops are named `<prefix>_<n>.jpeg`.
    pub result_prefix: String,
    /// File name of the batch archive.
    pub archive_name: String,
    /// File name of the single-image PNG download.
    pub preview_name: String,
    /// Width of the initial selection, in percent of the displayed width.
    pub initial_width_percent: f64,
    /// Aspect ratio (width / height) of the initial selection.
    pub initial_aspect: Option<f64>,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            pixel_density: 1.0,
            jpeg_quality: 1.0,
            resample: FilterType::Lanczos3,
            result_prefix: "cropped_image".to_string(),
            archive_name: "cropped_images.zip".to_string(),
            preview_name: "cropPreview.png".to_string(),
            initial_width_percent: 30.0,
            initial_aspect: Some(16.0 / 9.0),
        }
    }
}

impl CropSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the saved crop at 0-based batch `index`.
    pub fn result_name(&self, index: usize) -> String {
        format!("{}_{}.jpeg", self.result_prefix, index + 1)
    }

    /// Replace the pixel density, ignoring values that cannot size a surface.
    pub fn set_pixel_density(&mut self, density: f64) {
        if density.is_finite() && density > 0.0 {
            self.pixel_density = density;
        } else {
            log::warn!("Ignoring invalid pixel density {}", density);
        }
    }
}
