//! Crop rendering: from a committed region to exact native pixels.
//!
//! A committed crop is mapped to native coordinates and the native rectangle
//! is drawn onto a destination surface of `native size * pixel_density`
//! pixels, scaled by the density only. A rectangle on whole pixels whose size
//! already matches the surface is copied verbatim, so a full-image crop at
//! density 1 reproduces the decoded image bit for bit. Fractional rectangles
//! are resampled from their exact source window.

use crate::decode::{resize, DecodedImage, FilterType};
use crate::encode::{self, Blob, OutputFormat};
use crate::error::CropError;

use super::coords::{surface_size, to_native_rect, CropRegion, NativeRect, SourceImage};
use super::resample::resample_window;

/// Rectangles within this distance of whole pixels take the whole-pixel path.
const WHOLE_PIXEL_TOLERANCE: f64 = 1e-6;

/// The pixels of a rendered crop.
///
/// `image` holds `round(native * pixel_density)` pixels per axis. The
/// `display_*` fields are the on-screen (CSS) size the surface is meant to be
/// shown at, which is the committed crop's displayed size rounded to whole
/// pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub image: DecodedImage,
    pub pixel_density: f64,
    pub display_width: u32,
    pub display_height: u32,
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

/// Render a committed crop of `source` onto a new surface.
///
/// # Arguments
///
/// * `source` - The decoded image and its current displayed size
/// * `crop` - Committed region in displayed coordinates
/// * `pixel_density` - Device pixel ratio of the target display
/// * `filter` - Resampling filter used unless the crop can be copied verbatim
///
/// # Behavior
///
/// - Parts of the region outside the image are dropped before sizing
/// - A region that misses the image entirely is `InvalidGeometry`
/// - A surface that rounds to zero pixels is returned empty; encoding it
///   fails with `EncodeFailure`
pub fn render_crop(
    source: &SourceImage,
    crop: &CropRegion,
    pixel_density: f64,
    filter: FilterType,
) -> Result<Surface, CropError> {
    if !(pixel_density.is_finite() && pixel_density > 0.0) {
        return Err(CropError::InvalidGeometry(format!(
            "pixel density {pixel_density} must be positive"
        )));
    }

    let native = to_native_rect(crop, source)?;
    let rect = native
        .clamp_to(source.native_width(), source.native_height())
        .ok_or_else(|| CropError::InvalidGeometry("crop lies outside the image".to_string()))?;

    let displayed = crop.to_pixels(source.displayed_width(), source.displayed_height());
    let display_width = displayed.width.max(0.0).round() as u32;
    let display_height = displayed.height.max(0.0).round() as u32;

    let (width, height) = surface_size(&rect, pixel_density);
    if width == 0 || height == 0 {
        log::debug!("Crop {:?} rounds to an empty surface", rect);
        return Ok(Surface {
            image: DecodedImage::empty(),
            pixel_density,
            display_width,
            display_height,
        });
    }

    let image = if on_whole_pixels(&rect) {
        let covered = copy_region(source.image(), &rect);
        if covered.dimensions() == (width, height) {
            covered
        } else {
            resize(&covered, width, height, filter).map_err(|e| {
                CropError::InvalidGeometry(format!("cannot resample crop: {e}"))
            })?
        }
    } else {
        resample_window(source.image(), &rect, width, height, filter)
    };

    log::debug!(
        "Rendered {}x{} surface from native rect {:?} at density {}",
        width,
        height,
        rect,
        pixel_density
    );

    Ok(Surface {
        image,
        pixel_density,
        display_width,
        display_height,
    })
}

/// Encode a surface.
///
/// # Errors
///
/// `CropError::EncodeFailure` if the surface is empty or the encoder yields
/// no data. The surface is left untouched so the caller can retry.
pub async fn to_blob(
    surface: &Surface,
    format: OutputFormat,
    quality: f32,
) -> Result<Blob, CropError> {
    let image = &surface.image;
    let blob = encode::encode(&image.pixels, image.width, image.height, format, quality)?;
    Ok(blob)
}

fn on_whole_pixels(rect: &NativeRect) -> bool {
    [rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| (v - v.round()).abs() < WHOLE_PIXEL_TOLERANCE)
}

/// Copy a whole-pixel `rect` (already clamped) out of `image`.
fn copy_region(image: &DecodedImage, rect: &NativeRect) -> DecodedImage {
    let left = (rect.x.round() as u32).min(image.width.saturating_sub(1));
    let top = (rect.y.round() as u32).min(image.height.saturating_sub(1));
    let out_width = (rect.width.round() as u32).clamp(1, image.width - left);
    let out_height = (rect.height.round() as u32).clamp(1, image.height - top);

    let src_stride = image.width as usize * 3;
    let row_len = out_width as usize * 3;
    let mut output = Vec::with_capacity(row_len * out_height as usize);

    for y in top..top + out_height {
        let start = y as usize * src_stride + left as usize * 3;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    DecodedImage::new(out_width, out_height, output)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
