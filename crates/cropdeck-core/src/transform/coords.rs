//! Displayed-to-native coordinate mapping.
//!
//! The selection widget reports rectangles against the image as it is laid
//! out on screen. Those rectangles are scaled per axis by
//! `native / displayed` to find the source pixels. Pixel density never enters
//! this mapping: it only decides how many destination pixels a crop is
//! rendered into (see [`surface_size`]).
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner of the displayed image
//! - `Percent` regions are percentages (0-100) of the displayed size
//! - `Pixels` regions are absolute displayed (CSS) pixels

use serde::{Deserialize, Serialize};

use crate::decode::{fit_display_size, DecodedImage};
use crate::error::CropError;

/// Unit of a [`CropRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropUnit {
    #[serde(rename = "%")]
    Percent,
    #[default]
    #[serde(rename = "px")]
    Pixels,
}

/// A crop rectangle relative to the displayed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: CropUnit,
}

impl CropRegion {
    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Pixels,
        }
    }

    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Percent,
        }
    }

    /// True when the region sits at a finite origin and covers a positive,
    /// finite area.
    ///
    /// Only regions with extent may become a committed crop.
    pub fn has_extent(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Express the region in displayed pixels.
    pub fn to_pixels(&self, displayed_width: f64, displayed_height: f64) -> CropRegion {
        match self.unit {
            CropUnit::Pixels => *self,
            CropUnit::Percent => CropRegion::pixels(
                self.x / 100.0 * displayed_width,
                self.y / 100.0 * displayed_height,
                self.width / 100.0 * displayed_width,
                self.height / 100.0 * displayed_height,
            ),
        }
    }
}

/// A rectangle in native pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NativeRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Intersection with `[0, width] x [0, height]`, or `None` if empty.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<NativeRect> {
        let left = self.x.max(0.0);
        let top = self.y.max(0.0);
        let right = self.right().min(width as f64);
        let bottom = self.bottom().min(height as f64);

        if right <= left || bottom <= top {
            return None;
        }
        Some(NativeRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }
}

/// A decoded image together with the size it is displayed at.
///
/// Pixel data is fixed at decode time. The displayed size defaults to the
/// native size and changes whenever the host lays the image out again.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DecodedImage,
    displayed_width: f64,
    displayed_height: f64,
}

impl SourceImage {
    pub fn new(image: DecodedImage) -> Self {
        let (w, h) = image.dimensions();
        Self {
            image,
            displayed_width: w as f64,
            displayed_height: h as f64,
        }
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn native_width(&self) -> u32 {
        self.image.width
    }

    pub fn native_height(&self) -> u32 {
        self.image.height
    }

    pub fn displayed_width(&self) -> f64 {
        self.displayed_width
    }

    pub fn displayed_height(&self) -> f64 {
        self.displayed_height
    }

    /// Record the on-screen size reported by the layout.
    pub fn set_displayed_size(&mut self, width: f64, height: f64) {
        self.displayed_width = width;
        self.displayed_height = height;
    }

    /// Lay the image out inside a bounding box, never enlarging it.
    pub fn fit_within(&mut self, max_width: f64, max_height: f64) {
        let (w, h) = fit_display_size(
            self.image.width,
            self.image.height,
            max_width,
            max_height,
        );
        self.set_displayed_size(w, h);
    }
}

/// Per-axis `native / displayed` scale factors.
///
/// # Errors
///
/// `CropError::InvalidGeometry` if either displayed dimension is zero,
/// negative or not finite.
pub fn scale_factors(source: &SourceImage) -> Result<(f64, f64), CropError> {
    let (dw, dh) = (source.displayed_width(), source.displayed_height());
    if !(dw.is_finite() && dh.is_finite() && dw > 0.0 && dh > 0.0) {
        return Err(CropError::InvalidGeometry(format!(
            "displayed size {dw}x{dh} must be positive"
        )));
    }
    Ok((
        source.native_width() as f64 / dw,
        source.native_height() as f64 / dh,
    ))
}

/// Map a displayed-space crop onto native pixel coordinates.
///
/// `Percent` regions are resolved against the displayed size first, then each
/// axis is scaled independently.
pub fn to_native_rect(region: &CropRegion, source: &SourceImage) -> Result<NativeRect, CropError> {
    let (scale_x, scale_y) = scale_factors(source)?;
    let px = region.to_pixels(source.displayed_width(), source.displayed_height());

    Ok(NativeRect {
        x: px.x * scale_x,
        y: px.y * scale_y,
        width: px.width * scale_x,
        height: px.height * scale_y,
    })
}

/// Destination surface size for a native rectangle at the given pixel density.
pub fn surface_size(rect: &NativeRect, pixel_density: f64) -> (u32, u32) {
    let w = (rect.width * pixel_density).round();
    let h = (rect.height * pixel_density).round();
    (w.max(0.0) as u32, h.max(0.0) as u32)
}

/// The region a selection starts from before the user drags anything.
///
/// Anchored at the top-left, `width_percent` of the displayed width. With an
/// aspect ratio the height follows it on screen; without one the region is
/// `width_percent` of both axes. A region that would overflow vertically is
/// shrunk to fit.
pub fn initial_region(
    displayed_width: f64,
    displayed_height: f64,
    width_percent: f64,
    aspect: Option<f64>,
) -> CropRegion {
    let width_percent = width_percent.clamp(0.0, 100.0);
    let ratio = match aspect {
        Some(a) if a > 0.0 && displayed_height > 0.0 => displayed_width / (a * displayed_height),
        _ => 1.0,
    };

    let height_percent = width_percent * ratio;
    if height_percent > 100.0 {
        CropRegion::percent(0.0, 0.0, 100.0 / ratio, 100.0)
    } else {
        CropRegion::percent(0.0, 0.0, width_percent, height_percent)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn source(native: (u32, u32), displayed: (f64, f64)) -> SourceImage {
        let pixels = vec![0u8; (native.0 * native.1 * 3) as usize];
        let mut src = SourceImage::new(DecodedImage::new(native.0, native.1, pixels));
        src.set_displayed_size(displayed.0, displayed.1);
        src
    }

    /// Strategy for (native, displayed) size pairs.
    fn sizes_strategy() -> impl Strategy<Value = ((u32, u32), (f64, f64))> {
        ((1u32..=64, 1u32..=64), (1.0f64..=500.0, 1.0f64..=500.0))
    }

    fn region_strategy() -> impl Strategy<Value = CropRegion> {
        (0.0f64..=200.0, 0.0f64..=200.0, 0.1f64..=200.0, 0.1f64..=200.0)
            .prop_map(|(x, y, w, h)| CropRegion::pixels(x, y, w, h))
    }

    proptest! {
        /// Property: each axis is scaled independently by native / displayed.
        #[test]
        fn prop_axes_scale_independently(
            (native, displayed) in sizes_strategy(),
            region in region_strategy(),
        ) {
            let src = source(native, displayed);
            let rect = to_native_rect(&region, &src).unwrap();

            let sx = native.0 as f64 / displayed.0;
            let sy = native.1 as f64 / displayed.1;
            prop_assert!((rect.x - region.x * sx).abs() < 1e-9);
            prop_assert!((rect.width - region.width * sx).abs() < 1e-9);
            prop_assert!((rect.y - region.y * sy).abs() < 1e-9);
            prop_assert!((rect.height - region.height * sy).abs() < 1e-9);
        }

        /// Property: doubling the displayed width doubles the native width.
        #[test]
        fn prop_scaling_is_linear(
            (native, displayed) in sizes_strategy(),
            region in region_strategy(),
        ) {
            let src = source(native, displayed);
            let doubled = CropRegion { width: region.width * 2.0, ..region };

            let a = to_native_rect(&region, &src).unwrap();
            let b = to_native_rect(&doubled, &src).unwrap();
            prop_assert!((b.width - 2.0 * a.width).abs() < 1e-6);
            prop_assert!((b.height - a.height).abs() < 1e-9);
        }

        /// Property: a percent region equals its pixel equivalent.
        #[test]
        fn prop_percent_matches_pixels(
            (native, displayed) in sizes_strategy(),
            (x, y, w, h) in (0.0f64..=100.0, 0.0f64..=100.0, 0.1f64..=100.0, 0.1f64..=100.0),
        ) {
            let src = source(native, displayed);
            let pct = CropRegion::percent(x, y, w, h);
            let px = pct.to_pixels(displayed.0, displayed.1);

            let a = to_native_rect(&pct, &src).unwrap();
            let b = to_native_rect(&px, &src).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Property: a zero displayed axis always fails.
        #[test]
        fn prop_zero_displayed_axis_fails(
            native in (1u32..=16, 1u32..=16),
            other in 1.0f64..=100.0,
            zero_width in any::<bool>(),
        ) {
            let displayed = if zero_width { (0.0, other) } else { (other, 0.0) };
            let src = source(native, displayed);
            let region = CropRegion::pixels(0.0, 0.0, 1.0, 1.0);
            prop_assert!(matches!(
                to_native_rect(&region, &src),
                Err(CropError::InvalidGeometry(_))
            ));
        }
    }
}
