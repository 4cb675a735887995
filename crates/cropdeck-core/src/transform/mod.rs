//! Crop geometry and rendering.
//!
//! # Pipeline
//!
//! 1. The selection widget reports a [`CropRegion`] in displayed coordinates
//! 2. [`to_native_rect`] scales it onto native pixels
//! 3. [`render_crop`] copies or resamples those pixels onto a [`Surface`]
//! 4. [`to_blob`] encodes the surface
//!
//! Pixel density only affects step 3.

mod coords;
mod render;
mod resample;

pub use coords::{
    initial_region, scale_factors, surface_size, to_native_rect, CropRegion, CropUnit, NativeRect,
    SourceImage,
};
pub use render::{render_crop, to_blob, Surface};
