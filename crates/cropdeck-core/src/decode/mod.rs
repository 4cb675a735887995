//! Image decoding for Cropdeck.
//!
//! This module provides functionality for:
//! - Decoding JPEG and PNG files picked by the user
//! - Applying EXIF orientation so native pixels match what the browser shows
//! - Resampling and display-size layout helpers
//!
//! # Architecture
//!
//! Decoding is synchronous here. The async boundary lives in
//! [`ImageSession::decode`](crate::session::ImageSession::decode). The batch
//! decodes each selected file independently, so one bad file never affects
//! the others; the decodes themselves run one after another.

mod raster;
mod resize;
mod types;

pub use raster::{decode_image, get_orientation};
pub use resize::{fit_display_size, resize};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
