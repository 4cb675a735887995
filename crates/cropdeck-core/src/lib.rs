//! Cropdeck Core - batch image cropping
//!
//! This crate provides the platform-independent half of Cropdeck: decoding
//! picked images, mapping on-screen selections onto native pixels, rendering
//! and encoding crops, and bundling saved crops into a single archive.
//!
//! # Layers
//!
//! - [`transform`]: coordinate mapping and crop rendering
//! - [`session`]: the per-image state machine
//! - [`batch`]: navigation, saving and the result list across many images
//! - [`export`]: archive writers and download payloads

pub mod batch;
pub mod decode;
pub mod encode;
pub mod error;
pub mod export;
pub mod session;
pub mod settings;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use batch::{BatchController, ExportEntry, FileFailure, LoadOutcome, LoadReport, SaveTicket};
pub use encode::{Blob, OutputFormat};
pub use error::CropError;
pub use export::{ArchiveEntry, ArchiveWriter, Download, ExportAggregator, ZipArchiveWriter};
pub use session::{
    png_download, transition, CropEvent, ImageSession, InputFile, SessionId, SessionState,
};
pub use settings::CropSettings;
pub use transform::{render_crop, to_blob, CropRegion, CropUnit, NativeRect, SourceImage, Surface};
