//! Cropdeck WASM - WebAssembly bindings for Cropdeck
//!
//! This crate exposes the cropdeck-core batch workflow to JavaScript/TypeScript
//! applications.
//!
//! # Module Structure
//!
//! - `batch` - The [`JsCropBatch`] controller: loading, navigation, saving, export
//! - `types` - WASM-compatible wrapper types for files, surfaces and downloads
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropBatch } from '@cropdeck/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const batch = new JsCropBatch({ pixelDensity: window.devicePixelRatio });
//! ```

use wasm_bindgen::prelude::*;

mod batch;
mod types;

pub use batch::JsCropBatch;
pub use types::{JsDownload, JsInputFile, JsSurface};

/// Initialize the WASM module (called automatically on load).
///
/// Routes Rust panics and `log` records to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already initialized: {err}").into());
    }
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
