//! Batch cropping bindings.
//!
//! [`JsCropBatch`] wraps a [`BatchController`] for the browser. The controller
//! lives in an `Rc<RefCell<_>>` so async operations can reach it after the
//! calling method has returned; no borrow is ever held across an await.
//! Long-running operations return a `Promise`.
//!
//! # Example
//!
//! ```typescript
//! import { JsCropBatch, JsInputFile } from '@cropdeck/wasm';
//!
//! const batch = new JsCropBatch({ pixelDensity: window.devicePixelRatio });
//! const files = await Promise.all([...input.files].map(async (f) =>
//!   new JsInputFile(f.name, f.type, new Uint8Array(await f.arrayBuffer()))));
//! const summary = await batch.load_files(files);
//!
//! batch.set_displayed_size(img.width, img.height);
//! batch.region_committed({ x: 10, y: 10, width: 50, height: 50, unit: '%' });
//! const name = await batch.save_active();
//! const zip = await batch.export_all();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use cropdeck_core::{
    png_download, BatchController, CropEvent, CropSettings, InputFile, ZipArchiveWriter,
};
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::types::{
    filter_from_u8, to_js_error, DisplayedSize, JsDownload, JsInputFile, JsSurface, LoadSummary,
};

type Controller = BatchController<ZipArchiveWriter>;

/// A batch of images being cropped in turn.
#[wasm_bindgen]
pub struct JsCropBatch {
    inner: Rc<RefCell<Controller>>,
}

#[wasm_bindgen]
impl JsCropBatch {
    /// Create an empty batch.
    ///
    /// # Arguments
    /// * `settings` - Optional partial settings object (`pixelDensity`,
    ///   `jpegQuality`, `resultPrefix`, ...). Missing fields use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<JsCropBatch, JsValue> {
        let settings = if settings.is_undefined() || settings.is_null() {
            CropSettings::default()
        } else {
            serde_wasm_bindgen::from_value(settings)?
        };
        Ok(JsCropBatch {
            inner: Rc::new(RefCell::new(BatchController::new(settings))),
        })
    }

    /// Replace the batch with a new selection of files.
    ///
    /// Resolves with `{ epoch, loaded, failures: [{ name, message }] }`.
    /// Files that fail to decode are reported, not thrown. Rejects only when
    /// another `load_files` call replaced this one before it finished.
    pub fn load_files(&self, files: Vec<JsInputFile>) -> Promise {
        let inner = Rc::clone(&self.inner);
        let (epoch, settings) = {
            let mut batch = inner.borrow_mut();
            (batch.begin_load(), batch.settings().clone())
        };
        let files: Vec<InputFile> = files.into_iter().map(InputFile::from).collect();

        future_to_promise(async move {
            let outcome = Controller::decode_files(epoch, files, &settings).await;
            let report = inner.borrow_mut().finish_load(outcome).map_err(to_js_error)?;
            Ok(serde_wasm_bindgen::to_value(&LoadSummary::from(report))?)
        })
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.borrow().len()
    }

    #[wasm_bindgen(getter)]
    pub fn active_index(&self) -> usize {
        self.inner.borrow().active_index()
    }

    /// Display name of the active image.
    #[wasm_bindgen(getter)]
    pub fn active_name(&self) -> Option<String> {
        self.inner
            .borrow()
            .active()
            .map(|session| session.display_name().to_string())
    }

    /// Lifecycle state of the active image (`"ready"`, `"editing"`, ...).
    pub fn active_state(&self) -> Result<JsValue, JsValue> {
        let batch = self.inner.borrow();
        match batch.active() {
            Some(session) => Ok(serde_wasm_bindgen::to_value(&session.state())?),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn has_next(&self) -> bool {
        self.inner.borrow().has_next()
    }

    #[wasm_bindgen(getter)]
    pub fn has_previous(&self) -> bool {
        self.inner.borrow().has_previous()
    }

    #[wasm_bindgen(getter)]
    pub fn is_busy(&self) -> bool {
        self.inner.borrow().is_busy()
    }

    /// Load generation; matches the `epoch` of the latest load summary.
    #[wasm_bindgen(getter)]
    pub fn epoch(&self) -> f64 {
        self.inner.borrow().epoch() as f64
    }

    /// Names of the crops saved so far, in archive order.
    pub fn result_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .results()
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Move to the next image. Returns whether the active image changed.
    pub fn next(&self) -> Result<bool, JsValue> {
        self.inner.borrow_mut().next().map_err(to_js_error)
    }

    /// Move to the previous image. Returns whether the active image changed.
    pub fn previous(&self) -> Result<bool, JsValue> {
        self.inner.borrow_mut().previous().map_err(to_js_error)
    }

    /// Record the size the active image is laid out at, in CSS pixels.
    pub fn set_displayed_size(&self, width: f64, height: f64) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .set_displayed_size(width, height)
            .map_err(to_js_error)
    }

    /// Lay the active image out inside a `max_width` x `max_height` box,
    /// never enlarging it. Returns the resulting `{ width, height }`.
    pub fn fit_within(&self, max_width: f64, max_height: f64) -> Result<JsValue, JsValue> {
        let mut batch = self.inner.borrow_mut();
        batch
            .fit_active_within(max_width, max_height)
            .map_err(to_js_error)?;
        let size = batch.active().map(|session| {
            let source = session.source();
            DisplayedSize {
                width: source.displayed_width(),
                height: source.displayed_height(),
            }
        });
        Ok(serde_wasm_bindgen::to_value(&size)?)
    }

    pub fn set_pixel_density(&self, density: f64) {
        self.inner.borrow_mut().settings_mut().set_pixel_density(density);
    }

    /// Set the resampling filter: 0=Nearest, 1=Bilinear, 2=CatmullRom, 3=Lanczos3.
    pub fn set_resample(&self, filter: u8) {
        self.inner.borrow_mut().settings_mut().resample = filter_from_u8(filter);
    }

    /// The region the selection widget should start from, as a plain object.
    pub fn initial_region(&self) -> Result<JsValue, JsValue> {
        let region = self.inner.borrow().initial_region().map_err(to_js_error)?;
        Ok(serde_wasm_bindgen::to_value(&region)?)
    }

    /// Forward a `{ type, region }` event from the selection widget.
    ///
    /// Returns whether the active image accepted it.
    pub fn handle_event(&self, event: JsValue) -> Result<bool, JsValue> {
        let event: CropEvent = serde_wasm_bindgen::from_value(event)?;
        self.inner
            .borrow_mut()
            .handle_event(event)
            .map_err(to_js_error)
    }

    /// The selection moved or resized.
    pub fn region_changed(&self, region: JsValue) -> Result<bool, JsValue> {
        let region = serde_wasm_bindgen::from_value(region)?;
        self.inner
            .borrow_mut()
            .handle_event(CropEvent::RegionChanged(region))
            .map_err(to_js_error)
    }

    /// The user released the selection.
    pub fn region_committed(&self, region: JsValue) -> Result<bool, JsValue> {
        let region = serde_wasm_bindgen::from_value(region)?;
        self.inner
            .borrow_mut()
            .handle_event(CropEvent::RegionCommitted(region))
            .map_err(to_js_error)
    }

    /// Render the active image's committed crop.
    pub fn preview(&self) -> Result<JsSurface, JsValue> {
        self.inner
            .borrow()
            .preview()
            .map(JsSurface::from)
            .map_err(to_js_error)
    }

    /// Save the active crop as JPEG and advance to the next image.
    ///
    /// Resolves with the name the crop was filed under. The batch is busy
    /// from this call until the promise settles.
    pub fn save_active(&self) -> Promise {
        let inner = Rc::clone(&self.inner);
        let ticket = inner.borrow_mut().begin_save();

        future_to_promise(async move {
            let ticket = ticket.map_err(to_js_error)?;
            let encoded = Controller::encode_ticket(&ticket).await;
            let name = inner
                .borrow_mut()
                .complete_save(ticket, encoded)
                .map_err(to_js_error)?;
            Ok(JsValue::from_str(&name))
        })
    }

    /// Bundle every saved crop into one ZIP. Resolves with a `JsDownload`.
    pub fn export_all(&self) -> Promise {
        let (aggregator, settings, results) = {
            let batch = self.inner.borrow();
            (
                batch.aggregator().clone(),
                batch.settings().clone(),
                batch.results().to_vec(),
            )
        };

        future_to_promise(async move {
            let download = Controller::archive_results(&aggregator, &settings, &results)
                .await
                .map_err(to_js_error)?;
            Ok(JsDownload::from(download).into())
        })
    }

    /// PNG of the active crop. Resolves with a `JsDownload`.
    pub fn quick_download(&self) -> Promise {
        let prepared = {
            let batch = self.inner.borrow();
            batch
                .preview()
                .map(|surface| (surface, batch.settings().preview_name.clone()))
        };

        future_to_promise(async move {
            let (surface, filename) = prepared.map_err(to_js_error)?;
            let download = png_download(&surface, &filename)
                .await
                .map_err(to_js_error)?;
            Ok(JsDownload::from(download).into())
        })
    }
}
