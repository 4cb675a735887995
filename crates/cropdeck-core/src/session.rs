//! Per-image crop session.
//!
//! An [`ImageSession`] owns one decoded image and walks it through
//!
//! ```text
//! Decoding -> Ready -> Editing <-> Committed -> Exported
//! ```
//!
//! Transitions are decided by the pure [`transition`] function so the state
//! machine can be tested without a rendering surface. `Decoding` is the
//! in-flight [`ImageSession::decode`] future: a failed decode never produces
//! a session.

use serde::{Deserialize, Serialize};

use crate::decode::{decode_image, DecodeError};
use crate::encode::{Blob, OutputFormat};
use crate::error::CropError;
use crate::export::Download;
use crate::settings::CropSettings;
use crate::transform::{initial_region, render_crop, to_blob, CropRegion, SourceImage, Surface};

/// A file handed over by the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Identity of a session: the batch epoch it was loaded in and the position
/// of its file in that selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
    pub epoch: u64,
    pub file_index: usize,
}

impl SessionId {
    pub fn new(epoch: u64, file_index: usize) -> Self {
        Self { epoch, file_index }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Decoding,
    Ready,
    Editing,
    Committed,
    Exported,
}

/// Events emitted by the selection widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "region", rename_all = "camelCase")]
pub enum CropEvent {
    /// The selection moved or resized; emitted continuously while dragging.
    RegionChanged(CropRegion),
    /// The user released the pointer.
    RegionCommitted(CropRegion),
}

/// Next state for `event`, or `None` when the event is ignored.
///
/// A session still decoding has no displayed image to select on. A commit
/// without extent never replaces an earlier commit.
pub fn transition(state: SessionState, event: &CropEvent) -> Option<SessionState> {
    match (state, event) {
        (SessionState::Decoding, _) => None,
        (_, CropEvent::RegionChanged(_)) => Some(SessionState::Editing),
        (_, CropEvent::RegionCommitted(region)) if region.has_extent() => {
            Some(SessionState::Committed)
        }
        (_, CropEvent::RegionCommitted(_)) => None,
    }
}

/// One image being cropped.
#[derive(Debug, Clone)]
pub struct ImageSession {
    id: SessionId,
    display_name: String,
    source: SourceImage,
    active_region: CropRegion,
    committed: Option<CropRegion>,
    exported: Option<Blob>,
    state: SessionState,
}

impl ImageSession {
    /// Decode a picked file into a `Ready` session.
    ///
    /// Files whose MIME type is known and not `image/*` are rejected without
    /// looking at the bytes.
    pub async fn decode(
        id: SessionId,
        file: InputFile,
        settings: &CropSettings,
    ) -> Result<Self, CropError> {
        if let Some(mime) = &file.mime_type {
            if !mime.starts_with("image/") {
                return Err(DecodeError::InvalidFormat.into());
            }
        }

        let image = decode_image(&file.bytes)?;
        log::debug!(
            "Decoded '{}' at {}x{}",
            file.name,
            image.width,
            image.height
        );
        Ok(Self::new(id, file.name, SourceImage::new(image), settings))
    }

    /// A `Ready` session over an already decoded image.
    pub fn new(
        id: SessionId,
        display_name: impl Into<String>,
        source: SourceImage,
        settings: &CropSettings,
    ) -> Self {
        let active_region = initial_region(
            source.displayed_width(),
            source.displayed_height(),
            settings.initial_width_percent,
            settings.initial_aspect,
        );
        Self {
            id,
            display_name: display_name.into(),
            source,
            active_region,
            committed: None,
            exported: None,
            state: SessionState::Ready,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The in-progress selection.
    pub fn active_region(&self) -> &CropRegion {
        &self.active_region
    }

    pub fn committed_crop(&self) -> Option<&CropRegion> {
        self.committed.as_ref()
    }

    pub fn exported_blob(&self) -> Option<&Blob> {
        self.exported.as_ref()
    }

    /// Record the size the host laid the image out at.
    pub fn set_displayed_size(&mut self, width: f64, height: f64) {
        self.source.set_displayed_size(width, height);
    }

    /// Lay the image out inside a bounding box, never enlarging it.
    pub fn fit_within(&mut self, max_width: f64, max_height: f64) {
        self.source.fit_within(max_width, max_height);
    }

    /// The region the selection widget should start from.
    pub fn initial_region(&self, settings: &CropSettings) -> CropRegion {
        initial_region(
            self.source.displayed_width(),
            self.source.displayed_height(),
            settings.initial_width_percent,
            settings.initial_aspect,
        )
    }

    /// Apply a selection widget event. Returns whether it was accepted.
    pub fn handle_event(&mut self, event: CropEvent) -> bool {
        let Some(next) = transition(self.state, &event) else {
            log::debug!(
                "Session '{}' ignored {:?} in state {:?}",
                self.display_name,
                event,
                self.state
            );
            return false;
        };

        match event {
            CropEvent::RegionChanged(region) => self.active_region = region,
            CropEvent::RegionCommitted(region) => {
                self.active_region = region;
                self.committed = Some(region);
            }
        }
        self.state = next;
        true
    }

    /// Render the committed crop for display. Does not change state.
    pub fn preview(&self, settings: &CropSettings) -> Result<Surface, CropError> {
        let crop = self.committed.as_ref().ok_or(CropError::MissingCrop)?;
        render_crop(&self.source, crop, settings.pixel_density, settings.resample)
    }

    /// First half of a save: render the surface that will be encoded.
    pub fn prepare_export(&self, settings: &CropSettings) -> Result<Surface, CropError> {
        self.preview(settings)
    }

    /// Second half of a save: record the encoded blob.
    pub fn finish_export(&mut self, blob: Blob) {
        log::debug!(
            "Session '{}' exported {} bytes",
            self.display_name,
            blob.len()
        );
        self.exported = Some(blob);
        self.state = SessionState::Exported;
    }

    /// Render, encode as JPEG and record the result.
    ///
    /// On failure the session keeps its state and the save can be retried.
    pub async fn export(&mut self, settings: &CropSettings) -> Result<Blob, CropError> {
        let surface = self.prepare_export(settings)?;
        let blob = to_blob(&surface, OutputFormat::Jpeg, settings.jpeg_quality).await?;
        self.finish_export(blob.clone());
        Ok(blob)
    }

    /// PNG of the committed crop for the single-image download.
    pub async fn quick_download(&self, settings: &CropSettings) -> Result<Download, CropError> {
        let surface = self.preview(settings)?;
        png_download(&surface, &settings.preview_name).await
    }
}

/// Encode a rendered surface as a PNG download named `filename`.
pub async fn png_download(surface: &Surface, filename: &str) -> Result<Download, CropError> {
    let blob = to_blob(surface, OutputFormat::Png, 1.0).await?;
    Ok(Download {
        filename: filename.to_string(),
        mime_type: blob.mime_type().to_string(),
        bytes: blob.bytes,
    })
}
