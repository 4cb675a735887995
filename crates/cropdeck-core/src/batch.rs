//! Batch workflow over several images.
//!
//! [`BatchController`] owns the loaded sessions, which one is active, and the
//! crops saved so far. Whole operations (`load_files`, `save_active`,
//! `export_all`) take `&mut self` and are serialized by the borrow checker.
//!
//! Hosts that cannot hold a borrow across an await (the wasm bindings keep
//! the batch in a `RefCell`) use the split forms instead:
//!
//! - [`BatchController::begin_load`] / [`BatchController::decode_files`] /
//!   [`BatchController::finish_load`]
//! - [`BatchController::begin_save`] / [`BatchController::encode_ticket`] /
//!   [`BatchController::complete_save`]
//!
//! Two guards keep interleaved calls consistent. A `busy` flag, set while a
//! save is in flight, makes navigation and further saves fail with
//! [`CropError::Busy`]. An `epoch` counter, bumped by every load, lets a late
//! decode or save result for a replaced batch be recognised and discarded.

use futures_util::future::join_all;

use crate::encode::{Blob, OutputFormat};
use crate::error::CropError;
use crate::export::{ArchiveEntry, ArchiveWriter, Download, ExportAggregator, ZipArchiveWriter};
use crate::session::{CropEvent, ImageSession, InputFile, SessionId};
use crate::settings::CropSettings;
use crate::transform::{to_blob, CropRegion, Surface};

/// A file that could not be loaded.
#[derive(Debug)]
pub struct FileFailure {
    pub name: String,
    pub error: CropError,
}

/// Outcome of decoding a file selection, before it is installed.
#[derive(Debug)]
pub struct LoadOutcome {
    pub epoch: u64,
    pub sessions: Vec<ImageSession>,
    pub failures: Vec<FileFailure>,
}

/// What a load did.
#[derive(Debug)]
pub struct LoadReport {
    pub epoch: u64,
    pub loaded: usize,
    pub failures: Vec<FileFailure>,
}

/// A saved crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub session_id: SessionId,
    pub name: String,
    pub blob: Blob,
}

/// A save in flight: the rendered surface plus what is needed to file the
/// result once encoding finishes.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    epoch: u64,
    index: usize,
    session_id: SessionId,
    surface: Surface,
    quality: f32,
}

/// Ordered sessions, the active index and the saved results.
#[derive(Debug)]
pub struct BatchController<W = ZipArchiveWriter> {
    sessions: Vec<ImageSession>,
    active_index: usize,
    results: Vec<ExportEntry>,
    settings: CropSettings,
    aggregator: ExportAggregator<W>,
    epoch: u64,
    busy: bool,
}

impl BatchController<ZipArchiveWriter> {
    /// An empty batch exporting ZIP archives.
    pub fn new(settings: CropSettings) -> Self {
        Self::with_writer(settings, ZipArchiveWriter)
    }
}

impl Default for BatchController<ZipArchiveWriter> {
    fn default() -> Self {
        Self::new(CropSettings::default())
    }
}

impl<W: ArchiveWriter> BatchController<W> {
    pub fn with_writer(settings: CropSettings, writer: W) -> Self {
        Self {
            sessions: Vec::new(),
            active_index: 0,
            results: Vec::new(),
            settings,
            aggregator: ExportAggregator::new(writer),
            epoch: 0,
            busy: false,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &CropSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut CropSettings {
        &mut self.settings
    }

    pub fn sessions(&self) -> &[ImageSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active(&self) -> Option<&ImageSession> {
        self.sessions.get(self.active_index)
    }

    pub fn active_mut(&mut self) -> Option<&mut ImageSession> {
        self.sessions.get_mut(self.active_index)
    }

    pub fn results(&self) -> &[ExportEntry] {
        &self.results
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_next(&self) -> bool {
        self.active_index + 1 < self.sessions.len()
    }

    pub fn has_previous(&self) -> bool {
        self.active_index > 0
    }

    pub fn aggregator(&self) -> &ExportAggregator<W> {
        &self.aggregator
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the batch with a new file selection.
    ///
    /// Every file is decoded independently. Files that fail are logged and
    /// listed in the report; they never abort the others.
    pub async fn load_files(&mut self, files: Vec<InputFile>) -> LoadReport {
        let epoch = self.begin_load();
        let outcome = Self::decode_files(epoch, files, &self.settings).await;
        self.install(outcome)
    }

    /// Start a new epoch: clears sessions and results and invalidates any
    /// in-flight save. Returns the epoch the decode must be tagged with.
    pub fn begin_load(&mut self) -> u64 {
        self.epoch += 1;
        self.sessions.clear();
        self.results.clear();
        self.active_index = 0;
        self.busy = false;
        self.epoch
    }

    /// Decode every file of a selection independently. Output order follows
    /// input order.
    pub async fn decode_files(
        epoch: u64,
        files: Vec<InputFile>,
        settings: &CropSettings,
    ) -> LoadOutcome {
        let decodes = files.into_iter().enumerate().map(|(index, file)| {
            let name = file.name.clone();
            async move {
                let result = ImageSession::decode(SessionId::new(epoch, index), file, settings).await;
                (name, result)
            }
        });

        let mut sessions = Vec::new();
        let mut failures = Vec::new();
        for (name, result) in join_all(decodes).await {
            match result {
                Ok(session) => sessions.push(session),
                Err(error) => {
                    log::warn!("Skipping '{}': {}", name, error);
                    failures.push(FileFailure { name, error });
                }
            }
        }

        LoadOutcome {
            epoch,
            sessions,
            failures,
        }
    }

    /// Install a decoded selection if it still belongs to the current epoch.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> Result<LoadReport, CropError> {
        if outcome.epoch != self.epoch {
            log::warn!(
                "Discarding decode for epoch {} (current {})",
                outcome.epoch,
                self.epoch
            );
            return Err(CropError::StaleResult {
                ticket: outcome.epoch,
                current: self.epoch,
            });
        }
        Ok(self.install(outcome))
    }

    fn install(&mut self, outcome: LoadOutcome) -> LoadReport {
        self.sessions = outcome.sessions;
        self.active_index = 0;
        self.results.clear();

        log::info!(
            "Loaded {} image(s), {} failed (epoch {})",
            self.sessions.len(),
            outcome.failures.len(),
            outcome.epoch
        );

        LoadReport {
            epoch: outcome.epoch,
            loaded: self.sessions.len(),
            failures: outcome.failures,
        }
    }

    // ------------------------------------------------------------------
    // Navigation and editing
    // ------------------------------------------------------------------

    /// Move to the next image. Returns whether the index changed.
    pub fn next(&mut self) -> Result<bool, CropError> {
        if self.busy {
            return Err(CropError::Busy);
        }
        Ok(self.advance())
    }

    /// Move to the previous image. Returns whether the index changed.
    pub fn previous(&mut self) -> Result<bool, CropError> {
        if self.busy {
            return Err(CropError::Busy);
        }
        if !self.has_previous() {
            return Ok(false);
        }
        self.active_index -= 1;
        Ok(true)
    }

    fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.active_index += 1;
        true
    }

    /// Forward a selection widget event to the active session.
    pub fn handle_event(&mut self, event: CropEvent) -> Result<bool, CropError> {
        let session = self.active_mut().ok_or(CropError::NoActiveImage)?;
        Ok(session.handle_event(event))
    }

    /// Record the active image's on-screen size.
    pub fn set_displayed_size(&mut self, width: f64, height: f64) -> Result<(), CropError> {
        let session = self.active_mut().ok_or(CropError::NoActiveImage)?;
        session.set_displayed_size(width, height);
        Ok(())
    }

    /// Lay the active image out inside a bounding box, never enlarging it.
    pub fn fit_active_within(&mut self, max_width: f64, max_height: f64) -> Result<(), CropError> {
        let session = self.active_mut().ok_or(CropError::NoActiveImage)?;
        session.fit_within(max_width, max_height);
        Ok(())
    }

    /// Starting region for the selection widget on the active image.
    pub fn initial_region(&self) -> Result<CropRegion, CropError> {
        let session = self.active().ok_or(CropError::NoActiveImage)?;
        Ok(session.initial_region(&self.settings))
    }

    /// Render the active image's committed crop.
    pub fn preview(&self) -> Result<Surface, CropError> {
        let session = self.active().ok_or(CropError::NoActiveImage)?;
        session.preview(&self.settings)
    }

    // ------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------

    /// Save the active image's crop and move on to the next image.
    ///
    /// Returns the name the crop was filed under. On failure nothing is
    /// recorded and the save can be retried.
    pub async fn save_active(&mut self) -> Result<String, CropError> {
        let ticket = self.begin_save()?;
        let encoded = Self::encode_ticket(&ticket).await;
        self.complete_save(ticket, encoded)
    }

    /// Render the active crop and mark the batch busy.
    pub fn begin_save(&mut self) -> Result<SaveTicket, CropError> {
        if self.busy {
            return Err(CropError::Busy);
        }
        let session = self.active().ok_or(CropError::NoActiveImage)?;
        let surface = session.prepare_export(&self.settings)?;

        let ticket = SaveTicket {
            epoch: self.epoch,
            index: self.active_index,
            session_id: session.id(),
            surface,
            quality: self.settings.jpeg_quality,
        };
        self.busy = true;
        Ok(ticket)
    }

    /// Encode a ticket's surface as JPEG.
    pub async fn encode_ticket(ticket: &SaveTicket) -> Result<Blob, CropError> {
        to_blob(&ticket.surface, OutputFormat::Jpeg, ticket.quality).await
    }

    /// File an encode result.
    ///
    /// A ticket from an older epoch is discarded with `StaleResult`. An
    /// encode error releases the busy flag and is returned unchanged. A
    /// successful save replaces any earlier result for the same session,
    /// otherwise it is appended; then the batch advances.
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        encoded: Result<Blob, CropError>,
    ) -> Result<String, CropError> {
        if ticket.epoch != self.epoch {
            log::warn!(
                "Discarding save for epoch {} (current {})",
                ticket.epoch,
                self.epoch
            );
            return Err(CropError::StaleResult {
                ticket: ticket.epoch,
                current: self.epoch,
            });
        }
        self.busy = false;

        let blob = encoded?;
        let session = self
            .sessions
            .get_mut(ticket.index)
            .filter(|s| s.id() == ticket.session_id)
            .ok_or(CropError::StaleResult {
                ticket: ticket.epoch,
                current: self.epoch,
            })?;
        session.finish_export(blob.clone());

        let name = self.settings.result_name(ticket.index);
        match self
            .results
            .iter_mut()
            .find(|entry| entry.session_id == ticket.session_id)
        {
            Some(entry) => {
                log::info!("Replaced saved crop '{}'", entry.name);
                entry.blob = blob;
            }
            None => {
                log::info!("Saved crop '{}' ({} bytes)", name, blob.len());
                self.results.push(ExportEntry {
                    session_id: ticket.session_id,
                    name: name.clone(),
                    blob,
                });
            }
        }

        self.advance();
        Ok(name)
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Bundle every saved crop into one archive.
    ///
    /// Results are kept, so calling this again re-exports the same set.
    pub async fn export_all(&self) -> Result<Download, CropError> {
        Self::archive_results(&self.aggregator, &self.settings, &self.results).await
    }

    /// Archive a snapshot of saved results.
    ///
    /// Same as [`export_all`](Self::export_all) without borrowing the batch,
    /// for hosts that must release it before awaiting.
    pub async fn archive_results(
        aggregator: &ExportAggregator<W>,
        settings: &CropSettings,
        results: &[ExportEntry],
    ) -> Result<Download, CropError> {
        if results.is_empty() {
            return Err(CropError::EmptyExportSet);
        }

        let entries: Vec<ArchiveEntry<'_>> = results
            .iter()
            .map(|entry| ArchiveEntry::new(&entry.name, &entry.blob.bytes))
            .collect();
        let bytes = aggregator.archive(&entries).await?;

        Ok(Download {
            filename: settings.archive_name.clone(),
            mime_type: aggregator.writer().mime_type().to_string(),
            bytes,
        })
    }

    /// PNG of the active crop for a single-image download.
    pub async fn quick_download(&self) -> Result<Download, CropError> {
        let session = self.active().ok_or(CropError::NoActiveImage)?;
        session.quick_download(&self.settings).await
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::decode::DecodedImage;
    use crate::transform::SourceImage;
    use proptest::prelude::*;

    fn batch_of(count: usize) -> BatchController {
        let settings = CropSettings::new();
        let sessions = (0..count)
            .map(|i| {
                let source = SourceImage::new(DecodedImage::new(2, 2, vec![0; 12]));
                ImageSession::new(SessionId::new(1, i), format!("{i}"), source, &settings)
            })
            .collect();

        let mut batch = BatchController::new(settings);
        let epoch = batch.begin_load();
        batch
            .finish_load(LoadOutcome {
                epoch,
                sessions,
                failures: Vec::new(),
            })
            .unwrap();
        batch
    }

    proptest! {
        /// Property: any sequence of next/previous keeps the index in range.
        #[test]
        fn prop_navigation_stays_in_bounds(
            count in 1usize..=6,
            moves in prop::collection::vec(any::<bool>(), 0..40),
        ) {
            let mut batch = batch_of(count);
            for forward in moves {
                let before = batch.active_index();
                let moved = if forward { batch.next() } else { batch.previous() }.unwrap();

                prop_assert!(batch.active_index() < count);
                prop_assert_eq!(moved, batch.active_index() != before);
            }
        }
    }
}
