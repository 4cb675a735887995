//! Export aggregation: bundling saved crops into one archive.
//!
//! The archive format sits behind [`ArchiveWriter`]; [`ZipArchiveWriter`] is
//! the default. [`ExportAggregator`] resolves duplicate names before the
//! writer sees the entries, so writers never have to handle collisions.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors raised while producing an archive.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive writer failed: {0}")]
    Writer(String),
}

/// One named file going into an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveEntry<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> ArchiveEntry<'a> {
    pub fn new(name: &'a str, bytes: &'a [u8]) -> Self {
        Self { name, bytes }
    }
}

/// A finished file ready for the download trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Produces a single archive from uniquely named entries.
pub trait ArchiveWriter {
    /// MIME type of the produced archive.
    fn mime_type(&self) -> &'static str;

    /// Write `entries` in order. Names are guaranteed unique.
    fn write(&self, entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>, ExportError>;
}

/// Deflate-compressed ZIP archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveWriter;

impl ArchiveWriter for ZipArchiveWriter {
    fn mime_type(&self) -> &'static str {
        "application/zip"
    }

    fn write(&self, entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in entries {
            zip.start_file(entry.name, options)?;
            zip.write_all(entry.bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Hands saved crops to an [`ArchiveWriter`].
#[derive(Debug, Clone, Default)]
pub struct ExportAggregator<W = ZipArchiveWriter> {
    writer: W,
}

impl<W: ArchiveWriter> ExportAggregator<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Build an archive from `entries`.
    ///
    /// Later entries win over earlier entries with the same name; the
    /// surviving entry keeps the position of the first occurrence.
    pub async fn archive(&self, entries: &[ArchiveEntry<'_>]) -> Result<Vec<u8>, ExportError> {
        let unique = last_write_wins(entries);
        if unique.len() != entries.len() {
            log::warn!(
                "Archive request had {} duplicate name(s); keeping the latest of each",
                entries.len() - unique.len()
            );
        }

        let bytes = self.writer.write(&unique)?;
        log::info!(
            "Archived {} entries into {} bytes",
            unique.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn last_write_wins<'a>(entries: &[ArchiveEntry<'a>]) -> Vec<ArchiveEntry<'a>> {
    let mut unique: Vec<ArchiveEntry<'a>> = Vec::with_capacity(entries.len());
    for entry in entries {
        match unique.iter_mut().find(|slot| slot.name == entry.name) {
            Some(slot) => *slot = *entry,
            None => unique.push(*entry),
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_zip_contains_entries_in_order() {
        let aggregator = ExportAggregator::new(ZipArchiveWriter);
        let entries = [
            ArchiveEntry::new("cropped_image_1.jpeg", b"first"),
            ArchiveEntry::new("cropped_image_2.jpeg", b"second"),
        ];

        let bytes = aggregator.archive(&entries).await.unwrap();
        assert_eq!(&bytes[0..2], b"PK");

        let files = read_zip(&bytes);
        assert_eq!(
            files,
            vec![
                ("cropped_image_1.jpeg".to_string(), b"first".to_vec()),
                ("cropped_image_2.jpeg".to_string(), b"second".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_names_last_write_wins() {
        let aggregator = ExportAggregator::new(ZipArchiveWriter);
        let entries = [
            ArchiveEntry::new("a.jpeg", b"old"),
            ArchiveEntry::new("b.jpeg", b"b"),
            ArchiveEntry::new("a.jpeg", b"new"),
        ];

        let files = read_zip(&aggregator.archive(&entries).await.unwrap());
        assert_eq!(
            files,
            vec![
                ("a.jpeg".to_string(), b"new".to_vec()),
                ("b.jpeg".to_string(), b"b".to_vec()),
            ]
        );
    }

    #[test]
    fn test_empty_archive_is_still_valid() {
        let bytes = ZipArchiveWriter.write(&[]).unwrap();
        assert!(read_zip(&bytes).is_empty());
    }

    #[test]
    fn test_last_write_wins_keeps_first_position() {
        let entries = [
            ArchiveEntry::new("x", b"1"),
            ArchiveEntry::new("y", b"2"),
            ArchiveEntry::new("x", b"3"),
            ArchiveEntry::new("z", b"4"),
        ];
        let unique = last_write_wins(&entries);
        let names: Vec<_> = unique.iter().map(|e| e.name).collect();
        assert_eq!(names, ["x", "y", "z"]);
        assert_eq!(unique[0].bytes, b"3");
    }

    #[test]
    fn test_zip_mime_type() {
        assert_eq!(ZipArchiveWriter.mime_type(), "application/zip");
    }
}
