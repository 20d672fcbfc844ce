//! ZIP container handling for `.pbix`/`.pbit` files and zipped PBIP packages.
//!
//! Every read is checked against [`ArchiveLimits`] so a hostile archive cannot make
//! the loader inflate unbounded data.

use std::io::{Read, Seek};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error_codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub max_entries: usize,
    pub max_part_uncompressed_bytes: u64,
    pub max_total_uncompressed_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_part_uncompressed_bytes: 100 * 1024 * 1024,
            max_total_uncompressed_bytes: 500 * 1024 * 1024,
        }
    }
}

/// Failure to turn an input into a decoded report source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a ZIP archive")]
    NotAnArchive,
    #[error("no report definition found (expected Report/Layout or a definition/ folder)")]
    DefinitionNotFound,
    #[error("failed to decode '{path}': {reason}")]
    DecodeFailed { path: String, reason: String },
    #[error("failed to parse '{path}' as JSON: {reason}")]
    ParseFailed { path: String, reason: String },
    #[error("archive has too many entries: {entries} (limit: {max_entries})")]
    TooManyEntries { entries: usize, max_entries: usize },
    #[error("part '{path}' is too large: {size} bytes (limit: {limit} bytes)")]
    PartTooLarge { path: String, size: u64, limit: u64 },
    #[error("total uncompressed size exceeds limit: would exceed {limit} bytes")]
    TotalTooLarge { limit: u64 },
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::Io(_) => error_codes::LOAD_IO,
            LoadError::NotAnArchive => error_codes::LOAD_NOT_ARCHIVE,
            LoadError::DefinitionNotFound => error_codes::LOAD_DEFINITION_NOT_FOUND,
            LoadError::DecodeFailed { .. } => error_codes::LOAD_DECODE_FAILED,
            LoadError::ParseFailed { .. } => error_codes::LOAD_PARSE_FAILED,
            LoadError::TooManyEntries { .. } => error_codes::LOAD_TOO_MANY_ENTRIES,
            LoadError::PartTooLarge { .. } => error_codes::LOAD_PART_TOO_LARGE,
            LoadError::TotalTooLarge { .. } => error_codes::LOAD_TOTAL_TOO_LARGE,
        }
    }
}

pub(crate) trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

pub struct ReportArchive {
    archive: ZipArchive<Box<dyn ReadSeek>>,
    limits: ArchiveLimits,
    total_read: u64,
}

impl ReportArchive {
    pub fn open_from_reader<R: Read + Seek + 'static>(
        reader: R,
        limits: ArchiveLimits,
    ) -> Result<ReportArchive, LoadError> {
        let reader: Box<dyn ReadSeek> = Box::new(reader);
        let archive = ZipArchive::new(reader).map_err(|err| match err {
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
                LoadError::NotAnArchive
            }
            ZipError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                LoadError::NotAnArchive
            }
            ZipError::Io(e) => LoadError::Io(e),
            other => LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                other.to_string(),
            )),
        })?;

        if archive.len() > limits.max_entries {
            return Err(LoadError::TooManyEntries {
                entries: archive.len(),
                max_entries: limits.max_entries,
            });
        }

        Ok(ReportArchive {
            archive,
            limits,
            total_read: 0,
        })
    }

    #[cfg(feature = "std-fs")]
    pub fn open_from_path(
        path: impl AsRef<std::path::Path>,
        limits: ArchiveLimits,
    ) -> Result<ReportArchive, LoadError> {
        let file = std::fs::File::open(path)?;
        Self::open_from_reader(file, limits)
    }

    /// Entry names in archive order, directories excluded.
    pub fn entry_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    /// Case-insensitive lookup of an entry name, returning the stored spelling.
    pub fn find_entry(&self, name: &str) -> Option<String> {
        self.archive
            .file_names()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(str::to_string)
    }

    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, LoadError> {
        let read_failed = |reason: String| LoadError::DecodeFailed {
            path: name.to_string(),
            reason,
        };

        let mut file = self.archive.by_name(name).map_err(|e| match e {
            ZipError::Io(io_err) => LoadError::Io(io_err),
            other => read_failed(other.to_string()),
        })?;

        let size = file.size();
        if size > self.limits.max_part_uncompressed_bytes {
            return Err(LoadError::PartTooLarge {
                path: name.to_string(),
                size,
                limit: self.limits.max_part_uncompressed_bytes,
            });
        }

        let new_total = self.total_read.saturating_add(size);
        if new_total > self.limits.max_total_uncompressed_bytes {
            return Err(LoadError::TotalTooLarge {
                limit: self.limits.max_total_uncompressed_bytes,
            });
        }

        let mut buf = Vec::with_capacity(size as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| read_failed(e.to_string()))?;

        self.total_read = new_total;
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}
