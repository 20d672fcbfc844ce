//! Turns files on disk or in memory into a [`ReportSource`].
//!
//! A `.pbix`/`.pbit` archive carries the legacy `Report/Layout` document, usually
//! UTF-16LE encoded. A PBIP package (zipped or as a folder) carries the directory
//! schema under `definition/`.

use std::io::{Read, Seek};

use log::{debug, warn};
use serde_json::Value;

use crate::container::{ArchiveLimits, LoadError, ReportArchive};
use crate::source::{DirectoryDocuments, ReportSource};

const LAYOUT_ENTRY: &str = "Report/Layout";
const DEFINITION_DIR: &str = "definition";

pub fn load_report_archive<R: Read + Seek + 'static>(
    reader: R,
    limits: ArchiveLimits,
) -> Result<ReportSource, LoadError> {
    let mut archive = ReportArchive::open_from_reader(reader, limits)?;

    if let Some(name) = archive.find_entry(LAYOUT_ENTRY) {
        debug!("reading legacy layout from '{name}'");
        let bytes = archive.read_entry(&name)?;
        return parse_layout(&bytes, &name);
    }

    let mut docs = DirectoryDocuments::new();
    for name in archive.entry_names() {
        if !is_definition_json(&name) {
            continue;
        }
        let bytes = archive.read_entry(&name)?;
        match decode_text(&bytes, &name) {
            Ok(text) => docs.insert(&name, text),
            Err(err) => warn!("{err}; skipped"),
        }
    }

    if docs.is_empty() {
        return Err(LoadError::DefinitionNotFound);
    }
    debug!("collected {} definition documents", docs.len());
    Ok(ReportSource::Directory(docs))
}

/// Decodes and parses a standalone layout document.
pub fn parse_layout(bytes: &[u8], path: &str) -> Result<ReportSource, LoadError> {
    let text = decode_text(bytes, path)?;
    let layout: Value = serde_json::from_str(&text).map_err(|e| LoadError::ParseFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    if !layout.is_object() {
        return Err(LoadError::ParseFailed {
            path: path.to_string(),
            reason: "layout root is not a JSON object".to_string(),
        });
    }
    Ok(ReportSource::Legacy(layout))
}

/// Decodes UTF-16 (LE with or without BOM, BE with BOM) or UTF-8 (optional BOM).
pub fn decode_text(bytes: &[u8], path: &str) -> Result<String, LoadError> {
    let decode_failed = |reason: &str| LoadError::DecodeFailed {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if let Some(body) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(body, true).ok_or_else(|| decode_failed("invalid UTF-16LE text"));
    }
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(body, false).ok_or_else(|| decode_failed("invalid UTF-16BE text"));
    }
    if looks_like_utf16le(bytes) {
        return decode_utf16(bytes, true).ok_or_else(|| decode_failed("invalid UTF-16LE text"));
    }

    let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8(body.to_vec()).map_err(|_| decode_failed("invalid UTF-8 text"))
}

// Layout JSON starts with an ASCII character, so a BOM-less UTF-16LE stream shows a
// zero high byte in the first code unit.
fn looks_like_utf16le(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes[0] != 0 && bytes[1] == 0
}

fn decode_utf16(body: &[u8], little_endian: bool) -> Option<String> {
    if body.len() % 2 != 0 {
        return None;
    }
    let code_units: Vec<u16> = body
        .chunks_exact(2)
        .map(|chunk| {
            if little_endian {
                u16::from_le_bytes([chunk[0], chunk[1]])
            } else {
                u16::from_be_bytes([chunk[0], chunk[1]])
            }
        })
        .collect();
    String::from_utf16(&code_units).ok()
}

fn is_definition_json(name: &str) -> bool {
    let name = name.replace('\\', "/");
    name.to_ascii_lowercase().ends_with(".json")
        && name.split('/').any(|segment| segment == DEFINITION_DIR)
}

#[cfg(feature = "std-fs")]
pub use fs::{load_report_dir, load_report_path, DirScanConfig};

#[cfg(feature = "std-fs")]
mod fs {
    use std::path::{Path, PathBuf};

    use log::warn;

    use super::*;
    use crate::config::AnalysisConfig;

    #[derive(Debug, Clone)]
    pub struct DirScanConfig {
        /// Directory names to skip entirely during traversal.
        pub ignore_dir_names: Vec<String>,
        /// Files above this size are skipped (bytes).
        pub max_file_bytes: u64,
    }

    impl Default for DirScanConfig {
        fn default() -> Self {
            Self {
                ignore_dir_names: [
                    ".git",
                    ".pbi",
                    "target",
                    "node_modules",
                    ".venv",
                    ".idea",
                    ".vscode",
                ]
                .iter()
                    .map(|name| name.to_string())
                    .collect(),
                max_file_bytes: 10 * 1024 * 1024,
            }
        }
    }

    /// Reads every `.json` document of a PBIP report folder.
    ///
    /// `root` may be the `*.Report` folder or its `definition/` folder. Document paths
    /// are recorded relative to the parent of `root`, with forward slashes.
    pub fn load_report_dir(root: &Path, scan: &DirScanConfig) -> Result<ReportSource, LoadError> {
        if !root.is_dir() {
            return Err(LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("report folder not found: {}", root.display()),
            )));
        }
        let base = root.parent().unwrap_or(root);

        let mut docs = DirectoryDocuments::new();
        let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    if !should_ignore_dir_name(&path, &scan.ignore_dir_names) {
                        stack.push(path);
                    }
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let rel = rel_path(base, &path);
                if !is_definition_json(&rel) {
                    continue;
                }
                let size = entry.metadata()?.len();
                if size > scan.max_file_bytes {
                    warn!(
                        "skipping '{rel}': {size} bytes exceeds the {} byte cap",
                        scan.max_file_bytes
                    );
                    continue;
                }
                let bytes = std::fs::read(&path)?;
                match decode_text(&bytes, &rel) {
                    Ok(text) => docs.insert(&rel, text),
                    Err(err) => warn!("{err}; skipped"),
                }
            }
        }

        if docs.is_empty() {
            return Err(LoadError::DefinitionNotFound);
        }
        Ok(ReportSource::Directory(docs))
    }

    /// Loads any supported input: a report folder, a bare layout JSON file, or an archive.
    pub fn load_report_path(
        path: &Path,
        config: &AnalysisConfig,
    ) -> Result<ReportSource, LoadError> {
        if path.is_dir() {
            let scan = DirScanConfig {
                max_file_bytes: config.max_file_bytes,
                ..DirScanConfig::default()
            };
            return load_report_dir(path, &scan);
        }

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json || path.file_name().is_some_and(|name| name == "Layout") {
            let bytes = std::fs::read(path)?;
            return parse_layout(&bytes, &path.to_string_lossy());
        }

        let file = std::fs::File::open(path)?;
        load_report_archive(file, config.archive_limits())
    }

    fn should_ignore_dir_name(path: &Path, ignore: &[String]) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        ignore.iter().any(|value| value == name)
    }

    fn rel_path(base: &Path, path: &Path) -> String {
        let rel = path.strip_prefix(base).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
