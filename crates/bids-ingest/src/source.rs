//! Locating the raw DICOM export of a source scan.

use std::path::{Path, PathBuf};

use bids_model::PipelineOptions;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// The resolved raw export of one scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSource {
    pub scanner: String,
    /// Full scan id (the directory name), possibly longer than the requested one.
    pub scan_id: String,
    pub scan_dir: PathBuf,
}

fn list_dir_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut names = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Resolves a (possibly abbreviated) scan id to its folder under the scanner
/// directory chosen by the id's first character.
///
/// Exactly one scan folder may start with the id.
pub fn resolve_scan(options: &PipelineOptions, scan_id: &str) -> Result<ScanSource> {
    let scan_id = scan_id.trim();
    let scanner = options
        .scanner_for(scan_id)
        .ok_or_else(|| IngestError::UnknownScanner {
            scan_id: scan_id.to_string(),
        })?
        .to_string();
    let scanner_dir = options.source_root.join(&scanner);
    let matches: Vec<String> = list_dir_names(&scanner_dir)?
        .into_iter()
        .filter(|name| name.starts_with(scan_id))
        .collect();

    let full_id = match matches.as_slice() {
        [] => {
            return Err(IngestError::NoMatchingScan {
                scan_id: scan_id.to_string(),
                dir: scanner_dir,
            });
        }
        [single] => single.clone(),
        _ => {
            return Err(IngestError::AmbiguousScan {
                scan_id: scan_id.to_string(),
                matches,
            });
        }
    };
    if full_id != scan_id {
        info!(requested = %scan_id, resolved = %full_id, "expanded source scan id");
    } else {
        debug!(scan_id = %full_id, "source scan id verified");
    }
    Ok(ScanSource {
        scanner,
        scan_dir: scanner_dir.join(&full_id),
        scan_id: full_id,
    })
}

/// Compiles the configured source-folder pattern.
pub fn source_folder_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| IngestError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Series folders of a scan whose names match `pattern`, sorted by name.
pub fn discover_source_folders(scan_dir: &Path, pattern: &Regex) -> Result<Vec<String>> {
    Ok(list_dir_names(scan_dir)?
        .into_iter()
        .filter(|name| pattern.is_match(name))
        .collect())
}
