//! Discovery of converted series in the work directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bids_model::{Series, SeriesFile};
use tracing::debug;

use crate::converter::ConvertedPair;
use crate::error::{IngestError, Result};
use crate::sidecar::read_sidecar;

const SIDECAR_EXTENSION: &str = ".json";
const PRIMARY_EXTENSIONS: [&str; 2] = [".nii.gz", ".nii"];

/// Lists the regular files directly inside `dir`, sorted by file name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Sidecar stems in `files` that start with `hint`.
fn sidecar_stems<'a>(files: &'a [PathBuf], hint: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    files.iter().filter_map(move |path| {
        let name = file_name(path);
        let stem = name.strip_suffix(SIDECAR_EXTENSION)?;
        stem.starts_with(hint).then_some(stem)
    })
}

/// Files sharing `stem`, paired with the extension that follows it.
fn siblings(files: &[PathBuf], stem: &str) -> Vec<SeriesFile> {
    files
        .iter()
        .filter_map(|path| {
            let rest = file_name(path).strip_prefix(stem)?;
            rest.starts_with('.')
                .then(|| SeriesFile::new(path.clone(), rest))
        })
        .collect()
}

fn primary_of(files: &[SeriesFile]) -> Option<&SeriesFile> {
    PRIMARY_EXTENSIONS
        .iter()
        .find_map(|ext| files.iter().find(|file| file.extension == *ext))
}

/// Image/sidecar pairs in `dir` produced for `hint`.
pub fn converted_pairs(dir: &Path, hint: &str) -> Result<Vec<ConvertedPair>> {
    let files = list_files(dir)?;
    let mut pairs = Vec::new();
    for stem in sidecar_stems(&files, hint) {
        let group = siblings(&files, stem);
        let primary = primary_of(&group).ok_or_else(|| IngestError::MissingPrimaryFile {
            series: stem.to_string(),
            dir: dir.to_path_buf(),
        })?;
        pairs.push(ConvertedPair {
            primary: primary.path.clone(),
            sidecar: dir.join(format!("{stem}{SIDECAR_EXTENSION}")),
        });
    }
    Ok(pairs)
}

/// Builds one [`Series`] per sidecar in `work_dir` whose name starts with one
/// of `hints`.
///
/// Multi-echo and multi-part conversions yield several sidecars per hint and
/// therefore several series. Series come back in file-name order.
pub fn discover_series(work_dir: &Path, hints: &[String]) -> Result<Vec<Series>> {
    let files = list_files(work_dir)?;
    let mut by_stem: BTreeMap<String, Vec<SeriesFile>> = BTreeMap::new();
    for hint in hints {
        for stem in sidecar_stems(&files, hint) {
            by_stem
                .entry(stem.to_string())
                .or_insert_with(|| siblings(&files, stem));
        }
    }

    let mut series = Vec::with_capacity(by_stem.len());
    for (stem, series_files) in by_stem {
        if primary_of(&series_files).is_none() {
            return Err(IngestError::MissingPrimaryFile {
                series: stem,
                dir: work_dir.to_path_buf(),
            });
        }
        let sidecar = work_dir.join(format!("{stem}{SIDECAR_EXTENSION}"));
        let metadata = read_sidecar(&sidecar, &stem)?;
        debug!(
            series = %stem,
            files = series_files.len(),
            acquisition_time = %metadata.acquisition_time,
            "series discovered"
        );
        series.push(Series {
            name: stem,
            files: series_files,
            metadata,
        });
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_require_a_dot_after_the_stem() {
        let files = vec![
            PathBuf::from("/w/GRE_0003_e1.json"),
            PathBuf::from("/w/GRE_0003_e1.nii.gz"),
            PathBuf::from("/w/GRE_0003_e1_ph.json"),
            PathBuf::from("/w/GRE_0003_e1_ph.nii.gz"),
        ];
        let group = siblings(&files, "GRE_0003_e1");
        let extensions: Vec<&str> = group.iter().map(|f| f.extension.as_str()).collect();
        assert_eq!(extensions, vec![".json", ".nii.gz"]);
    }

    #[test]
    fn compressed_image_is_preferred_as_primary() {
        let group = vec![
            SeriesFile::new("/w/S.nii", ".nii"),
            SeriesFile::new("/w/S.nii.gz", ".nii.gz"),
        ];
        assert_eq!(primary_of(&group).map(|f| f.extension.as_str()), Some(".nii.gz"));
    }
}
