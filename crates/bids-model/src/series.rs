//! Converted series and the sidecar metadata the pipeline depends on.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Acquisition wall-clock time as written by the converter (`HH:MM:SS.ffffff`).
///
/// Only used for relative ordering within a session, so it is compared
/// lexically and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AcquisitionTime(String);

impl AcquisitionTime {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AcquisitionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text `ImageType` markers (`ORIGINAL`, `PRIMARY`, `M`, `ND`, `NORM`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTypeTags(Vec<String>);

impl ImageTypeTags {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// Exact membership test. Scanners emit these markers upper-case, so `nd`
    /// does not match `ND`.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ImageTypeTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("\\"))
    }
}

/// Fields read from a series' JSON sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarMetadata {
    pub acquisition_time: AcquisitionTime,
    pub image_type: ImageTypeTags,
    pub echo_number: Option<u32>,
}

/// One file belonging to a series, with the extension that follows the shared stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFile {
    pub path: PathBuf,
    /// Everything after the series stem, including the leading dot (`.nii.gz`).
    pub extension: String,
}

impl SeriesFile {
    pub fn new(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            extension: extension.into(),
        }
    }
}

/// A freshly converted series: sidecar plus sibling files sharing its stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// Shared stem of every file in the series (sidecar name minus `.json`).
    pub name: String,
    pub files: Vec<SeriesFile>,
    pub metadata: SidecarMetadata,
}

impl Series {
    pub fn sidecar(&self) -> Option<&Path> {
        self.files
            .iter()
            .find(|file| file.extension == ".json")
            .map(|file| file.path.as_path())
    }

    pub fn acquisition_time(&self) -> &AcquisitionTime {
        &self.metadata.acquisition_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_lookup_is_exact() {
        let tags = ImageTypeTags::new(["ORIGINAL", "PRIMARY", "M", "ND"]);
        assert!(tags.contains("ND"));
        assert!(!tags.contains("nd"));
        assert!(!ImageTypeTags::new(["nd"]).contains("ND"));
        assert!(!tags.contains("NORM"));
        assert_eq!(tags.to_string(), "ORIGINAL\\PRIMARY\\M\\ND");
    }

    #[test]
    fn acquisition_times_order_lexically() {
        let early = AcquisitionTime::new("09:30:00.000000");
        let late = AcquisitionTime::new("10:00:00.000000");
        assert!(early < late);
    }
}
