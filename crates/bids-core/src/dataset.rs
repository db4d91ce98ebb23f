//! `dataset_description.json` at the project root.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

pub const DATASET_DESCRIPTION_FILE: &str = "dataset_description.json";
pub const BIDS_VERSION: &str = "v1.6.0";
pub const DATASET_TYPE_RAW: &str = "raw";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescription {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DatasetType")]
    pub dataset_type: String,
    #[serde(rename = "BIDSVersion")]
    pub bids_version: String,
    #[serde(rename = "Authors")]
    pub authors: Vec<String>,
}

impl DatasetDescription {
    /// Raw dataset description with placeholder authors.
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dataset_type: DATASET_TYPE_RAW.to_string(),
            bids_version: BIDS_VERSION.to_string(),
            authors: vec!["Author 1".to_string(), "Author 2".to_string()],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the description into `project_dir` unless one already exists.
    ///
    /// Returns whether a file was written. An existing description is left
    /// alone, whatever its content.
    pub fn write_if_missing(&self, project_dir: &Path) -> io::Result<bool> {
        let path = project_dir.join(DATASET_DESCRIPTION_FILE);
        if path.exists() {
            return Ok(false);
        }
        let mut text = self.to_json()?;
        text.push('\n');
        fs::write(&path, text)?;
        info!(path = %path.display(), "dataset description created");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_description_snapshot() {
        insta::assert_snapshot!(DatasetDescription::raw("np2").to_json().unwrap(), @r#"
        {
          "Name": "np2",
          "DatasetType": "raw",
          "BIDSVersion": "v1.6.0",
          "Authors": [
            "Author 1",
            "Author 2"
          ]
        }
        "#);
    }

    #[test]
    fn existing_description_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATASET_DESCRIPTION_FILE);
        fs::write(&path, "{\"Name\": \"curated\"}").unwrap();

        let written = DatasetDescription::raw("np2")
            .write_if_missing(dir.path())
            .unwrap();

        assert!(!written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"Name\": \"curated\"}");
    }

    #[test]
    fn missing_description_is_written() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DatasetDescription::raw("np2").write_if_missing(dir.path()).unwrap());

        let text = fs::read_to_string(dir.path().join(DATASET_DESCRIPTION_FILE)).unwrap();
        let parsed: DatasetDescription = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, DatasetDescription::raw("np2"));
    }
}
