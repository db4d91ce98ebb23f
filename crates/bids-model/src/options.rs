//! Configuration options for the conversion pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Category, ImageTypeTags};

/// One row of a pattern table: the name fragment a match yields and the
/// case-insensitive patterns that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub key: String,
    pub patterns: Vec<String>,
}

impl PatternEntry {
    pub fn new(key: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            key: key.into(),
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Ordered pattern table for a single category; earlier entries win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternTable(pub Vec<PatternEntry>);

impl PatternTable {
    pub fn entries(&self) -> &[PatternEntry] {
        &self.0
    }
}

/// Which anatomical series are kept once classified.
///
/// Classification and eligibility are separate decisions: a series that
/// matches an anatomical pattern stays anatomical, but is discarded when this
/// predicate rejects its image type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "tag", rename_all = "snake_case")]
pub enum AnatomicalEligibility {
    /// Keep only series whose image type contains the tag.
    RequireTag(String),
    /// Keep only series whose image type lacks the tag.
    ForbidTag(String),
    /// Keep every anatomical series.
    Always,
}

impl AnatomicalEligibility {
    pub fn is_eligible(&self, tags: &ImageTypeTags) -> bool {
        match self {
            AnatomicalEligibility::RequireTag(tag) => tags.contains(tag),
            AnatomicalEligibility::ForbidTag(tag) => !tags.contains(tag),
            AnatomicalEligibility::Always => true,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AnatomicalEligibility::RequireTag(tag) => format!("requires {tag}"),
            AnatomicalEligibility::ForbidTag(tag) => format!("forbids {tag}"),
            AnatomicalEligibility::Always => "always".to_string(),
        }
    }
}

impl Default for AnatomicalEligibility {
    fn default() -> Self {
        AnatomicalEligibility::RequireTag("ND".to_string())
    }
}

/// Options driving classification, source resolution and conversion.
///
/// Every field has a default so a partial TOML file can override a subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub functional: PatternTable,
    pub anatomical: PatternTable,
    pub field_map: PatternTable,
    pub anatomical_eligibility: AnatomicalEligibility,
    /// Root of the raw DICOM export, one directory per scanner.
    pub source_root: PathBuf,
    /// First character of a source-scan id -> scanner directory name.
    pub scanners: BTreeMap<String, String>,
    /// Regex selecting the series folders of a scan worth converting.
    pub source_folder_pattern: String,
    /// Converter executable.
    pub converter: String,
    /// Gzip converter output (`.nii.gz`).
    pub compress: bool,
    /// Plan only: no registry update and no file moves.
    pub dry_run: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let scanners = [("p", "prisma"), ("n", "mr001"), ("m", "mmr"), ("v", "verio")]
            .into_iter()
            .map(|(prefix, scanner)| (prefix.to_string(), scanner.to_string()))
            .collect();
        Self {
            functional: PatternTable(vec![
                PatternEntry::new("faces", &["faces"]),
                PatternEntry::new("reward", &["reward"]),
                PatternEntry::new("rest", &["rest", "resting"]),
                PatternEntry::new("aarhus", &["aarhus"]),
                PatternEntry::new("music", &["music"]),
            ]),
            anatomical: PatternTable(vec![
                PatternEntry::new("T1", &["t1"]),
                PatternEntry::new("T2", &["t2"]),
            ]),
            field_map: PatternTable(vec![PatternEntry::new(
                "GRE_FIELD_MAPPING",
                &["gre_field_mapping"],
            )]),
            anatomical_eligibility: AnatomicalEligibility::default(),
            source_root: PathBuf::from("/rawdata/mr-rh/MRraw"),
            scanners,
            source_folder_pattern: "^(EP2D|T1|T2|GRE).*([0-9]{4})".to_string(),
            converter: "dcm2niix".to_string(),
            compress: true,
            dry_run: false,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern table consulted for a category; unclassified has none.
    pub fn pattern_table(&self, category: Category) -> Option<&PatternTable> {
        match category {
            Category::Functional => Some(&self.functional),
            Category::Anatomical => Some(&self.anatomical),
            Category::FieldMap => Some(&self.field_map),
            Category::Unclassified => None,
        }
    }

    /// Scanner directory for a source-scan id, chosen by its first character.
    pub fn scanner_for(&self, scan_id: &str) -> Option<&str> {
        let prefix = scan_id.chars().next()?.to_ascii_lowercase().to_string();
        self.scanners.get(&prefix).map(String::as_str)
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = root.into();
        self
    }

    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = converter.into();
        self
    }

    pub fn with_eligibility(mut self, eligibility: AnatomicalEligibility) -> Self {
        self.anatomical_eligibility = eligibility;
        self
    }

    pub fn with_dry_run(mut self, enable: bool) -> Self {
        self.dry_run = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_lookup_uses_first_character() {
        let options = PipelineOptions::default();
        assert_eq!(options.scanner_for("p231sc"), Some("prisma"));
        assert_eq!(options.scanner_for("V12"), Some("verio"));
        assert_eq!(options.scanner_for("x1"), None);
        assert_eq!(options.scanner_for(""), None);
    }

    #[test]
    fn eligibility_policies() {
        let nd = ImageTypeTags::new(["ORIGINAL", "PRIMARY", "M", "ND"]);
        let plain = ImageTypeTags::new(["ORIGINAL", "PRIMARY", "M"]);
        let require = AnatomicalEligibility::default();
        assert!(require.is_eligible(&nd));
        assert!(!require.is_eligible(&plain));
        let forbid = AnatomicalEligibility::ForbidTag("ND".to_string());
        assert!(!forbid.is_eligible(&nd));
        assert!(forbid.is_eligible(&plain));
        assert!(AnatomicalEligibility::Always.is_eligible(&plain));
    }
}
