//! Pipeline configuration: built-in defaults, an optional TOML file, then
//! command line overrides.
//!
//! ```toml
//! source_root = "/rawdata/mr-rh/MRraw"
//! anatomical_eligibility = { policy = "require_tag", tag = "ND" }
//!
//! functional = [
//!     { key = "rest", patterns = ["rest", "resting"] },
//!     { key = "nback", patterns = ["n-?back"] },
//! ]
//!
//! [scanners]
//! p = "prisma"
//! ```
//!
//! A field present in the file replaces the built-in value as a whole.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bids_model::PipelineOptions;

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_root: Option<PathBuf>,
    pub converter: Option<String>,
    pub dry_run: bool,
}

impl Overrides {
    pub fn apply(self, mut options: PipelineOptions) -> PipelineOptions {
        if let Some(root) = self.source_root {
            options = options.with_source_root(root);
        }
        if let Some(converter) = self.converter {
            options = options.with_converter(converter);
        }
        if self.dry_run {
            options = options.with_dry_run(true);
        }
        options
    }
}

pub fn parse_options(text: &str) -> Result<PipelineOptions, toml::de::Error> {
    toml::from_str(text)
}

/// Defaults, or the defaults overlaid with the file at `path`.
pub fn load_options(path: Option<&Path>) -> Result<PipelineOptions> {
    let Some(path) = path else {
        return Ok(PipelineOptions::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse_options(&text).with_context(|| format!("parse config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bids_model::{AnatomicalEligibility, Category};

    #[test]
    fn empty_file_keeps_defaults() {
        assert_eq!(parse_options("").unwrap(), PipelineOptions::default());
    }

    #[test]
    fn file_replaces_tables_and_policy() {
        let options = parse_options(
            r#"
            anatomical_eligibility = { policy = "forbid_tag", tag = "DERIVED" }
            compress = false
            functional = [{ key = "nback", patterns = ["n-?back"] }]
            "#,
        )
        .unwrap();

        assert_eq!(
            options.anatomical_eligibility,
            AnatomicalEligibility::ForbidTag("DERIVED".to_string())
        );
        assert!(!options.compress);
        let functional = options.pattern_table(Category::Functional).unwrap();
        assert_eq!(functional.entries().len(), 1);
        assert_eq!(functional.entries()[0].key, "nback");
        assert_eq!(options.anatomical, PipelineOptions::default().anatomical);
    }

    #[test]
    fn always_policy_needs_no_tag() {
        let options = parse_options(r#"anatomical_eligibility = { policy = "always" }"#).unwrap();
        assert_eq!(options.anatomical_eligibility, AnatomicalEligibility::Always);
    }

    #[test]
    fn overrides_win_over_the_file() {
        let options = parse_options(r#"converter = "/opt/dcm2niix""#).unwrap();
        let options = Overrides {
            source_root: Some(PathBuf::from("/mnt/raw")),
            converter: Some("dcm2niix-1.0".to_string()),
            dry_run: true,
        }
        .apply(options);

        assert_eq!(options.source_root, PathBuf::from("/mnt/raw"));
        assert_eq!(options.converter, "dcm2niix-1.0");
        assert!(options.dry_run);
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let err = load_options(Some(Path::new("/nonexistent/bids.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/bids.toml"));
    }
}
