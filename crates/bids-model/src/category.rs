//! Closed set of BIDS data types a converted series can be assigned to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// BIDS data type of a converted series.
///
/// Classification walks [`Category::CLASSIFICATION_ORDER`] and stops at the
/// first category whose pattern table matches the series name. Anything else
/// ends up [`Category::Unclassified`] and is never migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// `anat`: structural images (T1w, T2w).
    Anatomical,
    /// `func`: task and resting-state BOLD series.
    Functional,
    /// `fmap`: field maps (phase difference, magnitude images).
    FieldMap,
    /// No pattern table matched.
    Unclassified,
}

impl Category {
    /// Order in which pattern tables are consulted; first match wins.
    pub const CLASSIFICATION_ORDER: [Category; 3] =
        [Category::Functional, Category::Anatomical, Category::FieldMap];

    /// Categories that own a subfolder in the session directory.
    pub const OUTPUT: [Category; 3] = [Category::Anatomical, Category::Functional, Category::FieldMap];

    /// Returns the BIDS data type name, which doubles as the subfolder name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Anatomical => "anat",
            Category::Functional => "func",
            Category::FieldMap => "fmap",
            Category::Unclassified => "NA",
        }
    }

    /// Subfolder of the session directory, `None` for unclassified series.
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            Category::Unclassified => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anat" | "anatomical" => Ok(Category::Anatomical),
            "func" | "functional" => Ok(Category::Functional),
            "fmap" | "fieldmap" | "field-map" => Ok(Category::FieldMap),
            "na" | "unclassified" => Ok(Category::Unclassified),
            _ => Err(ModelError::UnknownCategory(s.to_string())),
        }
    }
}
