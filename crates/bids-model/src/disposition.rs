//! Classification outcome: an explicit eligible/discard split instead of an
//! empty-suffix sentinel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Category, RunNumber, Series};

/// Suffix appended to every functional file name.
pub const FUNCTIONAL_SUFFIX: &str = "bold";
/// Modality suffix appended to an anatomical contrast label (`T1` -> `T1w`).
pub const ANATOMICAL_SUFFIX: &str = "w";

/// Role of a field-map image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldMapRole {
    /// Phase-difference image.
    PhaseDiff,
    /// Normalised magnitude image for the given echo.
    Magnitude(u32),
}

impl fmt::Display for FieldMapRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMapRole::PhaseDiff => f.write_str("phasediff"),
            FieldMapRole::Magnitude(echo) => write!(f, "magnitude{echo}"),
        }
    }
}

/// Path-relevant fields of a series that will be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Functional { task: String },
    Anatomical { contrast: String },
    FieldMap(FieldMapRole),
}

impl Label {
    pub fn category(&self) -> Category {
        match self {
            Label::Functional { .. } => Category::Functional,
            Label::Anatomical { .. } => Category::Anatomical,
            Label::FieldMap(_) => Category::FieldMap,
        }
    }

    /// Trailing name fragment (`bold`, `T1w`, `phasediff`, `magnitude2`).
    pub fn fragment(&self) -> String {
        match self {
            Label::Functional { .. } => FUNCTIONAL_SUFFIX.to_string(),
            Label::Anatomical { contrast } => format!("{contrast}{ANATOMICAL_SUFFIX}"),
            Label::FieldMap(role) => role.to_string(),
        }
    }

    /// Key that series must share to be numbered in the same run sequence.
    ///
    /// Functional series group by task; anatomical and field-map series by
    /// their fragment, so magnitude1, magnitude2 and phasediff images of one
    /// acquisition are numbered independently.
    pub fn group_key(&self) -> (Category, String) {
        match self {
            Label::Functional { task } => (Category::Functional, task.clone()),
            other => (other.category(), other.fragment()),
        }
    }

    /// Whether the category template carries a `run-NN` segment.
    pub fn has_run_segment(&self) -> bool {
        !matches!(self, Label::Anatomical { .. })
    }
}

/// Why a series is deleted instead of migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardReason {
    /// No pattern table matched the series name.
    Unclassified,
    /// Anatomical series rejected by the eligibility policy.
    Ineligible { policy: String },
    /// Magnitude field map without the normalisation marker.
    UnnormalizedMagnitude,
    /// Field map whose image type is neither phase nor magnitude.
    UnknownFieldMapRole,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::Unclassified => f.write_str("unclassified series"),
            DiscardReason::Ineligible { policy } => {
                write!(f, "anatomical image rejected by policy ({policy})")
            }
            DiscardReason::UnnormalizedMagnitude => f.write_str("magnitude image without NORM"),
            DiscardReason::UnknownFieldMapRole => {
                f.write_str("field map is neither phase nor magnitude")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    Eligible(Label),
    Discard(DiscardReason),
}

impl Disposition {
    pub fn label(&self) -> Option<&Label> {
        match self {
            Disposition::Eligible(label) => Some(label),
            Disposition::Discard(_) => None,
        }
    }

    pub fn is_discard(&self) -> bool {
        matches!(self, Disposition::Discard(_))
    }
}

/// Output of the classifier for one series.
///
/// `category` is kept separately from the disposition: an anatomical series
/// stays anatomical even when its image type makes it ineligible for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSeries {
    pub series: Series,
    pub category: Category,
    pub disposition: Disposition,
}

/// A classified series with its run number, present only for eligible series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedSeries {
    pub classified: ClassifiedSeries,
    pub run: Option<RunNumber>,
}

impl SequencedSeries {
    pub fn name(&self) -> &str {
        &self.classified.series.name
    }
}
