//! Name-pattern and image-type based classification.

use bids_model::{
    AnatomicalEligibility, Category, ClassifiedSeries, DiscardReason, Disposition, FieldMapRole,
    Label, PipelineOptions, Series,
};
use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use crate::error::{ClassifyError, PipelineError};

const PHASE_TAG: &str = "PHASE";
const MAGNITUDE_TAG: &str = "M";
const NORMALIZED_TAG: &str = "NORM";

#[derive(Debug)]
struct CompiledEntry {
    key: String,
    patterns: Vec<Regex>,
}

impl CompiledEntry {
    fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }
}

/// Assigns a category and a disposition to each converted series.
#[derive(Debug)]
pub struct Classifier {
    tables: Vec<(Category, Vec<CompiledEntry>)>,
    eligibility: AnatomicalEligibility,
}

impl Classifier {
    /// Compiles the pattern tables of `options` in classification order.
    ///
    /// Keys of functional and anatomical entries end up in file names and
    /// must be alphanumeric.
    pub fn new(options: &PipelineOptions) -> Result<Self, PipelineError> {
        let mut tables = Vec::new();
        for category in Category::CLASSIFICATION_ORDER {
            let Some(table) = options.pattern_table(category) else {
                continue;
            };
            let mut entries = Vec::with_capacity(table.entries().len());
            for entry in table.entries() {
                if category != Category::FieldMap
                    && (entry.key.is_empty() || !entry.key.chars().all(|c| c.is_ascii_alphanumeric()))
                {
                    return Err(PipelineError::InvalidInput {
                        what: "pattern key",
                        value: entry.key.clone(),
                        reason: format!("{category} keys must be alphanumeric"),
                    });
                }
                let mut patterns = Vec::with_capacity(entry.patterns.len());
                for pattern in &entry.patterns {
                    let compiled = RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|source| PipelineError::InvalidPattern {
                            category,
                            pattern: pattern.clone(),
                            source,
                        })?;
                    patterns.push(compiled);
                }
                entries.push(CompiledEntry {
                    key: entry.key.clone(),
                    patterns,
                });
            }
            tables.push((category, entries));
        }
        Ok(Self {
            tables,
            eligibility: options.anatomical_eligibility.clone(),
        })
    }

    /// First table entry whose patterns match `name`, in classification order.
    pub fn match_category(&self, name: &str) -> Option<(Category, &str)> {
        self.tables.iter().find_map(|(category, entries)| {
            entries
                .iter()
                .find(|entry| entry.matches(name))
                .map(|entry| (*category, entry.key.as_str()))
        })
    }

    pub fn classify(&self, series: Series) -> Result<ClassifiedSeries, ClassifyError> {
        let (category, disposition) = match self.match_category(&series.name) {
            None => (
                Category::Unclassified,
                Disposition::Discard(DiscardReason::Unclassified),
            ),
            Some((Category::Functional, task)) => (
                Category::Functional,
                Disposition::Eligible(Label::Functional {
                    task: task.to_string(),
                }),
            ),
            Some((Category::Anatomical, contrast)) => {
                (Category::Anatomical, self.anatomical(&series, contrast))
            }
            Some((Category::FieldMap, _)) => (Category::FieldMap, field_map(&series)?),
            Some((Category::Unclassified, _)) => (
                Category::Unclassified,
                Disposition::Discard(DiscardReason::Unclassified),
            ),
        };

        match &disposition {
            Disposition::Eligible(label) => info!(
                series = %series.name,
                category = %category,
                fragment = %label.fragment(),
                "series classified"
            ),
            Disposition::Discard(reason) => debug!(
                series = %series.name,
                category = %category,
                reason = %reason,
                "series marked for discard"
            ),
        }
        Ok(ClassifiedSeries {
            series,
            category,
            disposition,
        })
    }

    pub fn classify_all(&self, series: Vec<Series>) -> Result<Vec<ClassifiedSeries>, ClassifyError> {
        series.into_iter().map(|s| self.classify(s)).collect()
    }

    fn anatomical(&self, series: &Series, contrast: &str) -> Disposition {
        if self.eligibility.is_eligible(&series.metadata.image_type) {
            Disposition::Eligible(Label::Anatomical {
                contrast: contrast.to_string(),
            })
        } else {
            Disposition::Discard(DiscardReason::Ineligible {
                policy: self.eligibility.describe(),
            })
        }
    }
}

fn field_map(series: &Series) -> Result<Disposition, ClassifyError> {
    let tags = &series.metadata.image_type;
    if tags.contains(PHASE_TAG) {
        return Ok(Disposition::Eligible(Label::FieldMap(FieldMapRole::PhaseDiff)));
    }
    if tags.contains(NORMALIZED_TAG) {
        let echo = series
            .metadata
            .echo_number
            .ok_or_else(|| ClassifyError::MissingEchoNumber {
                series: series.name.clone(),
            })?;
        return Ok(Disposition::Eligible(Label::FieldMap(FieldMapRole::Magnitude(echo))));
    }
    if tags.contains(MAGNITUDE_TAG) {
        return Ok(Disposition::Discard(DiscardReason::UnnormalizedMagnitude));
    }
    Ok(Disposition::Discard(DiscardReason::UnknownFieldMapRole))
}
