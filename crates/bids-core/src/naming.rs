//! Canonical BIDS names for eligible series.
//!
//! Templates, per category:
//!
//! - `func/<sub>_<ses>_task-<task>_run-<NN>_bold<ext>`
//! - `anat/<sub>_<ses>_<contrast>w<ext>`
//! - `fmap/<sub>_<ses>_run-<NN>_<role><ext>`
//!
//! Anatomical names carry no run: repeated acquisitions are kept apart by
//! the eligibility policy, and a leftover duplicate is caught as a
//! destination collision when planning the migration.

use std::path::PathBuf;
use std::sync::LazyLock;

use bids_model::{Category, Label, RunNumber, SessionLabel, SubjectId};
use regex::Regex;

/// Identity of the session being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub subject: SubjectId,
    pub session: SessionLabel,
    /// `<project>/sub-<id>/ses-<NNN>`; also the converter's work directory.
    pub session_dir: PathBuf,
}

impl SessionContext {
    pub fn category_dir(&self, category: Category) -> Option<PathBuf> {
        category.dir_name().map(|dir| self.session_dir.join(dir))
    }
}

/// File stem (name without extension) for a labelled series.
///
/// Returns `None` when the category template needs a run number and none
/// was assigned.
pub fn canonical_stem(
    subject: &SubjectId,
    session: SessionLabel,
    label: &Label,
    run: Option<RunNumber>,
) -> Option<String> {
    let prefix = format!("{}_{session}", subject.label());
    let stem = match label {
        Label::Functional { task } => {
            format!("{prefix}_task-{task}_run-{}_{}", run?, label.fragment())
        }
        Label::Anatomical { .. } => format!("{prefix}_{}", label.fragment()),
        Label::FieldMap(_) => format!("{prefix}_run-{}_{}", run?, label.fragment()),
    };
    Some(stem)
}

/// Destination of one file of a series.
pub fn destination(
    context: &SessionContext,
    label: &Label,
    run: Option<RunNumber>,
    extension: &str,
) -> Option<PathBuf> {
    let stem = canonical_stem(&context.subject, context.session, label, run)?;
    let dir = context.category_dir(label.category())?;
    Some(dir.join(format!("{stem}{extension}")))
}

/// Fields recovered from a canonical file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub subject: String,
    pub session: SessionLabel,
    pub task: Option<String>,
    pub run: Option<RunNumber>,
    pub fragment: String,
    pub extension: String,
}

static FUNCTIONAL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^sub-([A-Za-z0-9]+)_(ses-[0-9]{3})_task-([A-Za-z0-9]+)_run-([0-9]{2})_([A-Za-z0-9]+)(\..+)$",
    )
    .expect("functional name regex")
});
static ANATOMICAL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^sub-([A-Za-z0-9]+)_(ses-[0-9]{3})_([A-Za-z0-9]+)(\..+)$")
        .expect("anatomical name regex")
});
static FIELD_MAP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^sub-([A-Za-z0-9]+)_(ses-[0-9]{3})_run-([0-9]{2})_([A-Za-z0-9]+)(\..+)$")
        .expect("field map name regex")
});

/// Parses a file name with the template of `category`.
pub fn parse_name(category: Category, file_name: &str) -> Option<ParsedName> {
    let run = |value: &str| value.parse::<u32>().ok().and_then(|n| RunNumber::new(n).ok());
    match category {
        Category::Functional => {
            let caps = FUNCTIONAL_NAME.captures(file_name)?;
            Some(ParsedName {
                subject: caps[1].to_string(),
                session: caps[2].parse().ok()?,
                task: Some(caps[3].to_string()),
                run: Some(run(&caps[4])?),
                fragment: caps[5].to_string(),
                extension: caps[6].to_string(),
            })
        }
        Category::Anatomical => {
            let caps = ANATOMICAL_NAME.captures(file_name)?;
            Some(ParsedName {
                subject: caps[1].to_string(),
                session: caps[2].parse().ok()?,
                task: None,
                run: None,
                fragment: caps[3].to_string(),
                extension: caps[4].to_string(),
            })
        }
        Category::FieldMap => {
            let caps = FIELD_MAP_NAME.captures(file_name)?;
            Some(ParsedName {
                subject: caps[1].to_string(),
                session: caps[2].parse().ok()?,
                task: None,
                run: Some(run(&caps[3])?),
                fragment: caps[4].to_string(),
                extension: caps[5].to_string(),
            })
        }
        Category::Unclassified => None,
    }
}
