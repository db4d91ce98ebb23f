//! Per-run accumulator of series outcomes.

use std::path::PathBuf;

use bids_model::{Category, DiscardReason, RunNumber, SessionLabel, SubjectId};
use bids_registry::SessionResolution;

use crate::error::MigrationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeAction {
    /// Files now at these destinations.
    Moved(Vec<PathBuf>),
    Deleted(DiscardReason),
    /// Dry run: files that would be written.
    WouldMove(Vec<PathBuf>),
    /// Dry run: series that would be deleted.
    WouldDelete(DiscardReason),
    /// Re-run of a filed scan: these destinations already hold the series,
    /// and the fresh conversion was dropped.
    AlreadyFiled(Vec<PathBuf>),
    /// Series left in place; the matching error is in [`PipelineReport::errors`].
    Failed(String),
}

impl OutcomeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeAction::Moved(_) => "moved",
            OutcomeAction::Deleted(_) => "deleted",
            OutcomeAction::WouldMove(_) => "would move",
            OutcomeAction::WouldDelete(_) => "would delete",
            OutcomeAction::AlreadyFiled(_) => "already filed",
            OutcomeAction::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesOutcome {
    pub series: String,
    pub category: Category,
    pub run: Option<RunNumber>,
    pub action: OutcomeAction,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub subject: SubjectId,
    pub session: SessionLabel,
    pub source_scan_id: String,
    /// Whether this run registered a new session.
    pub created: bool,
    pub dry_run: bool,
    pub outcomes: Vec<SeriesOutcome>,
    pub errors: Vec<MigrationError>,
    /// Conversion output kept on disk because some series failed to migrate.
    pub work_dir: Option<PathBuf>,
}

impl PipelineReport {
    pub fn new(resolution: &SessionResolution, dry_run: bool) -> Self {
        Self {
            subject: resolution.subject.clone(),
            session: resolution.session,
            source_scan_id: resolution.source_scan_id.clone(),
            created: resolution.created,
            dry_run,
            outcomes: Vec::new(),
            errors: Vec::new(),
            work_dir: None,
        }
    }

    pub fn record(&mut self, outcome: SeriesOutcome) {
        self.outcomes.push(outcome);
    }

    /// Records a failed series together with its error.
    pub fn record_failure(&mut self, category: Category, run: Option<RunNumber>, error: MigrationError) {
        self.outcomes.push(SeriesOutcome {
            series: error.series.clone(),
            category,
            run,
            action: OutcomeAction::Failed(error.cause.to_string()),
        });
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn count(&self, predicate: impl Fn(&OutcomeAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.action)).count()
    }

    pub fn moved(&self) -> usize {
        self.count(|action| matches!(action, OutcomeAction::Moved(_) | OutcomeAction::WouldMove(_)))
    }

    pub fn deleted(&self) -> usize {
        self.count(|action| {
            matches!(action, OutcomeAction::Deleted(_) | OutcomeAction::WouldDelete(_))
        })
    }

    pub fn already_filed(&self) -> usize {
        self.count(|action| matches!(action, OutcomeAction::AlreadyFiled(_)))
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}
