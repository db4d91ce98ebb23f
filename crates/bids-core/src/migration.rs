//! Planning and executing the move of converted files into the archive.
//!
//! Planning is pure: every destination is computed and checked for
//! collisions before anything on disk changes. Execution then handles one
//! series at a time; a series either ends up completely at its destination
//! (or completely deleted) or is restored to where it was and reported.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bids_ingest::write_task_name;
use bids_model::{Category, DiscardReason, Disposition, Label, RunNumber, SequencedSeries};
use tracing::{debug, info, warn};

use crate::error::{MigrationError, MigrationFailure, OrderingError};
use crate::naming::{SessionContext, destination};
use crate::report::{OutcomeAction, PipelineReport, SeriesOutcome};

/// One file and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Move {
        files: Vec<FileMove>,
        /// `TaskName` to record in the sidecar before moving.
        task: Option<(PathBuf, String)>,
    },
    Delete {
        files: Vec<PathBuf>,
        reason: DiscardReason,
    },
    /// Every destination already exists in a reused session: the converted
    /// `files` are duplicates and get removed.
    AlreadyFiled {
        files: Vec<PathBuf>,
        filed: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSeries {
    pub series: String,
    pub category: Category,
    pub run: Option<RunNumber>,
    pub action: PlannedAction,
}

impl PlannedSeries {
    /// The outcome this series would have if the plan ran.
    pub fn preview(&self) -> SeriesOutcome {
        let action = match &self.action {
            PlannedAction::Move { files, .. } => {
                OutcomeAction::WouldMove(files.iter().map(|f| f.to.clone()).collect())
            }
            PlannedAction::Delete { reason, .. } => OutcomeAction::WouldDelete(reason.clone()),
            PlannedAction::AlreadyFiled { filed, .. } => OutcomeAction::AlreadyFiled(filed.clone()),
        };
        self.outcome(action)
    }

    fn outcome(&self, action: OutcomeAction) -> SeriesOutcome {
        SeriesOutcome {
            series: self.series.clone(),
            category: self.category,
            run: self.run,
            action,
        }
    }

    fn error(&self, cause: MigrationFailure, stranded: Vec<PathBuf>) -> MigrationError {
        MigrationError {
            series: self.series.clone(),
            cause,
            stranded,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    pub series: Vec<PlannedSeries>,
}

impl MigrationPlan {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedSeries> {
        self.series.iter()
    }

    /// Turns every move whose destinations all exist into
    /// [`PlannedAction::AlreadyFiled`]. Only meaningful for a session that
    /// was registered by an earlier run of the same scan; a move with some
    /// but not all destinations present stays a move and fails on execution.
    pub fn mark_already_filed(&mut self) -> usize {
        let mut marked = 0;
        for planned in &mut self.series {
            let PlannedAction::Move { files, .. } = &planned.action else {
                continue;
            };
            if files.is_empty() || !files.iter().all(|f| f.to.is_file()) {
                continue;
            }
            planned.action = PlannedAction::AlreadyFiled {
                files: files.iter().map(|f| f.from.clone()).collect(),
                filed: files.iter().map(|f| f.to.clone()).collect(),
            };
            marked += 1;
        }
        marked
    }
}

/// Computes the action for every series.
///
/// Fails when an eligible series lacks the run its template needs, or when
/// two files would land on the same path.
pub fn plan_migration(
    context: &SessionContext,
    sequenced: &[SequencedSeries],
) -> Result<MigrationPlan, OrderingError> {
    let mut claimed: BTreeMap<PathBuf, &str> = BTreeMap::new();
    let mut plan = MigrationPlan::default();

    for item in sequenced {
        let series = &item.classified.series;
        let action = match &item.classified.disposition {
            Disposition::Discard(reason) => PlannedAction::Delete {
                files: series.files.iter().map(|f| f.path.clone()).collect(),
                reason: reason.clone(),
            },
            Disposition::Eligible(label) => {
                let mut files = Vec::with_capacity(series.files.len());
                for file in &series.files {
                    let to = destination(context, label, item.run, &file.extension).ok_or_else(
                        || OrderingError::MissingRun {
                            series: series.name.clone(),
                        },
                    )?;
                    if let Some(first) = claimed.insert(to.clone(), &series.name) {
                        return Err(OrderingError::DestinationCollision {
                            path: to,
                            first: first.to_string(),
                            second: series.name.clone(),
                        });
                    }
                    files.push(FileMove {
                        from: file.path.clone(),
                        to,
                    });
                }
                let task = match label {
                    Label::Functional { task } => series
                        .sidecar()
                        .map(|sidecar| (sidecar.to_path_buf(), task.clone())),
                    _ => None,
                };
                PlannedAction::Move { files, task }
            }
        };
        plan.series.push(PlannedSeries {
            series: series.name.clone(),
            category: item.classified.category,
            run: item.run,
            action,
        });
    }
    Ok(plan)
}

/// Applies a [`MigrationPlan`] series by series.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationExecutor;

impl MigrationExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Runs every planned action, recording outcomes and failures in
    /// `report`. A failed series never stops the rest of the batch.
    pub fn execute(&self, plan: &MigrationPlan, report: &mut PipelineReport) {
        for planned in plan.iter() {
            let result = match &planned.action {
                PlannedAction::Move { files, task } => self
                    .move_series(planned, files, task.as_ref())
                    .map(|()| OutcomeAction::Moved(files.iter().map(|f| f.to.clone()).collect())),
                PlannedAction::Delete { files, reason } => self
                    .delete_series(planned, files)
                    .map(|()| OutcomeAction::Deleted(reason.clone())),
                PlannedAction::AlreadyFiled { files, filed } => self
                    .delete_series(planned, files)
                    .map(|()| OutcomeAction::AlreadyFiled(filed.clone())),
            };
            match result {
                Ok(action) => {
                    debug!(series = %planned.series, action = action.as_str(), "series migrated");
                    report.record(planned.outcome(action));
                }
                Err(err) => {
                    warn!(series = %planned.series, error = %err, "series left in place");
                    report.record_failure(planned.category, planned.run, err);
                }
            }
        }
        info!(
            moved = report.moved(),
            deleted = report.deleted(),
            already_filed = report.already_filed(),
            failed = report.failed(),
            "migration finished"
        );
    }

    fn move_series(
        &self,
        planned: &PlannedSeries,
        files: &[FileMove],
        task: Option<&(PathBuf, String)>,
    ) -> Result<(), MigrationError> {
        for file in files {
            if file.to.exists() {
                return Err(planned.error(
                    MigrationFailure::DestinationExists {
                        path: file.to.clone(),
                    },
                    Vec::new(),
                ));
            }
            if let Some(dir) = file.to.parent() {
                fs::create_dir_all(dir).map_err(|source| {
                    planned.error(
                        MigrationFailure::CreateDir {
                            path: dir.to_path_buf(),
                            source,
                        },
                        Vec::new(),
                    )
                })?;
            }
        }
        if let Some((sidecar, task)) = task {
            write_task_name(sidecar, task)
                .map_err(|err| planned.error(MigrationFailure::Sidecar(err), Vec::new()))?;
        }

        let mut done: Vec<&FileMove> = Vec::with_capacity(files.len());
        for file in files {
            if let Err(source) = move_no_clobber(&file.from, &file.to) {
                let stranded = undo(done.iter().map(|f| (f.to.as_path(), f.from.as_path())));
                let cause = if source.kind() == io::ErrorKind::AlreadyExists {
                    MigrationFailure::DestinationExists {
                        path: file.to.clone(),
                    }
                } else {
                    MigrationFailure::Move {
                        from: file.from.clone(),
                        to: file.to.clone(),
                        source,
                    }
                };
                return Err(planned.error(cause, stranded));
            }
            done.push(file);
        }
        Ok(())
    }

    /// Renames every file to a hidden staging name first, so a failure
    /// part-way restores the series instead of leaving half of it deleted.
    fn delete_series(&self, planned: &PlannedSeries, files: &[PathBuf]) -> Result<(), MigrationError> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
        for path in files {
            let hidden = staging_path(path);
            if let Err(source) = fs::rename(path, &hidden) {
                let stranded = undo(staged.iter().map(|(from, to)| (to.as_path(), from.as_path())));
                return Err(planned.error(
                    MigrationFailure::Delete {
                        path: path.clone(),
                        source,
                    },
                    stranded,
                ));
            }
            staged.push((path.clone(), hidden));
        }

        let mut first_error: Option<(PathBuf, io::Error)> = None;
        let mut stranded = Vec::new();
        for (original, hidden) in &staged {
            if let Err(source) = fs::remove_file(hidden) {
                stranded.push(hidden.clone());
                if first_error.is_none() {
                    first_error = Some((original.clone(), source));
                }
            }
        }
        match first_error {
            None => Ok(()),
            Some((path, source)) => Err(planned.error(MigrationFailure::Delete { path, source }, stranded)),
        }
    }
}

/// Moves `from` to `to`, failing with `AlreadyExists` instead of replacing
/// a file that appeared at `to`. Both paths must be on one filesystem.
fn move_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    fs::hard_link(from, to)?;
    if let Err(err) = fs::remove_file(from) {
        if let Err(cleanup) = fs::remove_file(to) {
            warn!(path = %to.display(), error = %cleanup, "could not remove partial move");
        }
        return Err(err);
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.discard"))
}

/// Renames files back; returns the ones that could not be restored.
fn undo<'a>(moves: impl DoubleEndedIterator<Item = (&'a Path, &'a Path)>) -> Vec<PathBuf> {
    let mut stranded = Vec::new();
    for (current, original) in moves.rev() {
        if let Err(err) = fs::rename(current, original) {
            warn!(path = %current.display(), error = %err, "could not restore file");
            stranded.push(current.to_path_buf());
        }
    }
    stranded
}
