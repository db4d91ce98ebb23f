//! Pipeline driver: one subject, one source scan, one session.

use std::path::PathBuf;
use std::time::Instant;

use bids_ingest::{
    Converter, discover_series, discover_source_folders, resolve_scan, source_folder_regex,
};
use bids_model::{PipelineOptions, SubjectId};
use bids_registry::{Registry, RegistryStore, TsvRegistryStore};
use regex::Regex;
use tracing::{debug, info, info_span, warn};

use crate::classifier::Classifier;
use crate::error::PipelineError;
use crate::layout::ArchiveLayout;
use crate::migration::{MigrationExecutor, plan_migration};
use crate::naming::SessionContext;
use crate::report::PipelineReport;
use crate::sequencer::assign_runs;

/// The four inputs of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub archive_root: PathBuf,
    pub project_id: String,
    pub subject: SubjectId,
    /// Source scan id as given; may be a unique prefix of the scan folder.
    pub source_scan_id: String,
}

impl PipelineRequest {
    pub fn new(
        archive_root: impl Into<PathBuf>,
        project_id: impl Into<String>,
        subject: &str,
        source_scan_id: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let subject = SubjectId::new(subject).map_err(|err| PipelineError::InvalidInput {
            what: "subject id",
            value: subject.to_string(),
            reason: err.to_string(),
        })?;
        let source_scan_id = source_scan_id.into().trim().to_string();
        if source_scan_id.is_empty() {
            return Err(PipelineError::InvalidInput {
                what: "source scan id",
                value: source_scan_id,
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            archive_root: archive_root.into(),
            project_id: project_id.into(),
            subject,
            source_scan_id,
        })
    }
}

/// Converts and files one source scan into the archive.
#[derive(Debug)]
pub struct Pipeline<C> {
    options: PipelineOptions,
    classifier: Classifier,
    folder_pattern: Regex,
    converter: C,
}

impl<C: Converter> Pipeline<C> {
    /// Compiles every configured pattern up front, so a bad configuration
    /// fails before anything is touched.
    pub fn new(options: PipelineOptions, converter: C) -> Result<Self, PipelineError> {
        let classifier = Classifier::new(&options)?;
        let folder_pattern = source_folder_regex(&options.source_folder_pattern)?;
        Ok(Self {
            options,
            classifier,
            folder_pattern,
            converter,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Runs against the `participants.tsv` of the requested project.
    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineReport, PipelineError> {
        let layout = ArchiveLayout::new(&request.archive_root, &request.project_id)?;
        let registry = Registry::new(TsvRegistryStore::new(layout.participants_path()));
        self.run_with_registry(request, &registry)
    }

    /// Runs with an explicit registry.
    ///
    /// Converter output lands in a work directory inside the session and only
    /// leaves it through migration. Batch-fatal errors are returned before the
    /// registry row is written and before any converted file is moved; the
    /// work directory is removed with them. Per-series migration failures are
    /// collected in the report instead.
    pub fn run_with_registry<S: RegistryStore>(
        &self,
        request: &PipelineRequest,
        registry: &Registry<S>,
    ) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        let layout = ArchiveLayout::new(&request.archive_root, &request.project_id)?;
        let session_span = info_span!(
            "session",
            subject = %request.subject,
            source_scan_id = %request.source_scan_id
        );
        let _session_guard = session_span.enter();

        // =====================================================================
        // Resolve: scan folder and session, no filesystem changes yet
        // =====================================================================
        let source = resolve_scan(&self.options, &request.source_scan_id)?;
        let resolution = registry.resolve_session(&request.subject, &source.scan_id)?;
        info!(
            session = %resolution.session,
            created = resolution.created,
            scanner = %source.scanner,
            "session resolved"
        );

        // =====================================================================
        // Prepare: project files, session folders and a private work directory
        // =====================================================================
        layout.ensure_project(&request.subject)?;
        let session_dir = layout.ensure_session(&request.subject, resolution.session)?;
        // Removed on drop unless kept after failed migrations.
        let work_dir = layout.create_work_dir(&session_dir, &source.scan_id)?;
        let context = SessionContext {
            subject: request.subject.clone(),
            session: resolution.session,
            session_dir,
        };

        // =====================================================================
        // Convert: source folders into the work directory
        // =====================================================================
        let hints = info_span!("convert").in_scope(|| -> Result<Vec<String>, PipelineError> {
            let folders = discover_source_folders(&source.scan_dir, &self.folder_pattern)?;
            for folder in &folders {
                let output = self.converter.convert(
                    &source.scan_dir.join(folder),
                    work_dir.path(),
                    folder,
                )?;
                debug!(
                    folder = %folder,
                    pairs = output.pairs.len(),
                    skipped = output.skipped,
                    "source folder converted"
                );
            }
            Ok(folders)
        })?;
        let series = discover_series(work_dir.path(), &hints)?;
        info!(folders = hints.len(), series = series.len(), "conversion complete");

        // =====================================================================
        // Classify, sequence, plan: all-or-nothing for the batch
        // =====================================================================
        let classified =
            info_span!("classify").in_scope(|| self.classifier.classify_all(series))?;
        let sequenced = info_span!("sequence").in_scope(|| assign_runs(classified))?;
        let mut plan = plan_migration(&context, &sequenced)?;
        if !resolution.created {
            let filed = plan.mark_already_filed();
            if filed > 0 {
                info!(series = filed, "series already filed in this session");
            }
        }

        let mut report = PipelineReport::new(&resolution, self.options.dry_run);
        if self.options.dry_run {
            for planned in plan.iter() {
                report.record(planned.preview());
            }
            info!(series = plan.len(), "dry run: registry and files left unchanged");
            return Ok(report);
        }

        // =====================================================================
        // Commit and migrate
        // =====================================================================
        registry.commit(&resolution)?;
        info_span!("migrate").in_scope(|| MigrationExecutor::new().execute(&plan, &mut report));
        if report.has_errors() {
            let kept = work_dir.keep();
            warn!(path = %kept.display(), "unfiled series kept in the work directory");
            report.work_dir = Some(kept);
        }
        info!(
            session = %resolution.session,
            moved = report.moved(),
            deleted = report.deleted(),
            already_filed = report.already_filed(),
            failed = report.failed(),
            duration_ms = started.elapsed().as_millis(),
            "session complete"
        );
        Ok(report)
    }
}
