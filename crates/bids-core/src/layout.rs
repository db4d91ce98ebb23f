//! Directory layout of the archive.
//!
//! ```text
//! <root>/<project>/
//!     dataset_description.json
//!     participants.tsv
//!     sub-<id>/ses-<NNN>/{anat,func,fmap}/
//!     sub-<id>/ses-<NNN>/.work-<scan>-<random>/   (conversion output, transient)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use bids_model::{Category, SessionLabel, SubjectId};
use bids_registry::TsvRegistryStore;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::dataset::{DATASET_DESCRIPTION_FILE, DatasetDescription};
use crate::error::PipelineError;

pub const PARTICIPANTS_FILE: &str = "participants.tsv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
    project: String,
}

impl ArchiveLayout {
    /// Validates the project id; it becomes a single directory name.
    pub fn new(root: impl Into<PathBuf>, project: impl Into<String>) -> Result<Self, PipelineError> {
        let project = project.into();
        let valid = !project.is_empty()
            && project != "."
            && project != ".."
            && !project.contains(['/', '\\']);
        if !valid {
            return Err(PipelineError::InvalidInput {
                what: "project id",
                value: project,
                reason: "must be a single non-empty directory name".to_string(),
            });
        }
        Ok(Self {
            root: root.into(),
            project,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root.join(&self.project)
    }

    pub fn participants_path(&self) -> PathBuf {
        self.project_dir().join(PARTICIPANTS_FILE)
    }

    pub fn dataset_description_path(&self) -> PathBuf {
        self.project_dir().join(DATASET_DESCRIPTION_FILE)
    }

    pub fn subject_dir(&self, subject: &SubjectId) -> PathBuf {
        self.project_dir().join(subject.label())
    }

    pub fn session_dir(&self, subject: &SubjectId, session: SessionLabel) -> PathBuf {
        self.subject_dir(subject).join(session.to_string())
    }

    /// Creates the project directory, its dataset description, an empty
    /// participants table and the subject directory, keeping whatever
    /// already exists.
    pub fn ensure_project(&self, subject: &SubjectId) -> Result<(), PipelineError> {
        if !self.root.is_dir() {
            return Err(PipelineError::InvalidInput {
                what: "archive root",
                value: self.root.display().to_string(),
                reason: "directory does not exist".to_string(),
            });
        }
        let project_dir = self.project_dir();
        create_dir(&project_dir)?;
        DatasetDescription::raw(&self.project)
            .write_if_missing(&project_dir)
            .map_err(|source| PipelineError::layout(self.dataset_description_path(), source))?;
        if TsvRegistryStore::new(self.participants_path()).initialize()? {
            info!(path = %self.participants_path().display(), "participants table created");
        }
        create_dir(&self.subject_dir(subject))
    }

    /// Creates the session directory and its category folders.
    pub fn ensure_session(
        &self,
        subject: &SubjectId,
        session: SessionLabel,
    ) -> Result<PathBuf, PipelineError> {
        let session_dir = self.session_dir(subject, session);
        create_dir(&session_dir)?;
        for category in Category::OUTPUT {
            if let Some(dir) = category.dir_name() {
                create_dir(&session_dir.join(dir))?;
            }
        }
        Ok(session_dir)
    }

    /// Creates a fresh hidden directory inside the session for one scan's
    /// conversion output. It sits on the same filesystem as the session's
    /// category folders and is removed when dropped.
    pub fn create_work_dir(&self, session_dir: &Path, scan_id: &str) -> Result<TempDir, PipelineError> {
        let work = tempfile::Builder::new()
            .prefix(&format!(".work-{scan_id}-"))
            .tempdir_in(session_dir)
            .map_err(|source| PipelineError::layout(session_dir, source))?;
        debug!(path = %work.path().display(), "created work directory");
        Ok(work)
    }
}

fn create_dir(path: &Path) -> Result<(), PipelineError> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| PipelineError::layout(path, source))?;
    debug!(path = %path.display(), "created directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_project_ids_that_escape_the_root() {
        for project in ["", ".", "..", "a/b", "a\\b"] {
            assert!(ArchiveLayout::new("/raw", project).is_err(), "{project:?}");
        }
    }

    #[test]
    fn ensure_project_and_session_build_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path(), "np2").unwrap();
        let subject = SubjectId::new("53888").unwrap();
        let session = SessionLabel::from_index(2).unwrap();

        layout.ensure_project(&subject).unwrap();
        let session_dir = layout.ensure_session(&subject, session).unwrap();

        assert!(layout.dataset_description_path().is_file());
        assert_eq!(
            fs::read_to_string(layout.participants_path()).unwrap(),
            "participant_id\tsession_id\tmr_id\n"
        );
        assert_eq!(session_dir, dir.path().join("np2/sub-53888/ses-002"));
        for sub in ["anat", "func", "fmap"] {
            assert!(session_dir.join(sub).is_dir(), "{sub}");
        }
    }

    #[test]
    fn work_dirs_are_unique_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path(), "np2").unwrap();

        let first = layout.create_work_dir(dir.path(), "p100a").unwrap();
        let second = layout.create_work_dir(dir.path(), "p100a").unwrap();
        assert_ne!(first.path(), second.path());
        let name = first.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".work-p100a-"), "{name}");

        let path = first.path().to_path_buf();
        drop(first);
        assert!(!path.exists());
    }

    #[test]
    fn missing_root_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path().join("absent"), "np2").unwrap();
        let err = layout
            .ensure_project(&SubjectId::new("1").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Input);
    }
}
