//! Error taxonomy of the conversion pipeline.

use std::path::PathBuf;

use bids_ingest::IngestError;
use bids_model::{AcquisitionTime, Category};
use bids_registry::RegistryError;
use thiserror::Error;

/// Classification failures; all of them abort the batch.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("series {series} is a normalised magnitude field map but has no EchoNumber")]
    MissingEchoNumber { series: String },
}

/// Ordering and naming conflicts; all of them abort the batch.
#[derive(Debug, Error)]
pub enum OrderingError {
    #[error(
        "series {first} and {second} ({category} {key}) share acquisition time {time}; refusing to guess run order"
    )]
    DuplicateAcquisitionTime {
        category: Category,
        key: String,
        time: AcquisitionTime,
        first: String,
        second: String,
    },

    #[error("{category} {key} has {count} series, more than two-digit run numbers allow")]
    TooManyRuns {
        category: Category,
        key: String,
        count: usize,
    },

    #[error("series {series} reached naming without a run number")]
    MissingRun { series: String },

    #[error("series {first} and {second} would both be written to {path}")]
    DestinationCollision {
        path: PathBuf,
        first: String,
        second: String,
    },
}

/// Why a single series could not be moved or deleted.
#[derive(Debug, Error)]
pub enum MigrationFailure {
    #[error("destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to update sidecar: {0}")]
    Sidecar(#[source] IngestError),
}

/// Per-series migration failure; collected, never batch-fatal.
#[derive(Debug, Error)]
#[error("series {series}: {cause}")]
pub struct MigrationError {
    pub series: String,
    #[source]
    pub cause: MigrationFailure,
    /// Files that could not be restored to their original location.
    pub stranded: Vec<PathBuf>,
}

/// Coarse error class used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Metadata,
    Ordering,
    Registry,
    Conversion,
    Filesystem,
    Migration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Metadata => "metadata",
            ErrorKind::Ordering => "ordering",
            ErrorKind::Registry => "registry",
            ErrorKind::Conversion => "conversion",
            ErrorKind::Filesystem => "filesystem",
            ErrorKind::Migration => "migration",
        }
    }
}

/// Batch-fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid {what} '{value}': {reason}")]
    InvalidInput {
        what: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid {category} pattern '{pattern}': {source}")]
    InvalidPattern {
        category: Category,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Ordering(#[from] OrderingError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to prepare {path}: {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput { .. } | PipelineError::InvalidPattern { .. } => {
                ErrorKind::Input
            }
            PipelineError::Ingest(err) if err.is_input_error() => ErrorKind::Input,
            PipelineError::Ingest(err) if err.is_metadata_error() => ErrorKind::Metadata,
            PipelineError::Ingest(
                IngestError::ConverterLaunch { .. } | IngestError::ConverterFailed { .. },
            ) => ErrorKind::Conversion,
            PipelineError::Ingest(_) | PipelineError::Layout { .. } => ErrorKind::Filesystem,
            PipelineError::Classify(_) => ErrorKind::Metadata,
            PipelineError::Ordering(_) => ErrorKind::Ordering,
            PipelineError::Registry(_) => ErrorKind::Registry,
        }
    }

    pub(crate) fn layout(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Layout {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let missing = PipelineError::from(IngestError::MissingMetadataField {
            field: "ImageType".to_string(),
            series: "S".to_string(),
        });
        assert_eq!(missing.kind(), ErrorKind::Metadata);

        let echo = PipelineError::from(ClassifyError::MissingEchoNumber {
            series: "S".to_string(),
        });
        assert_eq!(echo.kind(), ErrorKind::Metadata);

        let ambiguous = PipelineError::from(IngestError::AmbiguousScan {
            scan_id: "p2".to_string(),
            matches: vec![],
        });
        assert_eq!(ambiguous.kind(), ErrorKind::Input);

        let corrupt = PipelineError::from(RegistryError::Corrupt {
            location: "participants.tsv".to_string(),
            reason: "bad header".to_string(),
        });
        assert_eq!(corrupt.kind(), ErrorKind::Registry);
    }
}
