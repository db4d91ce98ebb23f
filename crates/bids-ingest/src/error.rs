//! Error types for scan ingestion.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while locating, converting or reading scan series.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read or write a file.
    #[error("failed to access file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Source Resolution Errors ===
    /// No scanner is configured for the first character of the scan id.
    #[error("no scanner configured for source scan id '{scan_id}'")]
    UnknownScanner { scan_id: String },

    /// No scan folder starts with the given id.
    #[error("no source scan in {dir} matches '{scan_id}'")]
    NoMatchingScan { scan_id: String, dir: PathBuf },

    /// More than one scan folder starts with the given id.
    #[error("source scan id '{scan_id}' is ambiguous: {} matches ({})", .matches.len(), .matches.join(", "))]
    AmbiguousScan {
        scan_id: String,
        matches: Vec<String>,
    },

    /// Configured regex does not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // === Conversion Errors ===
    /// Converter executable could not be started.
    #[error("failed to launch converter '{program}': {source}")]
    ConverterLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Converter exited unsuccessfully.
    #[error("converter '{program}' failed on {source_dir} ({status}): {stderr}")]
    ConverterFailed {
        program: String,
        source_dir: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    // === Metadata Errors ===
    /// Sidecar is not valid JSON or not a JSON object.
    #[error("failed to parse sidecar {path}: {message}")]
    SidecarParse { path: PathBuf, message: String },

    /// A field every sidecar must carry is absent.
    #[error("required field {field} missing in sidecar of series {series}")]
    MissingMetadataField { field: String, series: String },

    /// A field is present but has the wrong shape.
    #[error("field {field} in sidecar of series {series} is invalid: {reason}")]
    InvalidMetadataField {
        field: String,
        series: String,
        reason: String,
    },

    /// Sidecar without an image file next to it.
    #[error("series {series} has a sidecar but no image file in {dir}")]
    MissingPrimaryFile { series: String, dir: PathBuf },
}

impl IngestError {
    /// Errors caused by broken converter output or sidecar content.
    pub fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            IngestError::SidecarParse { .. }
                | IngestError::MissingMetadataField { .. }
                | IngestError::InvalidMetadataField { .. }
                | IngestError::MissingPrimaryFile { .. }
        )
    }

    /// Errors caused by the requested scan id or configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            IngestError::UnknownScanner { .. }
                | IngestError::NoMatchingScan { .. }
                | IngestError::AmbiguousScan { .. }
                | IngestError::InvalidPattern { .. }
        )
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::MissingMetadataField {
            field: "AcquisitionTime".to_string(),
            series: "T1_MPRAGE_0002".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "required field AcquisitionTime missing in sidecar of series T1_MPRAGE_0002"
        );
        assert!(err.is_metadata_error());
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_ambiguous_display() {
        let err = IngestError::AmbiguousScan {
            scan_id: "p23".to_string(),
            matches: vec!["p231sc".to_string(), "p239sc".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "source scan id 'p23' is ambiguous: 2 matches (p231sc, p239sc)"
        );
    }
}
