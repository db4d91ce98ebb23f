//! External DICOM-to-NIfTI conversion.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::discovery::{converted_pairs, list_files};
use crate::error::{IngestError, Result};

/// One converted image with its JSON sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedPair {
    pub primary: PathBuf,
    pub sidecar: PathBuf,
}

/// Result of converting one source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub pairs: Vec<ConvertedPair>,
    /// `true` when matching output already existed and the converter did not run.
    pub skipped: bool,
}

/// Converts one DICOM series folder into image/sidecar pairs.
///
/// Implementations must be idempotent: when output named after `name_hint`
/// already exists in `destination`, the conversion is skipped.
pub trait Converter {
    fn convert(&self, source: &Path, destination: &Path, name_hint: &str)
    -> Result<ConversionOutput>;
}

/// Runs `dcm2niix -o <destination> -z y -f <hint> <source>`.
#[derive(Debug, Clone)]
pub struct Dcm2niixConverter {
    program: String,
    compress: bool,
}

impl Dcm2niixConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            compress: true,
        }
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn build_command(&self, source: &Path, destination: &Path, name_hint: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-o")
            .arg(destination)
            .arg("-z")
            .arg(if self.compress { "y" } else { "n" })
            .arg("-f")
            .arg(name_hint)
            .arg(source);
        command
    }
}

/// Whether `dir` already holds an image converted under `name_hint`.
fn has_existing_output(dir: &Path, name_hint: &str) -> Result<bool> {
    Ok(list_files(dir)?.iter().any(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| {
                name.starts_with(name_hint) && (name.ends_with(".nii.gz") || name.ends_with(".nii"))
            })
    }))
}

impl Converter for Dcm2niixConverter {
    fn convert(
        &self,
        source: &Path,
        destination: &Path,
        name_hint: &str,
    ) -> Result<ConversionOutput> {
        if has_existing_output(destination, name_hint)? {
            info!(series = %name_hint, "existing conversion found, skipping converter");
            return Ok(ConversionOutput {
                pairs: converted_pairs(destination, name_hint)?,
                skipped: true,
            });
        }

        info!(series = %name_hint, source = %source.display(), "converting");
        let output = self
            .build_command(source, destination, name_hint)
            .output()
            .map_err(|e| IngestError::ConverterLaunch {
                program: self.program.clone(),
                source: e,
            })?;
        debug!(
            series = %name_hint,
            stdout = %String::from_utf8_lossy(&output.stdout),
            "converter output"
        );
        if !output.status.success() {
            return Err(IngestError::ConverterFailed {
                program: self.program.clone(),
                source_dir: source.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ConversionOutput {
            pairs: converted_pairs(destination, name_hint)?,
            skipped: false,
        })
    }
}
