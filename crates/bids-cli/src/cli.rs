//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "bids-cli",
    version,
    about = "Convert one MR scan into a session of a BIDS raw archive",
    long_about = "Convert the DICOM series of one MR scan with dcm2niix, classify them \
                  as anatomical, functional or field-map images, number their runs by \
                  acquisition time and file them under <ARCHIVE_ROOT>/<PROJECT_ID>/\
                  sub-<SUBJECT_ID>/ses-<NNN>.\n\n\
                  The session index comes from participants.tsv: a new scan id opens the \
                  next session, a known one reuses its session."
)]
pub struct Cli {
    /// Root directory holding the BIDS projects.
    #[arg(value_name = "ARCHIVE_ROOT")]
    pub archive_root: PathBuf,

    /// Project directory name under the archive root.
    #[arg(value_name = "PROJECT_ID")]
    pub project_id: String,

    /// Subject id (alphanumeric, with or without the `sub-` prefix).
    #[arg(value_name = "SUBJECT_ID")]
    pub subject_id: String,

    /// Source scan id, or a unique prefix of it.
    #[arg(value_name = "SOURCE_SCAN_ID")]
    pub source_scan_id: String,

    /// TOML file overriding the built-in pattern tables and paths.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding one folder per scanner.
    #[arg(long = "source-root", value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// DICOM to NIfTI converter program.
    #[arg(long = "converter", value_name = "PROGRAM")]
    pub converter: Option<String>,

    /// Convert and classify, but leave the registry and the files untouched.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
