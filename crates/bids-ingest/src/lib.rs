//! Ingestion side of the pipeline: locating the raw scan, running the
//! external converter and reading back what it produced.

pub mod converter;
pub mod discovery;
pub mod error;
pub mod sidecar;
pub mod source;

pub use converter::{ConversionOutput, ConvertedPair, Converter, Dcm2niixConverter};
pub use discovery::{converted_pairs, discover_series, list_files};
pub use error::{IngestError, Result};
pub use sidecar::{read_sidecar, write_task_name};
pub use source::{ScanSource, discover_source_folders, resolve_scan, source_folder_regex};
