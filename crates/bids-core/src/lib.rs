//! Classification-and-naming pipeline.
//!
//! Stages, in order: [`classifier`] labels each converted series,
//! [`sequencer`] numbers runs by acquisition time, [`naming`] derives the
//! canonical BIDS names, [`migration`] moves or deletes the files. The
//! [`pipeline`] driver wires them to the registry and the converter.

pub mod classifier;
pub mod dataset;
pub mod error;
pub mod layout;
pub mod migration;
pub mod naming;
pub mod pipeline;
pub mod report;
pub mod sequencer;

pub use classifier::Classifier;
pub use error::{ClassifyError, ErrorKind, MigrationError, MigrationFailure, OrderingError, PipelineError};
pub use layout::ArchiveLayout;
pub use migration::{FileMove, MigrationExecutor, MigrationPlan, PlannedAction, PlannedSeries, plan_migration};
pub use naming::{ParsedName, SessionContext, canonical_stem, parse_name};
pub use pipeline::{Pipeline, PipelineRequest};
pub use report::{OutcomeAction, PipelineReport, SeriesOutcome};
pub use sequencer::assign_runs;
