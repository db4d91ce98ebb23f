use anyhow::{Context, Result};
use bids_core::{Pipeline, PipelineError, PipelineReport, PipelineRequest};
use bids_ingest::Dcm2niixConverter;
use bids_cli::config::{Overrides, load_options};
use tracing::{error, info};

use crate::cli::Cli;

/// Runs the pipeline for the scan named on the command line.
pub fn run_convert(cli: &Cli) -> Result<PipelineReport> {
    let options = Overrides {
        source_root: cli.source_root.clone(),
        converter: cli.converter.clone(),
        dry_run: cli.dry_run,
    }
    .apply(load_options(cli.config.as_deref())?);

    let request = PipelineRequest::new(
        &cli.archive_root,
        &cli.project_id,
        &cli.subject_id,
        &cli.source_scan_id,
    )
    .map_err(fatal)?;
    let converter =
        Dcm2niixConverter::new(&options.converter).with_compression(options.compress);
    info!(converter = %options.converter, dry_run = options.dry_run, "starting conversion");
    let pipeline = Pipeline::new(options, converter)
        .map_err(fatal)
        .context("invalid configuration")?;
    pipeline.run(&request).map_err(fatal)
}

fn fatal(err: PipelineError) -> anyhow::Error {
    let kind = err.kind();
    error!(kind = kind.as_str(), error = %err, "aborting");
    anyhow::Error::new(err).context(format!("{} error", kind.as_str()))
}
