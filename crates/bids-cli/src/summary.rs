//! Console summary of a pipeline run.

use std::path::PathBuf;

use bids_core::{OutcomeAction, PipelineReport, SeriesOutcome};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

pub fn print_summary(report: &PipelineReport) {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    let state = if report.created { "new" } else { "existing" };
    println!(
        "Subject: {}  Session: {} ({state}){mode}",
        report.subject.label(),
        report.session
    );
    println!("Source scan: {}", report.source_scan_id);
    if report.outcomes.is_empty() {
        println!("No series converted.");
    } else {
        println!("{}", summary_table(report));
    }
    if let Some(work_dir) = &report.work_dir {
        eprintln!("Unfiled conversion output kept in {}", work_dir.display());
    }
    if report.has_errors() {
        eprintln!("Errors:");
        for error in &report.errors {
            eprintln!("- {error}");
            for path in &error.stranded {
                eprintln!("  not restored: {}", path.display());
            }
        }
    }
}

pub fn summary_table(report: &PipelineReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header_cell("Series"),
            header_cell("Category"),
            header_cell("Run"),
            header_cell("Action"),
            header_cell("Detail"),
        ]);
    for outcome in &report.outcomes {
        table.add_row(vec![
            Cell::new(&outcome.series),
            Cell::new(outcome.category),
            run_cell(outcome),
            action_cell(&outcome.action),
            Cell::new(detail(&outcome.action)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(totals(report)).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    table
}

fn totals(report: &PipelineReport) -> String {
    let totals = format!(
        "{} moved, {} deleted, {} failed",
        report.moved(),
        report.deleted(),
        report.failed()
    );
    match report.already_filed() {
        0 => totals,
        filed => format!("{totals}, {filed} already filed"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn run_cell(outcome: &SeriesOutcome) -> Cell {
    match outcome.run {
        Some(run) => Cell::new(run).set_alignment(CellAlignment::Right),
        None => Cell::new("-").add_attribute(Attribute::Dim),
    }
}

fn action_cell(action: &OutcomeAction) -> Cell {
    let color = match action {
        OutcomeAction::Moved(_) | OutcomeAction::WouldMove(_) => Color::Green,
        OutcomeAction::Deleted(_) | OutcomeAction::WouldDelete(_) => Color::Yellow,
        OutcomeAction::AlreadyFiled(_) => Color::Blue,
        OutcomeAction::Failed(_) => Color::Red,
    };
    Cell::new(action.as_str()).fg(color)
}

fn detail(action: &OutcomeAction) -> String {
    match action {
        OutcomeAction::Moved(paths)
        | OutcomeAction::WouldMove(paths)
        | OutcomeAction::AlreadyFiled(paths) => file_names(paths),
        OutcomeAction::Deleted(reason) | OutcomeAction::WouldDelete(reason) => reason.to_string(),
        OutcomeAction::Failed(message) => message.clone(),
    }
}

fn file_names(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}
