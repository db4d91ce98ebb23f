//! Run numbering by acquisition time.

use std::collections::BTreeMap;

use bids_model::{Category, ClassifiedSeries, RunNumber, SequencedSeries};
use tracing::debug;

use crate::error::OrderingError;

/// Assigns 1-based run numbers to eligible series.
///
/// Eligible series are grouped by [`bids_model::Label::group_key`]; inside a
/// group the earliest acquisition gets run 1. Two series of one group with
/// the same acquisition time are an error, never a tie to break. Discarded
/// series get no run. Output order matches input order.
pub fn assign_runs(classified: Vec<ClassifiedSeries>) -> Result<Vec<SequencedSeries>, OrderingError> {
    let mut groups: BTreeMap<(Category, String), Vec<usize>> = BTreeMap::new();
    for (idx, series) in classified.iter().enumerate() {
        if let Some(label) = series.disposition.label() {
            groups.entry(label.group_key()).or_default().push(idx);
        }
    }

    let mut runs: Vec<Option<RunNumber>> = vec![None; classified.len()];
    for ((category, key), mut members) in groups {
        members.sort_by(|a, b| {
            classified[*a]
                .series
                .acquisition_time()
                .cmp(classified[*b].series.acquisition_time())
        });
        for pair in members.windows(2) {
            let (first, second) = (&classified[pair[0]].series, &classified[pair[1]].series);
            if first.acquisition_time() == second.acquisition_time() {
                return Err(OrderingError::DuplicateAcquisitionTime {
                    category,
                    key,
                    time: first.acquisition_time().clone(),
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }
        if members.len() > RunNumber::MAX as usize {
            return Err(OrderingError::TooManyRuns {
                category,
                key,
                count: members.len(),
            });
        }
        for (rank, idx) in members.iter().enumerate() {
            let run = RunNumber::from_rank(rank).map_err(|_| OrderingError::TooManyRuns {
                category,
                key: key.clone(),
                count: members.len(),
            })?;
            debug!(
                series = %classified[*idx].series.name,
                category = %category,
                key = %key,
                run = %run,
                "run assigned"
            );
            runs[*idx] = Some(run);
        }
    }

    Ok(classified
        .into_iter()
        .zip(runs)
        .map(|(classified, run)| SequencedSeries { classified, run })
        .collect())
}
