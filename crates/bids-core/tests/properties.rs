//! Property tests for run numbering and canonical names.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use bids_core::naming::destination;
use bids_core::{OrderingError, SessionContext, assign_runs, parse_name};
use bids_model::{
    AcquisitionTime, Category, ClassifiedSeries, Disposition, FieldMapRole, ImageTypeTags, Label,
    RunNumber, Series, SessionLabel, SidecarMetadata, SubjectId,
};
use proptest::prelude::*;

const TASKS: [&str; 3] = ["rest", "faces", "music"];

fn functional(idx: usize, task: usize, minute: u32) -> ClassifiedSeries {
    ClassifiedSeries {
        series: Series {
            name: format!("EP2D_{idx:04}"),
            files: Vec::new(),
            metadata: SidecarMetadata {
                acquisition_time: AcquisitionTime::new(format!("{:02}:{:02}:00", minute / 60, minute % 60)),
                image_type: ImageTypeTags::new(["ND"]),
                echo_number: None,
            },
        },
        category: Category::Functional,
        disposition: Disposition::Eligible(Label::Functional {
            task: TASKS[task].to_string(),
        }),
    }
}

proptest! {
    #[test]
    fn runs_are_unique_within_a_group(
        acquisitions in prop::collection::vec((0..TASKS.len(), 0u32..24 * 60), 0..40)
    ) {
        let classified: Vec<_> = acquisitions
            .iter()
            .enumerate()
            .map(|(idx, (task, minute))| functional(idx, *task, *minute))
            .collect();
        let mut times: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for (task, minute) in &acquisitions {
            times.entry(*task).or_default().push(*minute);
        }
        let has_duplicate = times.values().any(|minutes| {
            minutes.iter().collect::<BTreeSet<_>>().len() != minutes.len()
        });

        match assign_runs(classified) {
            Ok(sequenced) => {
                prop_assert!(!has_duplicate);
                let mut seen: BTreeSet<(String, RunNumber)> = BTreeSet::new();
                for item in &sequenced {
                    let label = item.classified.disposition.label().unwrap();
                    let run = item.run.unwrap();
                    prop_assert!(seen.insert((label.group_key().1, run)));
                }
                for (task, minutes) in &times {
                    let runs: BTreeSet<u32> = sequenced
                        .iter()
                        .filter(|item| item.classified.disposition.label().unwrap().group_key().1 == TASKS[*task])
                        .map(|item| item.run.unwrap().get())
                        .collect();
                    let expected: BTreeSet<u32> = (1..=u32::try_from(minutes.len()).unwrap()).collect();
                    prop_assert_eq!(runs, expected);
                }
            }
            Err(OrderingError::DuplicateAcquisitionTime { .. }) => prop_assert!(has_duplicate),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn canonical_names_parse_back(
        subject in "[A-Za-z0-9]{1,12}",
        session in 1u32..=999,
        run in 1u32..=99,
        task in "[a-z]{1,10}",
        echo in 1u32..4,
        kind in 0usize..4,
    ) {
        let subject = SubjectId::new(subject).unwrap();
        let context = SessionContext {
            subject: subject.clone(),
            session: SessionLabel::from_index(session).unwrap(),
            session_dir: PathBuf::from("/archive/np2/ses"),
        };
        let label = match kind {
            0 => Label::Functional { task: task.clone() },
            1 => Label::Anatomical { contrast: "T2".to_string() },
            2 => Label::FieldMap(FieldMapRole::PhaseDiff),
            _ => Label::FieldMap(FieldMapRole::Magnitude(echo)),
        };
        let run = RunNumber::new(run).unwrap();

        let path = destination(&context, &label, Some(run), ".nii.gz").unwrap();
        let file_name = path.file_name().unwrap().to_str().unwrap();
        let parsed = parse_name(label.category(), file_name).unwrap();

        prop_assert_eq!(parsed.subject, subject.as_str());
        prop_assert_eq!(parsed.session, context.session);
        prop_assert_eq!(parsed.fragment, label.fragment());
        prop_assert_eq!(parsed.extension, ".nii.gz");
        if label.has_run_segment() {
            prop_assert_eq!(parsed.run, Some(run));
        } else {
            prop_assert_eq!(parsed.run, None);
        }
        if let Label::Functional { task } = &label {
            prop_assert_eq!(parsed.task.as_deref(), Some(task.as_str()));
        }
    }
}
