//! Integration tests for the participants registry.

use std::fs;

use bids_model::{SessionLabel, SubjectId};
use bids_registry::{
    MemoryRegistryStore, Registry, RegistryError, RegistryRow, RegistryStore, TsvRegistryStore,
};
use proptest::prelude::*;

fn subject(id: &str) -> SubjectId {
    SubjectId::new(id).expect("valid subject")
}

#[test]
fn sessions_are_numbered_per_subject_and_stable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = TsvRegistryStore::new(dir.path().join("participants.tsv"));
    assert!(store.initialize().expect("initialize"));
    let registry = Registry::new(store);

    let first = registry
        .resolve_or_create_session(&subject("900"), "a1")
        .expect("first session");
    assert_eq!(first.session.index(), 1);
    assert!(first.created);

    let second = registry
        .resolve_or_create_session(&subject("900"), "b2")
        .expect("second session");
    assert_eq!(second.session.index(), 2);
    assert!(second.created);

    let again = registry
        .resolve_or_create_session(&subject("900"), "a1")
        .expect("re-processed session");
    assert_eq!(again.session.index(), 1);
    assert!(!again.created);

    let other = registry
        .resolve_or_create_session(&subject("901"), "c3")
        .expect("other subject");
    assert_eq!(other.session.to_string(), "ses-001");

    let contents = fs::read_to_string(dir.path().join("participants.tsv")).expect("read table");
    assert_eq!(
        contents,
        "participant_id\tsession_id\tmr_id\n\
         sub-900\tses-001\ta1\n\
         sub-900\tses-002\tb2\n\
         sub-901\tses-001\tc3\n"
    );
}

#[test]
fn missing_table_reads_as_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = TsvRegistryStore::new(dir.path().join("participants.tsv"));
    assert!(store.load().expect("load").is_empty());
}

#[test]
fn reads_table_written_by_other_tools() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("participants.tsv");
    fs::write(
        &path,
        "\u{feff}participant_id\tsession_id\tmr_id\nsub-53888\tses-001\tp231sc\nsub-53888\tses-002\tp239sc\n",
    )
    .expect("write table");
    let registry = Registry::new(TsvRegistryStore::new(&path));
    let sessions = registry.sessions_for(&subject("53888")).expect("sessions");
    assert_eq!(sessions.len(), 2);
    let next = registry
        .resolve_session(&subject("53888"), "p266")
        .expect("resolve");
    assert_eq!(next.session.to_string(), "ses-003");
}

#[test]
fn malformed_tables_are_corrupt() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cases = [
        "participant_id\tsession\tmr_id\n",
        "participant_id\tsession_id\tmr_id\n900\tses-001\ta1\n",
        "participant_id\tsession_id\tmr_id\nsub-900\tses-1\ta1\n",
        "participant_id\tsession_id\tmr_id\nsub-900\tses-001\n",
        "participant_id\tsession_id\tmr_id\nsub-900\tses-001\t\n",
    ];
    for (idx, contents) in cases.iter().enumerate() {
        let path = dir.path().join(format!("participants_{idx}.tsv"));
        fs::write(&path, contents).expect("write table");
        let registry = Registry::new(TsvRegistryStore::new(&path));
        let err = registry
            .resolve_session(&subject("900"), "b2")
            .expect_err("corrupt table");
        assert!(
            matches!(err, RegistryError::Corrupt { .. }),
            "case {idx}: {err}"
        );
    }
}

#[test]
fn failed_rewrite_keeps_previous_table() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing").join("participants.tsv");
    let store = TsvRegistryStore::new(&path);
    let row = RegistryRow::new(subject("900"), SessionLabel::from_index(1).unwrap(), "a1");
    let err = store.replace(&[row]).expect_err("parent does not exist");
    assert!(matches!(err, RegistryError::Write { .. }));
    assert!(!path.exists());
}

proptest! {
    #[test]
    fn new_scans_get_max_plus_one(scans in prop::collection::btree_set("[a-z][0-9]{2}", 1..8)) {
        let registry = Registry::new(MemoryRegistryStore::new());
        let subject = subject("900");
        for (pos, scan) in scans.iter().enumerate() {
            let resolution = registry.resolve_or_create_session(&subject, scan).unwrap();
            prop_assert!(resolution.created);
            prop_assert_eq!(resolution.session.index() as usize, pos + 1);
        }
        for (pos, scan) in scans.iter().enumerate() {
            let resolution = registry.resolve_or_create_session(&subject, scan).unwrap();
            prop_assert!(!resolution.created);
            prop_assert_eq!(resolution.session.index() as usize, pos + 1);
        }
    }
}
