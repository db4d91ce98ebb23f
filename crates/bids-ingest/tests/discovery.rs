//! Tests for converted-series discovery.

use std::fs;
use std::path::Path;

use bids_ingest::{IngestError, discover_series};

fn write_series(dir: &Path, stem: &str, sidecar: &str) {
    fs::write(dir.join(format!("{stem}.json")), sidecar).expect("write sidecar");
    fs::write(dir.join(format!("{stem}.nii.gz")), b"\x1f\x8b").expect("write image");
}

fn hints(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[test]
fn multi_echo_outputs_become_separate_series() {
    let dir = tempfile::tempdir().expect("temp dir");
    let sidecar = r#"{"AcquisitionTime": "10:05:00.000000", "ImageType": ["ORIGINAL", "PRIMARY", "M", "NORM"], "EchoNumber": 1}"#;
    write_series(dir.path(), "GRE_FIELD_MAPPING_0003_e1", sidecar);
    write_series(dir.path(), "GRE_FIELD_MAPPING_0003_e2", sidecar);
    write_series(
        dir.path(),
        "GRE_FIELD_MAPPING_0004_e2_ph",
        r#"{"AcquisitionTime": "10:05:00.000000", "ImageType": ["ORIGINAL", "PRIMARY", "P", "PHASE"]}"#,
    );
    write_series(
        dir.path(),
        "LOCALIZER_0001",
        r#"{"AcquisitionTime": "09:00:00", "ImageType": ["ORIGINAL"]}"#,
    );
    fs::create_dir(dir.path().join("func")).expect("category folder");

    let series = discover_series(
        dir.path(),
        &hints(&["GRE_FIELD_MAPPING_0003", "GRE_FIELD_MAPPING_0004"]),
    )
    .expect("discover");
    let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "GRE_FIELD_MAPPING_0003_e1",
            "GRE_FIELD_MAPPING_0003_e2",
            "GRE_FIELD_MAPPING_0004_e2_ph"
        ]
    );
    assert_eq!(series[0].files.len(), 2);
    assert_eq!(series[0].metadata.echo_number, Some(1));
    assert!(series[2].metadata.image_type.contains("PHASE"));
    assert!(series[0].sidecar().is_some());
}

#[test]
fn extra_sibling_files_travel_with_the_series() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_series(
        dir.path(),
        "EP2D_DIFF_0007",
        r#"{"AcquisitionTime": "11:00:00", "ImageType": ["ORIGINAL"]}"#,
    );
    fs::write(dir.path().join("EP2D_DIFF_0007.bval"), "0 1000").expect("bval");
    fs::write(dir.path().join("EP2D_DIFF_0007.bvec"), "0 1 0").expect("bvec");
    let series = discover_series(dir.path(), &hints(&["EP2D_DIFF_0007"])).expect("discover");
    let mut extensions: Vec<&str> = series[0]
        .files
        .iter()
        .map(|f| f.extension.as_str())
        .collect();
    extensions.sort_unstable();
    assert_eq!(extensions, vec![".bval", ".bvec", ".json", ".nii.gz"]);
}

#[test]
fn missing_required_field_fails_discovery() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_series(
        dir.path(),
        "T1_MPRAGE_0002",
        r#"{"ImageType": ["ORIGINAL", "PRIMARY", "M", "ND"]}"#,
    );
    let err = discover_series(dir.path(), &hints(&["T1_MPRAGE_0002"])).expect_err("missing time");
    assert!(matches!(err, IngestError::MissingMetadataField { ref field, .. } if field == "AcquisitionTime"));
}

#[test]
fn sidecar_without_image_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join("T2_SPACE_0004.json"),
        r#"{"AcquisitionTime": "10:00:00", "ImageType": ["ND"]}"#,
    )
    .expect("write sidecar");
    let err = discover_series(dir.path(), &hints(&["T2_SPACE_0004"])).expect_err("no image");
    assert!(matches!(err, IngestError::MissingPrimaryFile { .. }));
}

#[test]
fn no_hints_means_no_series() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_series(
        dir.path(),
        "T1_MPRAGE_0002",
        r#"{"AcquisitionTime": "10:00:00", "ImageType": ["ND"]}"#,
    );
    assert!(discover_series(dir.path(), &[]).expect("discover").is_empty());
}
