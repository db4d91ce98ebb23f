//! Tests for bids-model types.

use bids_model::{
    AnatomicalEligibility, Category, ClassifiedSeries, DiscardReason, Disposition, FieldMapRole,
    Label, PipelineOptions, Series, SidecarMetadata,
};
use bids_model::{AcquisitionTime, ImageTypeTags};

#[test]
fn options_deserialize_partially() {
    let json = r#"{
        "converter": "/opt/dcm2niix",
        "anatomical_eligibility": { "policy": "forbid_tag", "tag": "DERIVED" },
        "functional": [ { "key": "nback", "patterns": ["nback", "n-back"] } ]
    }"#;
    let options: PipelineOptions = serde_json::from_str(json).expect("deserialize options");
    assert_eq!(options.converter, "/opt/dcm2niix");
    assert_eq!(
        options.anatomical_eligibility,
        AnatomicalEligibility::ForbidTag("DERIVED".to_string())
    );
    assert_eq!(options.functional.entries().len(), 1);
    assert_eq!(options.functional.entries()[0].key, "nback");
    // untouched fields keep their defaults
    assert_eq!(options.anatomical, PipelineOptions::default().anatomical);
    assert!(options.compress);
}

#[test]
fn unclassified_has_no_pattern_table() {
    let options = PipelineOptions::default();
    assert!(options.pattern_table(Category::Unclassified).is_none());
    for category in Category::CLASSIFICATION_ORDER {
        assert!(options.pattern_table(category).is_some());
    }
}

#[test]
fn classified_series_serializes() {
    let classified = ClassifiedSeries {
        series: Series {
            name: "GRE_FIELD_MAPPING_0003_e2".to_string(),
            files: vec![],
            metadata: SidecarMetadata {
                acquisition_time: AcquisitionTime::new("10:01:02.500000"),
                image_type: ImageTypeTags::new(["ORIGINAL", "PRIMARY", "M", "NORM"]),
                echo_number: Some(2),
            },
        },
        category: Category::FieldMap,
        disposition: Disposition::Eligible(Label::FieldMap(FieldMapRole::Magnitude(2))),
    };
    let json = serde_json::to_string(&classified).expect("serialize");
    let round: ClassifiedSeries = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(round, classified);
}

#[test]
fn discard_reasons_render() {
    let reason = DiscardReason::Ineligible {
        policy: AnatomicalEligibility::default().describe(),
    };
    assert_eq!(
        reason.to_string(),
        "anatomical image rejected by policy (requires ND)"
    );
}
