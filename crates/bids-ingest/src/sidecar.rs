//! JSON sidecar decoding.
//!
//! Only three keys matter to the pipeline: `AcquisitionTime` and `ImageType`
//! are required in every sidecar, `EchoNumber` is optional. A missing
//! required key means the converter or the source data is broken, so the
//! error aborts the batch rather than skipping the series.

use std::fs;
use std::path::Path;

use bids_model::{AcquisitionTime, ImageTypeTags, SidecarMetadata};
use serde_json::{Map, Value};

use crate::error::{IngestError, Result};

pub const ACQUISITION_TIME_KEY: &str = "AcquisitionTime";
pub const IMAGE_TYPE_KEY: &str = "ImageType";
pub const ECHO_NUMBER_KEY: &str = "EchoNumber";
pub const TASK_NAME_KEY: &str = "TaskName";

/// Reads the metadata fields of the sidecar belonging to `series`.
pub fn read_sidecar(path: &Path, series: &str) -> Result<SidecarMetadata> {
    let object = read_object(path)?;
    decode_sidecar(&object, series)
}

/// Sets `TaskName` in a functional sidecar, keeping every other key.
pub fn write_task_name(path: &Path, task: &str) -> Result<()> {
    let mut object = read_object(path)?;
    if object.get(TASK_NAME_KEY).and_then(Value::as_str) == Some(task) {
        return Ok(());
    }
    object.insert(TASK_NAME_KEY.to_string(), Value::String(task.to_string()));
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    serde::Serialize::serialize(&object, &mut serializer).map_err(|e| {
        IngestError::SidecarParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    fs::write(path, buffer).map_err(|source| IngestError::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let contents = fs::read_to_string(path).map_err(|source| IngestError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| IngestError::SidecarParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(IngestError::SidecarParse {
            path: path.to_path_buf(),
            message: "expected a JSON object".to_string(),
        }),
    }
}

pub(crate) fn decode_sidecar(object: &Map<String, Value>, series: &str) -> Result<SidecarMetadata> {
    let missing = |field: &str| IngestError::MissingMetadataField {
        field: field.to_string(),
        series: series.to_string(),
    };
    let invalid = |field: &str, reason: &str| IngestError::InvalidMetadataField {
        field: field.to_string(),
        series: series.to_string(),
        reason: reason.to_string(),
    };

    let acquisition_time = match object.get(ACQUISITION_TIME_KEY) {
        None | Some(Value::Null) => return Err(missing(ACQUISITION_TIME_KEY)),
        Some(Value::String(value)) if !value.trim().is_empty() => {
            AcquisitionTime::new(value.trim())
        }
        Some(_) => return Err(invalid(ACQUISITION_TIME_KEY, "expected a non-empty string")),
    };

    let image_type = match object.get(IMAGE_TYPE_KEY) {
        None | Some(Value::Null) => return Err(missing(IMAGE_TYPE_KEY)),
        Some(Value::Array(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                let tag = item
                    .as_str()
                    .ok_or_else(|| invalid(IMAGE_TYPE_KEY, "expected an array of strings"))?;
                tags.push(tag.to_string());
            }
            ImageTypeTags::new(tags)
        }
        Some(_) => return Err(invalid(IMAGE_TYPE_KEY, "expected an array of strings")),
    };

    let echo_number = match object.get(ECHO_NUMBER_KEY) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let echo = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| invalid(ECHO_NUMBER_KEY, "expected a positive integer"))?;
            Some(echo)
        }
    };

    Ok(SidecarMetadata {
        acquisition_time,
        image_type,
        echo_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn decodes_required_and_optional_fields() {
        let meta = decode_sidecar(
            &object(json!({
                "AcquisitionTime": "10:00:00.000000",
                "ImageType": ["ORIGINAL", "PRIMARY", "M", "NORM"],
                "EchoNumber": 2,
                "SeriesDescription": "gre_field_mapping"
            })),
            "GRE_0003_e2",
        )
        .unwrap();
        assert_eq!(meta.acquisition_time.as_str(), "10:00:00.000000");
        assert!(meta.image_type.contains("NORM"));
        assert_eq!(meta.echo_number, Some(2));
    }

    #[test]
    fn missing_required_fields_name_the_field() {
        let err = decode_sidecar(&object(json!({ "ImageType": ["M"] })), "S1").unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingMetadataField { ref field, ref series }
                if field == "AcquisitionTime" && series == "S1"
        ));
        let err = decode_sidecar(&object(json!({ "AcquisitionTime": "10:00:00" })), "S2")
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingMetadataField { ref field, .. } if field == "ImageType"
        ));
    }

    #[test]
    fn rejects_malformed_fields() {
        let err = decode_sidecar(
            &object(json!({ "AcquisitionTime": 36000, "ImageType": ["M"] })),
            "S1",
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::InvalidMetadataField { .. }));
        let err = decode_sidecar(
            &object(json!({ "AcquisitionTime": "10:00", "ImageType": ["M"], "EchoNumber": -1 })),
            "S1",
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::InvalidMetadataField { .. }));
    }

    #[test]
    fn task_name_is_added_and_other_keys_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EP2D_REST_0005.json");
        fs::write(
            &path,
            r#"{"AcquisitionTime": "10:00:00", "ImageType": ["ORIGINAL"], "RepetitionTime": 2.0}"#,
        )
        .unwrap();
        write_task_name(&path, "rest").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n    \"TaskName\": \"rest\""));
        let value: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["RepetitionTime"], json!(2.0));
        assert_eq!(value["AcquisitionTime"], json!("10:00:00"));
    }
}
