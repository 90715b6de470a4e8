pub mod scanner;
pub mod tags;

pub use scanner::{scan_step, scan_tags, DicomScan, ScanCursor, ScanStep, StopReason, TagValue};
pub use tags::{DicomTagSpec, DICOM_TAGS};

use serde_json::Value;

use crate::error::AppError;
use crate::models::{DicomResponse, Metadata};
use scanner::{DATA_START, DICM_MAGIC, PREAMBLE_LEN};

#[derive(Debug, Clone, PartialEq)]
pub struct DicomPreview {
    pub is_valid_container: bool,
    /// `isValidDicom`, `fileSize`, then found tags in table order.
    pub metadata: Metadata,
    pub file_size: usize,
    /// `None` when the magic check failed and no scan ran.
    pub stop_reason: Option<StopReason>,
}

impl DicomPreview {
    pub fn into_response(self) -> DicomResponse {
        DicomResponse {
            metadata: self.metadata,
            has_image: false,
            image_data_url: None,
        }
    }
}

/// Checks the `DICM` magic and extracts the tag table's fields.
///
/// A missing magic is a negative result, not an error; only a buffer too short
/// to hold the magic is rejected.
pub fn scan_dicom_tags(bytes: &[u8]) -> Result<DicomPreview, AppError> {
    if bytes.len() <= DATA_START {
        return Err(AppError::BufferTooShort {
            kind: "DICOM",
            actual: bytes.len(),
            required: DATA_START + 1,
        });
    }

    let file_size = bytes.len();
    let is_valid_container = &bytes[PREAMBLE_LEN..DATA_START] == DICM_MAGIC;

    let mut metadata = Metadata::new();
    metadata.insert("isValidDicom".to_string(), Value::Bool(is_valid_container));
    metadata.insert("fileSize".to_string(), Value::from(file_size));

    if !is_valid_container {
        tracing::info!("DICOM magic not found in {} byte buffer", file_size);
        return Ok(DicomPreview {
            is_valid_container,
            metadata,
            file_size,
            stop_reason: None,
        });
    }

    let mut scan = scan_tags(bytes);
    tracing::info!(
        "DICOM scan found {} tags, stopped at offset {} ({:?})",
        scan.found.len(),
        scan.final_position,
        scan.stop_reason
    );

    scan.found.sort_by_key(|(index, _)| *index);
    for (index, value) in scan.found {
        metadata.insert(DICOM_TAGS[index].display_name.to_string(), value.into());
    }

    Ok(DicomPreview {
        is_valid_container,
        metadata,
        file_size,
        stop_reason: Some(scan.stop_reason),
    })
}
