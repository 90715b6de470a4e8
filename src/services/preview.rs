use bytes::Bytes;

use crate::error::AppError;
use crate::models::PreviewResponse;
use crate::services::{dicom, nifti, tabular};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Excel,
    Pdf,
    Dicom,
    Nifti,
    Csv,
    Other,
}

/// Recognised file-name suffixes; `nii.gz` is checked before the bare `nii`.
const EXTENSIONS: [(&str, FileCategory); 9] = [
    ("nii.gz", FileCategory::Nifti),
    ("nifti", FileCategory::Nifti),
    ("nii", FileCategory::Nifti),
    ("dicom", FileCategory::Dicom),
    ("dcm", FileCategory::Dicom),
    ("xlsx", FileCategory::Excel),
    ("xls", FileCategory::Excel),
    ("csv", FileCategory::Csv),
    ("pdf", FileCategory::Pdf),
];

impl FileCategory {
    /// Parses a declared type hint; `other` and unknown hints give `None`.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "excel" | "xlsx" | "xls" => Some(Self::Excel),
            "pdf" => Some(Self::Pdf),
            "dicom" | "dcm" => Some(Self::Dicom),
            "nifti" | "nii" => Some(Self::Nifti),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

fn file_name(object_key: &str) -> &str {
    object_key.rsplit('/').next().unwrap_or(object_key)
}

/// The recognised suffix of the object's file name, if any.
pub fn known_extension(object_key: &str) -> Option<(&'static str, FileCategory)> {
    let name = file_name(object_key).to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(ext, _)| {
            name.len() > ext.len() + 1
                && name.ends_with(ext)
                && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
        })
        .copied()
}

/// Classifies by file extension, then declared type, then storage path segment.
pub fn classify(object_key: &str, declared_file_type: Option<&str>) -> FileCategory {
    if let Some((_, category)) = known_extension(object_key) {
        return category;
    }
    if let Some(category) = declared_file_type.and_then(FileCategory::from_hint) {
        return category;
    }

    object_key
        .rsplit('/')
        .skip(1)
        .find_map(FileCategory::from_hint)
        .unwrap_or(FileCategory::Other)
}

/// Routes already-fetched bytes to exactly one preview component.
pub fn render_preview(
    object_key: &str,
    declared_file_type: Option<&str>,
    file_data: Bytes,
) -> Result<PreviewResponse, AppError> {
    if object_key.trim().is_empty() {
        return Err(AppError::InvalidInput("objectKey must not be empty".to_string()));
    }

    let start = std::time::Instant::now();
    let category = classify(object_key, declared_file_type);
    tracing::info!(
        "Previewing {} as {:?} ({} bytes)",
        object_key,
        category,
        file_data.len()
    );

    let response = match category {
        FileCategory::Csv => PreviewResponse::Csv(tabular::preview_csv(&file_data)),
        FileCategory::Excel => PreviewResponse::Excel(tabular::preview_workbook(file_data)?),
        FileCategory::Dicom => PreviewResponse::Dicom(dicom::scan_dicom_tags(&file_data)?.into_response()),
        FileCategory::Nifti => {
            let extension = known_extension(object_key)
                .map(|(ext, _)| ext.to_string())
                .or_else(|| file_name(object_key).rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
                .unwrap_or_default();
            PreviewResponse::Nifti(nifti::preview_nifti(&file_data, file_name(object_key), &extension)?)
        }
        FileCategory::Pdf | FileCategory::Other => {
            return Err(AppError::UnsupportedFileType(format!(
                "no preview decoder for {:?} ({})",
                category, object_key
            )));
        }
    };

    tracing::info!("Preview of {} completed in {:?}", object_key, start.elapsed());
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_takes_precedence_over_hints() {
        assert_eq!(classify("uploads/dicom/table.csv", Some("excel")), FileCategory::Csv);
        assert_eq!(classify("a/brain.NII.GZ", None), FileCategory::Nifti);
        assert_eq!(classify("scan.dcm", Some("nifti")), FileCategory::Dicom);
        assert_eq!(classify("book.xls", None), FileCategory::Excel);
    }

    #[test]
    fn declared_type_beats_path_segment() {
        assert_eq!(classify("uploads/dicom/blob", Some("nifti")), FileCategory::Nifti);
        assert_eq!(classify("uploads/dicom/blob", Some("other")), FileCategory::Dicom);
    }

    #[test]
    fn path_segment_is_last_resort() {
        assert_eq!(classify("tasks/7/excel/upload-01", None), FileCategory::Excel);
        assert_eq!(classify("tasks/7/upload-01", None), FileCategory::Other);
        assert_eq!(classify("csv", None), FileCategory::Other);
    }

    #[test]
    fn bare_extension_is_not_a_file_name() {
        assert_eq!(known_extension(".csv"), None);
        assert_eq!(known_extension("report.csv").map(|(ext, _)| ext), Some("csv"));
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let result = render_preview("doc.pdf", None, Bytes::from_static(b"%PDF-1.7"));
        assert!(matches!(result, Err(AppError::UnsupportedFileType(_))));

        let result = render_preview("  ", Some("csv"), Bytes::new());
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
