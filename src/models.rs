use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One preview row: header label -> cell text, in header order.
pub type PreviewRow = Map<String, Value>;

/// Ordered metadata map used by the DICOM and NIfTI previews.
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub object_key: String,
    #[serde(default)]
    pub declared_file_type: Option<String>,
    pub signed_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPreviewQuery {
    pub object_key: String,
    #[serde(default)]
    pub declared_file_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SheetPreview {
    pub name: String,
    pub headers: Vec<String>,
    pub data: Vec<PreviewRow>,
    pub total_rows: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabularResponse {
    pub headers: Vec<String>,
    pub data: Vec<PreviewRow>,
    pub total_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<SheetPreview>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DicomResponse {
    pub metadata: Metadata,
    pub has_image: bool,
    pub image_data_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NiftiResponse {
    pub metadata: Metadata,
}

/// Body returned for a successful preview, tagged by `type`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PreviewResponse {
    Csv(TabularResponse),
    Excel(TabularResponse),
    Dicom(DicomResponse),
    Nifti(NiftiResponse),
}
