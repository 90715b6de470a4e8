use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

/// Structural rejects: the input could not be processed at all.
///
/// Heuristic degradations (no header found, no DICOM tags matched, bad
/// NIfTI magic, no encoding scored) are never reported through this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Buffer too short for {kind}: got {actual} bytes, need {required}")]
    BufferTooShort {
        kind: &'static str,
        actual: usize,
        required: usize,
    },
    #[error("No worksheet found: {0}")]
    NoWorksheet(String),
    #[error("File processing error: {0}")]
    FileProcessingError(String),
    #[error("Payload too large: {actual} bytes exceeds limit of {limit}")]
    PayloadTooLarge { actual: usize, limit: usize },
    #[error("HTTP Error: {0}")]
    HttpError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::BufferTooShort { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NoWorksheet(_) => StatusCode::NOT_FOUND,
            AppError::FileProcessingError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::HttpError(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "Invalid preview request",
            AppError::UnsupportedFileType(_) => "Preview is not available for this file type",
            AppError::BufferTooShort { .. } => "File is too short to preview",
            AppError::NoWorksheet(_) => "No worksheet found in workbook",
            AppError::FileProcessingError(_) => "Failed to process file",
            AppError::PayloadTooLarge { .. } => "File is too large to preview",
            AppError::HttpError(_) => "Failed to retrieve file",
            AppError::Internal(_) => "Internal error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("preview request failed: {}", self);
        } else {
            tracing::warn!("preview request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.summary(),
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_rejects_map_to_client_statuses() {
        let short = AppError::BufferTooShort { kind: "DICOM", actual: 10, required: 133 };
        assert_eq!(short.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(short.to_string().contains("got 10 bytes"));

        let unsupported = AppError::UnsupportedFileType("pdf".to_string());
        assert_eq!(unsupported.into_response().status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn fetch_failures_are_gateway_errors() {
        let err = AppError::HttpError("timeout".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
