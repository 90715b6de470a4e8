use bytes::Bytes;
use reqwest::Client;
use crate::error::AppError;

/// Fetches the object behind a signed storage URL, refusing payloads over `max_size`.
pub async fn load_file_from_url(client: &Client, url: &str, max_size: usize) -> Result<Bytes, AppError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::HttpError(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::HttpError(
            format!("Failed to fetch file. Status: {}", response.status())
        ));
    }

    if let Some(length) = response.content_length() {
        check_size(length as usize, max_size)?;
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::HttpError(format!("Failed to read response bytes: {}", e)))?;

    check_size(bytes.len(), max_size)?;
    Ok(bytes)
}

pub fn check_size(actual: usize, limit: usize) -> Result<(), AppError> {
    if actual > limit {
        return Err(AppError::PayloadTooLarge { actual, limit });
    }
    Ok(())
}
