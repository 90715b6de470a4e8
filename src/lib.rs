//! File preview service.
//!
//! Turns an already-retrieved object (CSV, Excel, DICOM, NIfTI) into a small,
//! bounded, human-readable summary. The decoding engine lives in
//! [`services`]; [`routes`] is the thin HTTP shell around it.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Self, error::AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| error::AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }
}
