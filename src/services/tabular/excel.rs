use std::io::Cursor;
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Reader};
use rayon::prelude::*;

use super::preview_source;
use super::rows::{MULTI_SHEET_PREVIEW_ROWS, PREVIEW_ROWS};
use super::source::SheetGrid;
use crate::error::AppError;
use crate::models::{SheetPreview, TabularResponse};

/// Opens an xlsx/xls workbook and previews every readable sheet.
///
/// The top-level rows come from the first readable sheet; `sheets` carries
/// each sheet's multi-sheet preview in workbook order.
pub fn preview_workbook(file_data: Bytes) -> Result<TabularResponse, AppError> {
    let start = std::time::Instant::now();
    let cursor = Cursor::new(file_data);

    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| {
            tracing::warn!("Failed to open workbook: {}", e);
            AppError::FileProcessingError(format!("Failed to open Excel file: {}", e))
        })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    tracing::debug!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let mut grids: Vec<(String, SheetGrid)> = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        match workbook.worksheet_range(sheet_name) {
            Ok(range) => grids.push((sheet_name.clone(), SheetGrid::from_range(&range))),
            Err(e) => {
                tracing::warn!("Failed to read worksheet {}: {}", sheet_name, e);
                continue;
            }
        }
    }

    let response = preview_grids(&grids)?;
    tracing::info!("Workbook preview built for {} sheets in {:?}", grids.len(), start.elapsed());
    Ok(response)
}

/// Builds the Excel response from already-read sheet grids.
pub fn preview_grids(grids: &[(String, SheetGrid)]) -> Result<TabularResponse, AppError> {
    let (_, first_grid) = grids
        .first()
        .ok_or_else(|| AppError::NoWorksheet("workbook contains no readable sheet".to_string()))?;

    let sheets: Vec<SheetPreview> = grids
        .par_iter()
        .map(|(name, grid)| {
            let preview = preview_source(grid, MULTI_SHEET_PREVIEW_ROWS);
            SheetPreview {
                name: name.clone(),
                headers: preview.header_labels,
                data: preview.rows,
                total_rows: preview.total_row_count,
            }
        })
        .collect();

    let first = preview_source(first_grid, PREVIEW_ROWS);
    Ok(TabularResponse {
        headers: first.header_labels,
        data: first.rows,
        total_rows: first.total_row_count,
        sheets: Some(sheets),
    })
}
