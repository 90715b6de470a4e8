pub mod encoding;
pub mod excel;
pub mod header;
pub mod rows;
pub mod source;

pub use encoding::{sniff, CandidateDecoding};
pub use excel::preview_workbook;
pub use header::{locate_header, TabularHeader, MAX_SEARCH_ROWS};
pub use rows::{extract_rows, TabularPreview};
pub use source::{CsvLines, SheetGrid, TabularSource};

use crate::models::TabularResponse;

/// Locates the header and extracts up to `max_rows` rows from `source`.
pub fn preview_source<S: TabularSource + ?Sized>(source: &S, max_rows: usize) -> TabularPreview {
    let header = locate_header(source, MAX_SEARCH_ROWS);
    extract_rows(source, &header, max_rows)
}

/// Decodes CSV bytes of unknown encoding and previews the first rows.
pub fn preview_csv(file_data: &[u8]) -> TabularResponse {
    let decoded = sniff(file_data);
    tracing::info!(
        "CSV decoded as {} (score {}, {} bytes)",
        decoded.encoding_name,
        decoded.score,
        file_data.len()
    );

    let lines = CsvLines::new(&decoded.decoded_text);
    let preview = preview_source(&lines, rows::PREVIEW_ROWS);

    TabularResponse {
        headers: preview.header_labels,
        data: preview.rows,
        total_rows: preview.total_row_count,
        sheets: None,
    }
}
