use serde_json::Value;

use super::header::TabularHeader;
use super::source::TabularSource;
use crate::models::PreviewRow;

/// Rows shown for a single CSV or sheet preview.
pub const PREVIEW_ROWS: usize = 10;

/// Rows shown per sheet in multi-sheet mode.
pub const MULTI_SHEET_PREVIEW_ROWS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct TabularPreview {
    pub header_labels: Vec<String>,
    pub rows: Vec<PreviewRow>,
    /// Rows after the header, blank ones included.
    pub total_row_count: usize,
}

impl TabularPreview {
    pub fn preview_row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Reads up to `max_rows` non-blank rows following the header.
///
/// Cells are taken relative to `header.first_column_index`; a cell missing from
/// the source maps to an empty string, so every row has exactly the header's
/// keys. Rows whose mapped cells are all blank are skipped without counting
/// against `max_rows`.
pub fn extract_rows<S: TabularSource + ?Sized>(
    source: &S,
    header: &TabularHeader,
    max_rows: usize,
) -> TabularPreview {
    let start = header.row_index + 1;
    let row_count = source.row_count();
    let mut rows = Vec::with_capacity(max_rows.min(row_count.saturating_sub(start)));

    for index in start..row_count {
        if rows.len() >= max_rows {
            break;
        }

        let cells = source.cells(index);
        let values: Vec<String> = (0..header.labels.len())
            .map(|offset| {
                cells
                    .get(header.first_column_index + offset)
                    .map(|c| c.trim().to_string())
                    .unwrap_or_default()
            })
            .collect();

        if values.iter().all(|v| v.is_empty()) {
            continue;
        }

        rows.push(
            header
                .labels
                .iter()
                .cloned()
                .zip(values.into_iter().map(Value::String))
                .collect(),
        );
    }

    TabularPreview {
        header_labels: header.labels.clone(),
        rows,
        total_row_count: row_count.saturating_sub(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tabular::header::{locate_header, MAX_SEARCH_ROWS};
    use crate::services::tabular::source::CsvLines;

    fn preview(text: &str, max_rows: usize) -> TabularPreview {
        let source = CsvLines::new(text);
        let header = locate_header(&source, MAX_SEARCH_ROWS);
        extract_rows(&source, &header, max_rows)
    }

    #[test]
    fn rows_align_with_offset_header() {
        let result = preview(",name,age\n,bob,3\n,amy\n", PREVIEW_ROWS);
        assert_eq!(result.header_labels, vec!["name", "age"]);
        assert_eq!(result.preview_row_count(), 2);
        assert_eq!(result.rows[0]["name"], "bob");
        assert_eq!(result.rows[0]["age"], "3");
        assert_eq!(result.rows[1]["age"], "");
    }

    #[test]
    fn blank_rows_are_skipped_but_counted() {
        let result = preview("a,b\n,\n1,2\n\n3,4\n", PREVIEW_ROWS);
        assert_eq!(result.preview_row_count(), 2);
        assert_eq!(result.total_row_count, 4);
        assert_eq!(result.rows[1]["a"], "3");
    }

    #[test]
    fn row_budget_caps_output_without_padding() {
        let mut text = String::from("n\n");
        for i in 0..25 {
            text.push_str(&format!("{}\n", i));
        }
        let capped = preview(&text, PREVIEW_ROWS);
        assert_eq!(capped.preview_row_count(), PREVIEW_ROWS);
        assert_eq!(capped.total_row_count, 25);

        let short = preview("n\n1\n", PREVIEW_ROWS);
        assert_eq!(short.preview_row_count(), 1);
    }

    #[test]
    fn every_row_has_exactly_the_header_keys() {
        let result = preview("x,y,z\n1\n1,2,3,4,5\n,,9\n", PREVIEW_ROWS);
        for row in &result.rows {
            let keys: Vec<_> = row.keys().cloned().collect();
            assert_eq!(keys, result.header_labels);
        }
    }

    #[test]
    fn header_only_source_has_no_rows() {
        let result = preview("a,b\n", PREVIEW_ROWS);
        assert_eq!(result.preview_row_count(), 0);
        assert_eq!(result.total_row_count, 0);
    }
}
