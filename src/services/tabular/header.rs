use std::collections::HashSet;

use super::source::TabularSource;

/// Rows scanned from the top while looking for a header.
pub const MAX_SEARCH_ROWS: usize = 50;

/// Width of the synthesized header when the source has no first row to size it.
pub const DEFAULT_COLUMN_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularHeader {
    pub row_index: usize,
    pub first_column_index: usize,
    pub last_column_index: usize,
    pub labels: Vec<String>,
    /// `true` when no row qualified and `Column N` labels were generated.
    pub synthesized: bool,
}

/// Returns the first row within `max_search_rows` that has a non-blank cell.
///
/// The labels cover the span between that row's first and last non-blank
/// cells, so data rows are later read relative to `first_column_index`.
pub fn find_header<S: TabularSource + ?Sized>(source: &S, max_search_rows: usize) -> Option<TabularHeader> {
    let limit = source.row_count().min(max_search_rows);

    (0..limit).find_map(|row_index| {
        let cells = source.cells(row_index);
        let (first, last) = populated_span(&cells)?;
        Some(TabularHeader {
            row_index,
            first_column_index: first,
            last_column_index: last,
            labels: unique_labels(&cells[first..=last]),
            synthesized: false,
        })
    })
}

/// Like [`find_header`], but never fails.
///
/// When nothing qualifies, row 0 becomes the header with generic `Column N`
/// labels sized to the first row. Columns may then be misattributed; that is a
/// known limit of the heuristic.
pub fn locate_header<S: TabularSource + ?Sized>(source: &S, max_search_rows: usize) -> TabularHeader {
    if let Some(header) = find_header(source, max_search_rows) {
        tracing::debug!(
            "header located at row {} spanning columns {}..={}",
            header.row_index, header.first_column_index, header.last_column_index
        );
        return header;
    }

    let width = match source.cells(0).len() {
        0 => DEFAULT_COLUMN_COUNT,
        n => n,
    };
    tracing::warn!("no header row within first {} rows, synthesizing {} columns", max_search_rows, width);

    TabularHeader {
        row_index: 0,
        first_column_index: 0,
        last_column_index: width - 1,
        labels: (1..=width).map(|n| format!("Column {}", n)).collect(),
        synthesized: true,
    }
}

/// Indices of the first and last cells with non-blank trimmed content.
pub fn populated_span(cells: &[String]) -> Option<(usize, usize)> {
    let first = cells.iter().position(|c| !c.trim().is_empty())?;
    let last = cells.iter().rposition(|c| !c.trim().is_empty())?;
    Some((first, last))
}

/// Trims labels, names blank ones after their position and suffixes duplicates.
fn unique_labels(raw: &[String]) -> Vec<String> {
    let mut existing = HashSet::new();

    raw.iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell.trim() {
                "" => format!("Column {}", idx + 1),
                trimmed => trimmed.to_string(),
            };

            // If the label already exists, add a numeric suffix
            let mut label = base.clone();
            let mut counter = 2;
            while !existing.insert(label.clone()) {
                label = format!("{}_{}", base, counter);
                counter += 1;
            }
            label
        })
        .collect()
}
