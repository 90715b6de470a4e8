use calamine::{Data, Range};

/// Row-addressable view over tabular data, shared by the CSV and Excel paths.
pub trait TabularSource {
    /// Total number of rows the source holds.
    fn row_count(&self) -> usize;

    /// Cells of row `index`; empty when the row does not exist.
    fn cells(&self, index: usize) -> Vec<String>;
}

/// Decoded CSV text, addressed by line.
#[derive(Debug, Clone)]
pub struct CsvLines<'a> {
    lines: Vec<&'a str>,
}

impl<'a> CsvLines<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { lines: text.lines().collect() }
    }
}

impl TabularSource for CsvLines<'_> {
    fn row_count(&self) -> usize {
        self.lines.len()
    }

    fn cells(&self, index: usize) -> Vec<String> {
        self.lines
            .get(index)
            .map(|line| split_csv_line(line))
            .unwrap_or_default()
    }
}

/// Splits one CSV line on commas, honouring double quotes and `""` escapes.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

/// Worksheet cells rendered to text, one `Vec` per worksheet row.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn from_range(range: &Range<Data>) -> Self {
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Self { rows }
    }
}

impl TabularSource for SheetGrid {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cells(&self, index: usize) -> Vec<String> {
        self.rows.get(index).cloned().unwrap_or_default()
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        _ => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_commas_stay_in_one_cell() {
        assert_eq!(
            split_csv_line(r#"a,"b, c",d"#),
            vec!["a".to_string(), "b, c".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn doubled_quotes_unescape() {
        assert_eq!(split_csv_line(r#""say ""hi""",x"#), vec![r#"say "hi""#.to_string(), "x".to_string()]);
    }

    #[test]
    fn empty_line_is_one_blank_cell() {
        assert_eq!(split_csv_line(""), vec![String::new()]);
        assert_eq!(split_csv_line(",,"), vec![String::new(), String::new(), String::new()]);
    }

    #[test]
    fn trailing_newline_does_not_add_a_row() {
        let lines = CsvLines::new("a,b\r\n1,2\r\n");
        assert_eq!(lines.row_count(), 2);
        assert_eq!(lines.cells(1), vec!["1".to_string(), "2".to_string()]);
        assert!(lines.cells(5).is_empty());
    }

    #[test]
    fn grid_renders_calamine_cells() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("id".to_string()));
        range.set_value((1, 0), Data::Int(7));
        range.set_value((1, 1), Data::Bool(true));
        let grid = SheetGrid::from_range(&range);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cells(0), vec!["id".to_string(), String::new()]);
        assert_eq!(grid.cells(1), vec!["7".to_string(), "true".to_string()]);
    }
}
