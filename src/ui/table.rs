//! Column-aligned listings.

use console::{measure_text_width, pad_str, Alignment};

/// Rows of cells printed under a header, columns separated by two spaces.
///
/// Widths are measured without ANSI escapes so styled cells line up.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| measure_text_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let width = measure_text_width(cell);
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(width),
                    None => widths.push(width),
                }
            }
        }
        widths
    }

    /// Rendered lines, header first. Trailing blanks are trimmed.
    pub fn lines(&self) -> Vec<String> {
        let widths = self.widths();
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|row| {
                let cells: Vec<String> = widths
                    .iter()
                    .enumerate()
                    .map(|(i, width)| {
                        let cell = row.get(i).map(String::as_str).unwrap_or("");
                        pad_str(cell, *width, Alignment::Left, None).into_owned()
                    })
                    .collect();
                cells.join("  ").trim_end().to_string()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_aligned() {
        let mut table = Table::new(&["NAME", "IMAGE"]);
        table.add_row(vec!["dev".to_string(), "casa-dev-5.0.sif".to_string()]);
        table.add_row(vec!["release-5".to_string(), "casa-run-5.0.sif".to_string()]);

        assert_eq!(
            table.lines(),
            vec![
                "NAME       IMAGE",
                "dev        casa-dev-5.0.sif",
                "release-5  casa-run-5.0.sif",
            ]
        );
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn missing_cells_are_blank() {
        let mut table = Table::new(&["A", "B", "C"]);
        table.add_row(vec!["only".to_string()]);
        assert_eq!(table.lines()[1], "only");
    }

    #[test]
    fn styled_cells_are_measured_without_escapes() {
        let mut table = Table::new(&["NAME", "X"]);
        table.add_row(vec!["\u{1b}[1mab\u{1b}[0m".to_string(), "y".to_string()]);
        assert!(table.lines()[1].ends_with("    y"));
    }

    #[test]
    fn empty_table_has_header_only() {
        let table = Table::new(&["NAME"]);
        assert!(table.is_empty());
        assert_eq!(table.lines(), vec!["NAME"]);
    }
}
