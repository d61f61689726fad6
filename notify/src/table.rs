//! Text tables: the renderer behind every report section
//!
//! Cells are set by (row, column) and the table grows as needed. Unset
//! cells render empty.

use std::fmt::Write;

#[derive(Debug, Clone, Default)]
pub struct TextTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(names: &[&str]) -> Self {
        let mut table = Self::new();
        for name in names {
            table.define_column(name);
        }
        table
    }

    /// Add a column, returning its index. Redefining a name returns the existing index.
    pub fn define_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        self.columns.len() - 1
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: impl ToString) {
        while self.columns.len() <= col {
            self.columns.push(String::new());
        }
        while self.rows.len() <= row {
            self.rows.push(Vec::new());
        }
        let cells = &mut self.rows[row];
        while cells.len() <= col {
            cells.push(String::new());
        }
        cells[col] = value.to_string();
    }

    /// Append a row of cells in column order
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let row = self.rows.len();
        self.rows.push(Vec::new());
        for (col, value) in cells.into_iter().enumerate() {
            self.set_value(row, col, value);
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map_or("", String::as_str)
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, heading)| {
                self.rows
                    .iter()
                    .map(|cells| cells.get(col).map_or(0, |c| c.chars().count()))
                    .chain(std::iter::once(heading.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(1)
            })
            .collect()
    }

    fn format_line(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
        let mut line = String::new();
        for (i, (cell, &width)) in cells.zip(widths).enumerate() {
            if i > 0 {
                line.push(' ');
            }
            let _ = write!(line, "{cell:<width$}");
        }
        line.trim_end().to_string()
    }

    fn heading_line(&self, widths: &[usize]) -> String {
        Self::format_line(self.columns.iter().cloned(), widths)
    }

    fn data_lines<'a>(&'a self, widths: &'a [usize]) -> impl Iterator<Item = String> + 'a {
        (0..self.rows.len()).map(move |row| {
            Self::format_line(
                (0..self.columns.len()).map(|col| self.cell(row, col).to_string()),
                widths,
            )
        })
    }

    /// reStructuredText simple table
    pub fn get_rst(&self) -> String {
        let widths = self.widths();
        let rule = widths
            .iter()
            .map(|w| "=".repeat(*w))
            .collect::<Vec<_>>()
            .join(" ");

        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&self.heading_line(&widths));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        for line in self.data_lines(&widths) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&rule);
        out.push('\n');
        out
    }

    /// Space-aligned plain text with a dashed heading underline
    pub fn get_text(&self) -> String {
        let widths = self.widths();
        let rule = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(" ");

        let mut out = String::new();
        out.push_str(&self.heading_line(&widths));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        for line in self.data_lines(&widths) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    pub fn get_html(&self) -> String {
        let mut out = String::from("<table border=\"1\">\n<tr>");
        for heading in &self.columns {
            let _ = write!(out, "<th>{}</th>", escape_html(heading));
        }
        out.push_str("</tr>\n");
        for row in 0..self.rows.len() {
            out.push_str("<tr>");
            for col in 0..self.columns.len() {
                let _ = write!(out, "<td>{}</td>", escape_html(self.cell(row, col)));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>\n");
        out
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rst_layout() {
        let mut table = TextTable::with_columns(&["Host", "Status"]);
        table.push_row(["linux-build-01", "F"]);
        table.push_row(["mac", "E"]);

        let expected = "\
============== ======
Host           Status
============== ======
linux-build-01 F
mac            E
============== ======
";
        assert_eq!(table.get_rst(), expected);
    }

    #[test]
    fn test_sparse_cells_render_empty() {
        let mut table = TextTable::with_columns(&["A", "B", "C"]);
        table.set_value(1, 2, 7);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 0), "");
        assert_eq!(table.cell(1, 2), "7");
        assert_eq!(table.cell(5, 5), "");

        let text = table.get_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A B C");
        assert_eq!(lines[1], "- - -");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "    7");
    }

    #[test]
    fn test_named_columns() {
        let mut table = TextTable::new();
        assert_eq!(table.define_column("Host"), 0);
        assert_eq!(table.define_column("Context"), 1);
        assert_eq!(table.define_column("Host"), 0);
        table.set_value(0, 1, "py3");
        assert_eq!(table.cell(0, 1), "py3");
        assert_eq!(table.column_index("Context"), Some(1));
        assert_eq!(table.column_index("Extra"), None);
    }

    #[test]
    fn test_html_escapes_cells() {
        let mut table = TextTable::with_columns(&["Test Name"]);
        table.push_row(["a<b> & \"c\""]);
        let html = table.get_html();
        assert!(html.contains("<th>Test Name</th>"));
        assert!(html.contains("<td>a&lt;b&gt; &amp; &quot;c&quot;</td>"));
    }
}
