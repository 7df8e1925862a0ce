use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Rows of plain text cells rendered as an aligned table or as CSV
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
    max_widths: Vec<Option<usize>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        let max_widths = vec![None; headers.len()];
        Self {
            headers,
            rows: Vec::new(),
            max_widths,
        }
    }

    /// Truncate a column to `width` characters in table output
    pub fn limit(mut self, column: usize, width: usize) -> Self {
        if let Some(slot) = self.max_widths.get_mut(column) {
            *slot = Some(width);
        }
        self
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut out = self.headers.join(",");
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| c.replace(',', " ")).collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    pub fn to_text(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| match self.max_widths.get(i).copied().flatten() {
                        Some(width) => truncate(cell, width),
                        None => cell.clone(),
                    })
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                rows.iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = format_line(self.headers.iter().copied(), &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format_line(rule.iter().map(String::as_str), &widths));
        for row in &rows {
            out.push_str(&format_line(row.iter().map(String::as_str), &widths));
        }
        out
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let mut line = padded.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

fn truncate(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        return cell.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = cell.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(vec!["Username", "Name"]);
        table.push(vec!["admin".to_string(), "Administrator".to_string()]);
        table.push(vec!["bob".to_string(), "Bob, Jr.".to_string()]);
        table
    }

    #[test]
    fn test_text_alignment() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Username  Name");
        assert_eq!(lines[1], "--------  -------------");
        assert_eq!(lines[2], "admin     Administrator");
        assert_eq!(lines[3], "bob       Bob, Jr.");
    }

    #[test]
    fn test_csv_strips_commas() {
        let csv = sample().to_csv();
        assert_eq!(csv, "Username,Name\nadmin,Administrator\nbob,Bob  Jr.\n");
    }

    #[test]
    fn test_column_limit() {
        let mut table = Table::new(vec!["Description"]).limit(0, 10);
        table.push(vec!["A very long room description".to_string()]);
        let text = table.to_text();
        assert!(text.contains("A very ..."));
        assert!(!text.contains("description"));

        // CSV keeps the full value
        assert!(table.to_csv().contains("A very long room description"));
    }
}
