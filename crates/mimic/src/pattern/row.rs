//! Example rows and `|`-delimited tables.

use crate::error::ContractError;
use indexmap::IndexMap;

/// Column name to literal, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(columns: &[String], values: Vec<String>) -> Self {
        Self {
            columns: columns.iter().cloned().zip(values).collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A header row of column names plus the data rows beneath it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Examples {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Examples {
    /// Parse table lines; the first line is the header.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, ContractError> {
        let Some((header, data)) = lines.split_first() else {
            return Ok(Self::default());
        };
        let columns = split_table_row(header.as_ref());
        let mut rows = Vec::with_capacity(data.len());
        for line in data {
            let cells = split_table_row(line.as_ref());
            if cells.len() != columns.len() {
                return Err(ContractError::MalformedTable {
                    row: line.as_ref().trim().to_string(),
                    expected: columns.len(),
                    found: cells.len(),
                });
            }
            rows.push(Row::from_pairs(&columns, cells));
        }
        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split one table line into trimmed cells.
///
/// Border pipes produce an empty first and last cell, which are dropped.
/// `\|` is a literal pipe, `\\` a backslash and `\n` a newline.
pub fn split_table_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.trim().chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('|') => current.push('|'),
                Some('\\') => current.push('\\'),
                Some('n') => current.push('\n'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    cells.push(current);

    let mut cells: Vec<String> = cells.into_iter().map(|cell| cell.trim().to_string()).collect();
    if cells.first().is_some_and(String::is_empty) {
        cells.remove(0);
    }
    if cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    cells
}

/// Escape a cell so `split_table_row` reads it back unchanged.
pub fn escape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_pipes_are_dropped() {
        assert_eq!(split_table_row("| id | (number) |"), vec!["id", "(number)"]);
    }

    #[test]
    fn test_escaped_pipe_survives_round_trip() {
        let cell = "a|b\\c";
        let line = format!("| {} | x |", escape_cell(cell));
        assert_eq!(split_table_row(&line), vec![cell.to_string(), "x".to_string()]);
    }

    #[test]
    fn test_examples_reject_short_rows() {
        let result = Examples::parse(&["| id | name |", "| 10 |"]);
        assert!(matches!(
            result,
            Err(ContractError::MalformedTable { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_examples_rows_are_keyed_by_column() {
        let examples = Examples::parse(&["| id | name |", "| 10 | Jane |"]).unwrap();
        assert_eq!(examples.columns, vec!["id", "name"]);
        assert_eq!(examples.rows[0].get("name"), Some("Jane"));
    }

    #[test]
    fn test_empty_middle_cell_is_kept() {
        assert_eq!(split_table_row("| a |  | c |"), vec!["a", "", "c"]);
    }
}
