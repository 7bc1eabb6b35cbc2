//! Minimal column-oriented table.
//!
//! Cells are typed once at ingest (missing / number / text) so downstream code
//! never re-parses strings.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Type a raw CSV field.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || matches!(s.to_ascii_lowercase().as_str(), "na" | "nan" | "null" | "none") {
            return Cell::Missing;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(s.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Category label for one-hot encoding. Whole numbers render without a
    /// fractional part so `1` and `1.0` land on the same label.
    pub fn category(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(v) => Some(format_number(*v)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Number(v) => write!(f, "{}", format_number(*v)),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
    n_rows: usize,
}

impl Table {
    pub fn new(names: Vec<String>) -> Self {
        let columns = vec![Vec::new(); names.len()];
        Self {
            names,
            columns,
            n_rows: 0,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.index_of(name).map(|i| self.columns[i].as_slice())
    }

    /// Append a row. Short rows are padded with `Missing`, extra cells ignored.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.names.len(), Cell::Missing);
        for (col, cell) in self.columns.iter_mut().zip(row) {
            col.push(cell);
        }
        self.n_rows += 1;
    }

    /// Cells of one row, in column order.
    pub fn row(&self, idx: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c[idx]).collect()
    }

    /// Add a column, replacing any existing column with the same name.
    ///
    /// # Panics
    /// Panics if `cells` does not have one entry per row.
    pub fn set_column(&mut self, name: &str, cells: Vec<Cell>) {
        assert_eq!(cells.len(), self.n_rows, "column `{name}` has the wrong length");
        match self.index_of(name) {
            Some(i) => self.columns[i] = cells,
            None => {
                self.names.push(name.to_string());
                self.columns.push(cells);
            }
        }
    }

    /// Remove the named columns, ignoring names that are not present.
    /// Returns the names that were actually removed.
    pub fn drop_columns<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut removed = Vec::new();
        for name in names {
            if let Some(i) = self.index_of(name) {
                self.names.remove(i);
                self.columns.remove(i);
                removed.push(name.to_string());
            }
        }
        removed
    }

    /// New table with the given rows (in the given order).
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| rows.iter().map(|&r| col[r].clone()).collect())
            .collect();
        Table {
            names: self.names.clone(),
            columns,
            n_rows: rows.len(),
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
