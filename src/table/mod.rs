// src/table/mod.rs

pub mod ages;
pub mod extract;
pub mod merge;
pub mod normalize;

pub use ages::{split_ages, AgeBucket, SplitMode};
pub use extract::extract_tables;
pub use merge::merge;
pub use normalize::normalize;

use crate::error::{Result, ScrapeError};
use std::fmt;

/// A single table cell, either as scraped or coerced to a number.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Row-major table with a single header row.
///
/// Every row has exactly `headers.len()` cells; constructors reject anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(ScrapeError::MalformedTable(format!(
                "row {} has {} cells, header has {}",
                i,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    /// An empty table with the given column names.
    pub fn with_headers<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Insert a column at `idx`; `values` must have one cell per row.
    pub fn insert_column(&mut self, idx: usize, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(ScrapeError::MalformedTable(format!(
                "column `{}` has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        self.headers.insert(idx, name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.insert(idx, v);
        }
        Ok(())
    }

    pub fn push_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        self.insert_column(self.headers.len(), name, values)
    }

    /// Replace every header positionally; the width must not change.
    pub fn rename_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if names.len() != self.headers.len() {
            return Err(ScrapeError::UnexpectedLayout(format!(
                "cannot rename {} columns to {} names",
                self.headers.len(),
                names.len()
            )));
        }
        self.headers = names.iter().map(|n| n.as_ref().to_string()).collect();
        Ok(())
    }

    /// Append all rows of `other`, which must carry the same headers.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if other.headers != self.headers {
            return Err(ScrapeError::UnexpectedLayout(format!(
                "cannot append table with columns {:?} to {:?}",
                other.headers, self.headers
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }
}

#[cfg(test)]
pub(crate) fn table_of(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
    Table::new(headers.iter().map(|h| h.to_string()).collect(), rows).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()], vec!["3".into()]],
        )
        .unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedTable(_)));
    }

    #[test]
    fn test_insert_and_push_columns() {
        let mut t = table_of(&["age"], vec![vec!["0-4".into()], vec!["5-9".into()]]);
        t.insert_column(0, "low", vec![0.0.into(), 5.0.into()]).unwrap();
        t.push_column("pop", vec![10.0.into(), 20.0.into()]).unwrap();
        assert_eq!(t.headers(), &["low", "age", "pop"]);
        assert_eq!(t.rows()[1], vec![5.0.into(), "5-9".into(), 20.0.into()]);

        assert!(t.push_column("short", vec![1.0.into()]).is_err());
    }

    #[test]
    fn test_append_requires_same_headers() {
        let mut a = table_of(&["x"], vec![vec![1.0.into()]]);
        let b = table_of(&["x"], vec![vec![2.0.into()]]);
        let c = table_of(&["y"], vec![vec![3.0.into()]]);
        a.append(b).unwrap();
        assert_eq!(a.num_rows(), 2);
        assert!(a.append(c).is_err());
    }
}
