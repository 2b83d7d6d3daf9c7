// src/table/normalize.rs

use super::{Cell, Table};
use tracing::trace;

/// Trim whitespace and drop thousands separators.
pub fn clean_number(raw: &str) -> String {
    raw.trim().replace(',', "")
}

fn parse_cell(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => clean_number(s).parse::<f64>().ok(),
    }
}

/// Coerce each column to numbers, all or nothing: a single cell that does not
/// parse leaves its whole column as text.
pub fn normalize(mut table: Table) -> Table {
    for col in 0..table.num_columns() {
        let parsed: Option<Vec<f64>> = table.column(col).map(parse_cell).collect();
        match parsed {
            Some(values) => {
                for (row, v) in table.rows_mut().iter_mut().zip(values) {
                    row[col] = Cell::Number(v);
                }
            }
            None => trace!(column = %table.headers()[col], "left as text"),
        }
    }
    table
}
