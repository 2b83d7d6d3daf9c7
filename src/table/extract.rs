// src/table/extract.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::{Cell, Table};

static TABLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("CSS selector for tables should be valid"));
static ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("CSS selector for rows should be valid"));
static CELL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("CSS selector for cells should be valid"));

/// Minimum number of data rows for a table to be kept.
pub const MIN_DATA_ROWS: usize = 2;

/// Every well-formed `<table>` in `doc`, in document order.
///
/// Cells come back as text; run them through [`super::normalize`] to coerce numbers.
pub fn extract_tables(doc: &Html) -> Vec<Table> {
    let tables: Vec<Table> = doc.select(&TABLE_SEL).filter_map(parse_table).collect();
    debug!(count = tables.len(), "extracted tables");
    tables
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SEL)
        .map(|c| c.text().collect::<String>().replace('\n', ""))
        .collect()
}

/// First row is the header. Any row of a different width, or fewer than
/// `MIN_DATA_ROWS` data rows, discards the whole table.
fn parse_table(table: ElementRef<'_>) -> Option<Table> {
    let mut rows = table.select(&ROW_SEL).map(row_cells);
    let headers: Vec<String> = rows.next()?.into_iter().map(|h| h.trim().to_string()).collect();

    let mut data = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.len() != headers.len() {
            trace!(row = i, cells = row.len(), header = headers.len(), "ragged row; dropping table");
            return None;
        }
        data.push(row.into_iter().map(Cell::Text).collect());
    }

    if data.len() < MIN_DATA_ROWS {
        trace!(rows = data.len(), "too few rows; dropping table");
        return None;
    }
    Table::new(headers, data).ok()
}
