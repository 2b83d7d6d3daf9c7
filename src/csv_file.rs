// src/csv_file.rs

use anyhow::{Context, Result};
use csv::{Reader, ReaderBuilder, Writer};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::table::{normalize, Cell, Table};

/// Read a headed CSV file into a normalized table.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV {:?}", path))?;
    collect_table(rdr, &format!("{:?}", path))
}

/// Same as [`read_table`], for a CSV body held in memory.
pub fn parse_table(bytes: &[u8]) -> Result<Table> {
    let rdr = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    collect_table(rdr, "CSV body")
}

fn collect_table<R: Read>(mut rdr: Reader<R>, origin: &str) -> Result<Table> {
    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("Failed to read header of {}", origin))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {} of {}", i, origin))?;
        rows.push(record.iter().map(Cell::from).collect());
    }
    let table = Table::new(headers, rows).with_context(|| format!("reading {}", origin))?;
    Ok(normalize(table))
}

/// Write `table` with its header row; the file is replaced if present.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {:?}", parent))?;
    }
    let mut wtr = Writer::from_path(path).with_context(|| format!("creating {:?}", path))?;
    wtr.write_record(table.headers())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(Cell::to_string))?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    debug!(path = %path.display(), rows = table.num_rows(), "wrote table");
    Ok(())
}
