// src/table/ages.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::{Cell, Table};
use crate::error::{Result, ScrapeError};

/// Lower bound given to the trailing "all ages" row of a disease table.
pub const TOTAL_LOW_AGE: u32 = 30;

/// Cell value of an open-ended `high` bound.
pub const UNBOUNDED: f64 = f64::INFINITY;

pub const LOW_COLUMN: &str = "low";
pub const HIGH_COLUMN: &str = "high";

/// Column positions of male and female counts in a population table, before splitting.
pub const POP_MALE_COLUMN: usize = 1;
pub const POP_FEMALE_COLUMN: usize = 2;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new("[^0-9]").expect("valid regex"));

/// How the trailing row of an age-stratified table is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Last row is a pre-computed total; it is kept with bounds `[30, ∞)`.
    Disease,
    /// Last row is an open-ended cohort folded into the row before it.
    Population,
}

/// Inclusive age range; `high == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBucket {
    pub low: u32,
    pub high: Option<u32>,
}

impl AgeBucket {
    pub fn new(low: u32, high: Option<u32>) -> Self {
        Self { low, high }
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &AgeBucket) -> bool {
        if other.low < self.low {
            return false;
        }
        match (self.high, other.high) {
            (None, _) => true,
            (Some(h), Some(oh)) => oh <= h,
            (Some(_), None) => false,
        }
    }

    /// Read the bucket from the leading `low`/`high` cells of a split row.
    pub fn from_split_row(row: &[Cell]) -> Result<Self> {
        let low = row
            .first()
            .and_then(Cell::as_f64)
            .ok_or_else(|| ScrapeError::UnexpectedLayout("row has no numeric low bound".into()))?;
        let high = row
            .get(1)
            .and_then(Cell::as_f64)
            .ok_or_else(|| ScrapeError::UnexpectedLayout("row has no numeric high bound".into()))?;
        Ok(Self {
            low: low as u32,
            high: high.is_finite().then_some(high as u32),
        })
    }

    fn cells(&self) -> [Cell; 2] {
        [
            Cell::Number(self.low as f64),
            Cell::Number(self.high.map_or(UNBOUNDED, |h| h as f64)),
        ]
    }
}

fn parse_bound(part: &str) -> Option<u32> {
    NON_DIGIT.replace_all(part, "").parse().ok()
}

/// Parse the first column of every row; the last row is always open-ended.
fn parse_buckets(rows: &[Vec<Cell>]) -> Result<Vec<AgeBucket>> {
    let last = rows.len().saturating_sub(1);
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let text = row.first().map(Cell::to_string).unwrap_or_default();
            let mut parts = text.split('-');
            let low = parts.next().and_then(parse_bound).ok_or_else(|| {
                ScrapeError::UnexpectedLayout(format!("no lower age bound in `{}`", text))
            })?;
            if i == last {
                return Ok(AgeBucket::new(low, None));
            }
            let high = parts.next().and_then(parse_bound).ok_or_else(|| {
                ScrapeError::UnexpectedLayout(format!("no upper age bound in `{}`", text))
            })?;
            Ok(AgeBucket::new(low, Some(high)))
        })
        .collect()
}

fn prepend_bounds(rows: Vec<Vec<Cell>>, buckets: &[AgeBucket]) -> Vec<Vec<Cell>> {
    rows.into_iter()
        .zip(buckets)
        .map(|(row, b)| b.cells().into_iter().chain(row).collect())
        .collect()
}

fn numeric(row: &[Cell], col: usize) -> Result<f64> {
    row.get(col).and_then(Cell::as_f64).ok_or_else(|| {
        ScrapeError::UnexpectedLayout(format!("population column {} is not numeric", col))
    })
}

/// Decompose the textual age range in the first column into leading
/// `low`/`high` columns.
pub fn split_ages(table: &Table, mode: SplitMode) -> Result<Table> {
    if table.num_rows() < 2 {
        return Err(ScrapeError::MalformedTable(format!(
            "need at least 2 rows to split ages, got {}",
            table.num_rows()
        )));
    }

    let mut headers = vec![LOW_COLUMN.to_string(), HIGH_COLUMN.to_string()];
    headers.extend(table.headers().iter().cloned());
    let mut rows = table.rows().to_vec();

    match mode {
        SplitMode::Disease => {
            let total = rows.pop().expect("at least two rows");
            let buckets = parse_buckets(&rows)?;
            let mut out = prepend_bounds(rows, &buckets);
            let total_bucket = AgeBucket::new(TOTAL_LOW_AGE, None);
            out.push(total_bucket.cells().into_iter().chain(total).collect());
            Table::new(headers, out)
        }
        SplitMode::Population => {
            if table.num_columns() <= POP_FEMALE_COLUMN {
                return Err(ScrapeError::UnexpectedLayout(format!(
                    "population table has {} columns, need age, male, female",
                    table.num_columns()
                )));
            }
            // Only a single open-ended cohort is supported: the row before it
            // must carry an explicit upper bound, which parse_buckets enforces.
            let buckets = parse_buckets(&rows)?;
            let mut out = prepend_bounds(rows, &buckets);

            let oldest = out.pop().expect("at least two rows");
            let male = POP_MALE_COLUMN + 2;
            let female = POP_FEMALE_COLUMN + 2;
            let folded_male = numeric(&oldest, male)?;
            let folded_female = numeric(&oldest, female)?;
            let last = out.last_mut().expect("at least one row remains");
            let male_total = numeric(last, male)? + folded_male;
            let female_total = numeric(last, female)? + folded_female;
            last[male] = Cell::Number(male_total);
            last[female] = Cell::Number(female_total);
            last[1] = Cell::Number(UNBOUNDED);
            trace!(folded_male, folded_female, "folded open-ended cohort");
            Table::new(headers, out)
        }
    }
}
