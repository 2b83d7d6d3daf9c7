// src/table/merge.rs

use tracing::{debug, instrument};

use super::ages::{split_ages, AgeBucket, SplitMode, POP_FEMALE_COLUMN, POP_MALE_COLUMN};
use super::{Cell, Table};
use crate::error::{Result, ScrapeError};

pub const WOMEN_POPULATION: &str = "women_population";
pub const MEN_POPULATION: &str = "men_population";
pub const TOTAL_POPULATION: &str = "total_population";

/// Join population counts onto a disease table by age-range containment.
///
/// For each disease row, every population cohort that lies inside its
/// `[low, high]` range contributes its male and female counts. The disease
/// table comes back in its original shape with `women_population`,
/// `men_population` and `total_population` appended.
#[instrument(level = "debug", skip_all, fields(disease_rows = disease.num_rows(), population_rows = population.num_rows()))]
pub fn merge(disease: &Table, population: &Table) -> Result<Table> {
    let split_disease = split_ages(disease, SplitMode::Disease)?;
    let split_population = split_ages(population, SplitMode::Population)?;

    let male_col = POP_MALE_COLUMN + 2;
    let female_col = POP_FEMALE_COLUMN + 2;
    let cohorts = split_population
        .rows()
        .iter()
        .map(|row| {
            let bucket = AgeBucket::from_split_row(row)?;
            let male = row[male_col].as_f64();
            let female = row[female_col].as_f64();
            match (male, female) {
                (Some(m), Some(f)) => Ok((bucket, m, f)),
                _ => Err(ScrapeError::UnexpectedLayout(
                    "population counts are not numeric".into(),
                )),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let mut women = Vec::with_capacity(disease.num_rows());
    let mut men = Vec::with_capacity(disease.num_rows());
    let mut total = Vec::with_capacity(disease.num_rows());
    for row in split_disease.rows() {
        let bucket = AgeBucket::from_split_row(row)?;
        let (m, f) = cohorts
            .iter()
            .filter(|(c, _, _)| bucket.contains(c))
            .fold((0.0, 0.0), |(m, f), (_, cm, cf)| (m + cm, f + cf));
        men.push(Cell::Number(m));
        women.push(Cell::Number(f));
        total.push(Cell::Number(m + f));
    }

    let mut out = disease.clone();
    out.push_column(WOMEN_POPULATION, women)?;
    out.push_column(MEN_POPULATION, men)?;
    out.push_column(TOTAL_POPULATION, total)?;
    debug!(rows = out.num_rows(), "merged population");
    Ok(out)
}
