// src/pipeline.rs

use anyhow::{Context, Result};
use std::fmt;
use tracing::{info, instrument, warn};
use url::Url;

use crate::catalog::{build_catalog, Catalog};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::fetch::{Fetcher, PageSource};
use crate::plan::{CountryPlan, FetchPlan, PagePart};
use crate::population::PopulationSource;
use crate::table::{extract_tables, merge, normalize, Cell, Table};

/// Column order of the combined output table.
pub const OUTPUT_COLUMNS: [&str; 8] = [
    "Country",
    "Age group",
    "Men with dementia",
    "Women with dementia",
    "Total",
    "women_population",
    "men_population",
    "total_population",
];

/// A country left out of the output, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub country: String,
    pub reason: String,
}

impl fmt::Display for SkipRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.country, self.reason)
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub table: Table,
    pub skipped: Vec<SkipRecord>,
}

/// Cell-wise sum of equally shaped tables. Rows are matched by their first
/// column (age groups), which must agree label for label; the headers come
/// from the first table and every other column must be numeric.
pub fn sum_tables(tables: Vec<Table>) -> Result<Table, ScrapeError> {
    let mut iter = tables.into_iter();
    let mut acc = iter
        .next()
        .ok_or_else(|| ScrapeError::UnexpectedLayout("nothing to sum".into()))?;
    for t in iter {
        if t.num_rows() != acc.num_rows() || t.num_columns() != acc.num_columns() {
            return Err(ScrapeError::UnexpectedLayout(format!(
                "cannot sum a {}x{} table into a {}x{} table",
                t.num_rows(),
                t.num_columns(),
                acc.num_rows(),
                acc.num_columns()
            )));
        }
        for (acc_row, row) in acc.rows_mut().iter_mut().zip(t.rows()) {
            if acc_row[0] != row[0] {
                return Err(ScrapeError::UnexpectedLayout(format!(
                    "age groups differ: `{}` vs `{}`",
                    acc_row[0], row[0]
                )));
            }
            for (a, b) in acc_row.iter_mut().zip(row).skip(1) {
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => *a = Cell::Number(x + y),
                    _ => {
                        return Err(ScrapeError::UnexpectedLayout(format!(
                            "cannot sum non-numeric cells `{}` and `{}`",
                            a, b
                        )))
                    }
                }
            }
        }
    }
    Ok(acc)
}

/// Prefix the `Country` column and rename to [`OUTPUT_COLUMNS`].
pub fn tag_country(mut merged: Table, country: &str) -> Result<Table, ScrapeError> {
    let names = vec![Cell::from(country); merged.num_rows()];
    merged.insert_column(0, OUTPUT_COLUMNS[0], names)?;
    merged.rename_columns(&OUTPUT_COLUMNS)?;
    Ok(merged)
}

/// Dementia prevalence by country, joined with population counts.
pub struct Pipeline<S> {
    fetcher: Fetcher<S>,
    config: Config,
    site: Url,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(fetcher: Fetcher<S>, config: Config) -> Result<Self> {
        let site = config.alzheimer_base_url()?;
        Ok(Self {
            fetcher,
            config,
            site,
        })
    }

    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    /// Fetch the index page and read its sidebar.
    pub async fn load_catalog(&self) -> Result<Catalog> {
        let url = self.config.catalog_url()?;
        let doc = self
            .fetcher
            .fetch_document(&url)
            .await
            .with_context(|| format!("fetching country catalog {}", url))?;
        Ok(build_catalog(&doc))
    }

    /// Every country of the catalog. A failing country becomes a skip record;
    /// only an unreachable catalog fails the run.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self) -> Result<RunReport> {
        let catalog = self.load_catalog().await?;
        info!(entries = catalog.len(), "loaded catalog");

        let population = PopulationSource::new(
            &self.fetcher,
            self.config.population_base_url()?,
            self.config.reference_year,
            self.config.cache_dir(),
        );

        let mut table = Table::with_headers(OUTPUT_COLUMNS);
        let mut skipped = Vec::new();
        for plan in self.config.plans.plans(&catalog) {
            info!(country = %plan.country, "processing");
            match self.country(&catalog, &population, &plan).await {
                Ok(rows) => table.append(rows)?,
                Err(e) => {
                    let reason = format!("{:#}", e);
                    warn!(country = %plan.country, %reason, "skipping country");
                    skipped.push(SkipRecord {
                        country: plan.country.clone(),
                        reason,
                    });
                }
            }
        }

        info!(rows = table.num_rows(), skipped = skipped.len(), "run finished");
        Ok(RunReport { table, skipped })
    }

    async fn country(
        &self,
        catalog: &Catalog,
        population: &PopulationSource<'_, S>,
        plan: &CountryPlan,
    ) -> Result<Table> {
        let disease = match &plan.plan {
            FetchPlan::Single {
                table_index,
                allow_multiple,
            } => {
                let part = PagePart::new(&plan.country, *table_index);
                let tables = self.page_tables(catalog, &part).await?;
                if tables.len() > 1 && !allow_multiple {
                    return Err(ScrapeError::AmbiguousPage(tables.len()).into());
                }
                pick(tables, *table_index)?
            }
            FetchPlan::Union { parts } => {
                let mut tables = Vec::with_capacity(parts.len());
                for part in parts {
                    let page = self.page_tables(catalog, part).await?;
                    tables.push(
                        pick(page, part.table_index)
                            .with_context(|| format!("reading {}", part.entry))?,
                    );
                }
                sum_tables(tables)?
            }
        };

        let pop = population
            .load(&plan.country)
            .await
            .context("loading population table")?;
        let merged = merge(&disease, &pop)?;
        Ok(tag_country(merged, &plan.country)?)
    }

    /// All normalized tables on a catalog entry's detail page.
    async fn page_tables(&self, catalog: &Catalog, part: &PagePart) -> Result<Vec<Table>> {
        let path = catalog
            .get(&part.entry)
            .ok_or_else(|| ScrapeError::NotInCatalog(part.entry.clone()))?;
        let url = self
            .site
            .join(path)
            .with_context(|| format!("joining detail path {}", path))?;
        let doc = self.fetcher.fetch_document(&url).await?;
        Ok(extract_tables(&doc).into_iter().map(normalize).collect())
    }
}

fn pick(tables: Vec<Table>, index: usize) -> Result<Table, ScrapeError> {
    let found = tables.len();
    tables
        .into_iter()
        .nth(index)
        .ok_or(ScrapeError::MissingTable { index, found })
}
