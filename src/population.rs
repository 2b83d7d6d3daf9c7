// src/population.rs

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

use crate::csv_file;
use crate::fetch::{Fetcher, PageSource};
use crate::table::ages::{POP_FEMALE_COLUMN, POP_MALE_COLUMN};
use crate::table::Table;

static SCRIPT_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/javascript"]"#)
        .expect("CSS selector for scripts should be valid")
});
static COUNTRY_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"countryId = ([0-9]+);").expect("valid regex"));

/// URL path segment for a country: lower-cased, spaces to hyphens.
pub fn country_slug(country: &str) -> String {
    country.to_lowercase().replace(' ', "-")
}

/// Numeric country id embedded in the population page's inline script.
pub fn find_country_id(doc: &Html) -> Option<String> {
    doc.select(&SCRIPT_SEL).find_map(|script| {
        let text: String = script.text().collect();
        COUNTRY_ID_RE.captures(&text).map(|c| c[1].to_string())
    })
}

/// A downloaded body must parse as `Age, M, F` with numeric counts before it
/// is cached.
fn check_population_csv(bytes: &[u8]) -> Result<()> {
    let table = csv_file::parse_table(bytes)?;
    if table.num_columns() <= POP_FEMALE_COLUMN {
        bail!("expected age, male and female columns, got {:?}", table.headers());
    }
    if table.num_rows() < 2 {
        bail!("expected at least 2 age groups, got {}", table.num_rows());
    }
    for col in [POP_MALE_COLUMN, POP_FEMALE_COLUMN] {
        if let Some(bad) = table.column(col).find(|c| c.as_f64().is_none()) {
            bail!("non-numeric count `{}` in column {}", bad, table.headers()[col]);
        }
    }
    Ok(())
}

/// Population-by-age tables for one reference year, cached on disk per country.
///
/// A cached file is reused as-is; otherwise it is downloaded first.
pub struct PopulationSource<'a, S> {
    fetcher: &'a Fetcher<S>,
    base: Url,
    year: u32,
    cache_dir: PathBuf,
}

impl<'a, S: PageSource> PopulationSource<'a, S> {
    pub fn new(fetcher: &'a Fetcher<S>, base: Url, year: u32, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            base,
            year,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_path(&self, country: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.csv", country))
    }

    /// Columns are `Age, M, F`, numbers already coerced.
    #[instrument(level = "debug", skip(self))]
    pub async fn load(&self, country: &str) -> Result<Table> {
        let path = self.cache_path(country);
        if fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "population cache hit");
        } else {
            self.download(country, &path).await?;
        }
        csv_file::read_table(&path)
    }

    async fn download(&self, country: &str, dest: &Path) -> Result<()> {
        let page_url = self
            .base
            .join(&format!("{}/{}/", country_slug(country), self.year))
            .with_context(|| format!("building population page URL for {}", country))?;
        let id = {
            let doc = self.fetcher.fetch_document(&page_url).await?;
            find_country_id(&doc)
        }
        .ok_or_else(|| anyhow!("no countryId on population page {}", page_url))?;

        let csv_url = self
            .base
            .join(&format!("api/pp/{}/{}/?csv=true", id, self.year))
            .with_context(|| format!("building population CSV URL for {}", country))?;
        let bytes = self.fetcher.fetch_bytes(&csv_url).await?;
        check_population_csv(&bytes).with_context(|| format!("population CSV from {}", csv_url))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating cache directory {:?}", parent))?;
        }
        // Only whole files ever appear under the cache name.
        let tmp = dest.with_extension("csv.tmp");
        fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("writing population cache {:?}", tmp))?;
        if let Err(e) = fs::rename(&tmp, dest).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("moving {:?} to {:?}", tmp, dest));
        }
        info!(country, id = %id, path = %dest.display(), "cached population table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::memory::MemorySource;
    use crate::fetch::RetryPolicy;
    use crate::table::Cell;
    use tempfile::tempdir;

    const PAGE: &str = r#"<html><head>
        <script type="text/javascript">var x = 1;</script>
        <script type="application/javascript">var countryId = 826; var year = 2013;</script>
        </head><body></body></html>"#;
    const CSV: &str = "Age,M,F\n0-4,1000,950\n5-9,1100,1000\n100+,3,9\n";

    fn base() -> Url {
        Url::parse("https://pop.example/").unwrap()
    }

    #[test]
    fn test_slug_and_id() {
        assert_eq!(country_slug("United Kingdom"), "united-kingdom");
        assert_eq!(find_country_id(&Html::parse_document(PAGE)).as_deref(), Some("826"));
        assert_eq!(find_country_id(&Html::parse_document("<p></p>")), None);
    }

    #[tokio::test]
    async fn test_downloads_then_reuses_cache() {
        let tmp = tempdir().unwrap();
        let page = "https://pop.example/united-kingdom/2013/";
        let csv = "https://pop.example/api/pp/826/2013/?csv=true";
        let source = MemorySource::new().with_page(page, PAGE).with_page(csv, CSV);
        let fetcher = Fetcher::new(source, RetryPolicy::once());
        let pop = PopulationSource::new(&fetcher, base(), 2013, tmp.path().join("2013_pop"));

        let t = pop.load("United Kingdom").await.unwrap();
        assert_eq!(t.headers(), &["Age", "M", "F"]);
        assert_eq!(t.rows()[1][1], Cell::Number(1100.0));
        assert!(pop.cache_path("United Kingdom").is_file());

        let again = pop.load("United Kingdom").await.unwrap();
        assert_eq!(again, t);
        assert_eq!(fetcher.source().requests(csv), 1);
    }

    #[tokio::test]
    async fn test_existing_cache_skips_network() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("Malta.csv"), CSV).unwrap();
        let fetcher = Fetcher::new(MemorySource::new(), RetryPolicy::once());
        let pop = PopulationSource::new(&fetcher, base(), 2013, tmp.path());
        assert_eq!(pop.load("Malta").await.unwrap().num_rows(), 3);
    }

    #[tokio::test]
    async fn test_bad_download_is_not_cached() {
        let tmp = tempdir().unwrap();
        let page = "https://pop.example/malta/2013/";
        let csv = "https://pop.example/api/pp/826/2013/?csv=true";
        let source = MemorySource::new()
            .with_page(page, PAGE)
            .with_page(csv, "<html><body>Rate limited</body></html>");
        let fetcher = Fetcher::new(source, RetryPolicy::once());
        let pop = PopulationSource::new(&fetcher, base(), 2013, tmp.path());

        assert!(pop.load("Malta").await.is_err());
        let cached = pop.cache_path("Malta");
        assert!(!cached.exists());
        assert!(!cached.with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_check_population_csv() {
        assert!(check_population_csv(CSV.as_bytes()).is_ok());
        assert!(check_population_csv(b"Age,M\n0-4,1\n5-9,2\n").is_err());
        assert!(check_population_csv(b"Age,M,F\n0-4,1,2\n").is_err());
        assert!(check_population_csv(b"Age,M,F\n0-4,1,2\n5-9,n/a,3\n").is_err());
    }

    #[tokio::test]
    async fn test_missing_id_is_error() {
        let tmp = tempdir().unwrap();
        let source = MemorySource::new().with_page("https://pop.example/malta/2013/", "<p></p>");
        let fetcher = Fetcher::new(source, RetryPolicy::once());
        let pop = PopulationSource::new(&fetcher, base(), 2013, tmp.path());
        assert!(pop.load("Malta").await.is_err());
        assert!(!pop.cache_path("Malta").exists());
    }
}
