// src/covid.rs

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use url::Url;

use crate::config::CovidConfig;
use crate::csv_file;
use crate::fetch::{Fetcher, PageSource};
use crate::table::{extract_tables, normalize};

/// Parse a 4-digit `MMDD` argument into a calendar day of `year`.
pub fn parse_day(mmdd: &str, year: i32) -> Result<NaiveDate> {
    if mmdd.len() != 4 || !mmdd.chars().all(|c| c.is_ascii_digit()) {
        bail!("date must be 4 digits MMDD, got `{}`", mmdd);
    }
    let month: u32 = mmdd[0..2].parse()?;
    let day: u32 = mmdd[2..4].parse()?;
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("`{}` is not a valid day of {}", mmdd, year))
}

/// Archived snapshot of the source page as of `day`.
pub fn snapshot_url(config: &CovidConfig, day: NaiveDate) -> Result<Url> {
    let raw = format!(
        "{}{}/{}",
        config.archive_base,
        day.format("%Y%m%d"),
        config.source_url
    );
    Url::parse(&raw).with_context(|| format!("parsing snapshot URL {}", raw))
}

/// Fetch `url` and write each table on it to `<out_dir>/<title>_<idx>.csv`.
#[instrument(level = "info", skip(fetcher, out_dir), fields(url = %url))]
pub async fn export_tables<S: PageSource>(
    fetcher: &Fetcher<S>,
    url: &Url,
    out_dir: &Path,
    title: &str,
) -> Result<Vec<PathBuf>> {
    let tables: Vec<_> = {
        let doc = fetcher
            .fetch_document(url)
            .await
            .with_context(|| format!("fetching {}", url))?;
        extract_tables(&doc).into_iter().map(normalize).collect()
    };

    let mut written = Vec::with_capacity(tables.len());
    for (idx, table) in tables.iter().enumerate() {
        let path = out_dir.join(format!("{}_{}.csv", title, idx));
        csv_file::write_table(&path, table)?;
        written.push(path);
    }
    info!(tables = written.len(), "exported tables");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::memory::MemorySource;
    use crate::fetch::RetryPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day("0415", 2020).unwrap(),
            NaiveDate::from_ymd_opt(2020, 4, 15).unwrap()
        );
        assert!(parse_day("0229", 2020).is_ok());
        assert!(parse_day("0229", 2021).is_err());
        assert!(parse_day("1301", 2020).is_err());
        assert!(parse_day("415", 2020).is_err());
        assert!(parse_day("04-1", 2020).is_err());
    }

    #[test]
    fn test_snapshot_url() {
        let day = NaiveDate::from_ymd_opt(2020, 3, 7).unwrap();
        let url = snapshot_url(&CovidConfig::default(), day).unwrap();
        assert_eq!(
            url.as_str(),
            "https://web.archive.org/web/20200307/https://www.worldometers.info/coronavirus/"
        );
    }

    #[tokio::test]
    async fn test_export_tables() {
        let tmp = tempdir().unwrap();
        let url = Url::parse("https://covid.example/").unwrap();
        let page = "<table>\
              <tr><th>Country</th><th>Total Cases</th></tr>\
              <tr><td>Italy</td><td>5,883</td></tr>\
              <tr><td>Spain</td><td>500</td></tr>\
            </table>\
            <table><tr><td>lonely</td></tr></table>";
        let fetcher = Fetcher::new(
            MemorySource::new().with_page(url.as_str(), page),
            RetryPolicy::once(),
        );
        let written = export_tables(&fetcher, &url, tmp.path(), "0307").await.unwrap();
        assert_eq!(written, vec![tmp.path().join("0307_0.csv")]);
        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(text, "Country,Total Cases\nItaly,5883\nSpain,500\n");
    }
}
