// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

use crate::fetch::RetryPolicy;
use crate::plan::PlanTable;

/// Run settings. Every field has a default, so a config file only needs the
/// keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: String,
    pub retry: RetryPolicy,
    /// Site hosting the country detail pages; catalog paths are joined onto it.
    pub alzheimer_base: String,
    /// Page whose sidebar lists every country.
    pub catalog_url: String,
    pub population_base: String,
    pub reference_year: u32,
    /// Defaults to `<reference_year>_pop`.
    pub cache_dir: Option<PathBuf>,
    pub output: PathBuf,
    pub plans: PlanTable,
    pub covid: CovidConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CovidConfig {
    /// Prefix of archived snapshots; the `YYYYMMDD` stamp and source URL follow it.
    pub archive_base: String,
    pub source_url: String,
    pub year: i32,
}

impl Default for CovidConfig {
    fn default() -> Self {
        Self {
            archive_base: "https://web.archive.org/web/".into(),
            source_url: "https://www.worldometers.info/coronavirus/".into(),
            year: 2020,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".into(),
            retry: RetryPolicy::default(),
            alzheimer_base: "https://www.alzheimer-europe.org".into(),
            catalog_url: "https://www.alzheimer-europe.org/Policy/Country-comparisons/2013-The-prevalence-of-dementia-in-Europe/United-Kingdom-Scotland".into(),
            population_base: "https://www.populationpyramid.net".into(),
            reference_year: 2013,
            cache_dir: None,
            output: PathBuf::from("output_BCG.csv"),
            plans: PlanTable::default(),
            covid: CovidConfig::default(),
        }
    }
}

impl Config {
    /// Load from a YAML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}_pop", self.reference_year)))
    }

    pub fn alzheimer_base_url(&self) -> Result<Url> {
        Url::parse(&self.alzheimer_base)
            .with_context(|| format!("parsing alzheimer_base {}", self.alzheimer_base))
    }

    pub fn catalog_url(&self) -> Result<Url> {
        Url::parse(&self.catalog_url)
            .with_context(|| format!("parsing catalog_url {}", self.catalog_url))
    }

    pub fn population_base_url(&self) -> Result<Url> {
        Url::parse(&self.population_base)
            .with_context(|| format!("parsing population_base {}", self.population_base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let c = Config::load(None).unwrap();
        assert_eq!(c.cache_dir(), PathBuf::from("2013_pop"));
        assert_eq!(c.retry.max_attempts, 30);
        assert!(c.catalog_url().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(
            f,
            "reference_year: 2019\nretry:\n  delay_ms: 1500\noutput: out.csv"
        )
        .unwrap();
        let c = Config::load(Some(f.path())).unwrap();
        assert_eq!(c.reference_year, 2019);
        assert_eq!(c.cache_dir(), PathBuf::from("2019_pop"));
        assert_eq!(c.retry.delay(), Duration::from_millis(1500));
        assert_eq!(c.retry.max_attempts, 30);
        assert_eq!(c.output, PathBuf::from("out.csv"));
        assert_eq!(c.plans, PlanTable::default());
    }

    #[test]
    fn test_bad_file_is_error() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "retry: [1, 2").unwrap();
        assert!(Config::load(Some(f.path())).is_err());
    }
}
