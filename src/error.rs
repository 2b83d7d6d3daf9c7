use thiserror::Error;

/// Failures that end the processing of a single page or country.
///
/// None of these abort a run; the pipeline turns them into skip records.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed for {url} after {attempts} attempts: {reason}")]
    FetchFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("malformed table: {0}")]
    MalformedTable(String),

    #[error("ambiguous page: expected one table, found {0}")]
    AmbiguousPage(usize),

    #[error("no table at index {index} (page has {found})")]
    MissingTable { index: usize, found: usize },

    #[error("not in catalog: {0}")]
    NotInCatalog(String),

    #[error("unexpected layout: {0}")]
    UnexpectedLayout(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
