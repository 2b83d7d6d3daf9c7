// src/fetch/mod.rs

pub mod retry;

#[cfg(test)]
pub(crate) mod memory;

pub use retry::RetryPolicy;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use scraper::Html;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::ScrapeError;

/// Anything that can hand back the raw body of a URL in one attempt.
pub trait PageSource {
    fn get_bytes<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// Plain HTTP GET with a fixed user-agent.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn get_bytes<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            debug!("Fetching {}", url);
            let bytes = self
                .client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("GET {} failed", url))?
                .error_for_status()
                .with_context(|| format!("Non-success status {}", url))?
                .bytes()
                .await
                .with_context(|| format!("Reading body from {}", url))?;
            Ok(bytes.to_vec())
        }
        .boxed()
    }
}

/// Pages are decoded as ISO-8859-1 whatever they claim to be; every byte maps
/// to the code point of the same value, so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// A [`PageSource`] with a retry policy wrapped around it.
pub struct Fetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Raw body, retried up to the policy's attempt ceiling.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, ScrapeError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.source.get_bytes(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.policy.max_attempts => {
                    warn!(%url, attempt, delay_ms = self.policy.delay_ms, error = %e, "Retrying");
                    sleep(self.policy.delay()).await;
                }
                Err(e) => {
                    error!(%url, attempts = attempt, error = %e, "Exhausted retries");
                    return Err(ScrapeError::FetchFailed {
                        url: url.to_string(),
                        attempts: attempt,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }
    }

    /// Body decoded to a `String`.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, ScrapeError> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(decode_latin1(&bytes))
    }

    /// Body parsed as an HTML document.
    pub async fn fetch_document(&self, url: &Url) -> Result<Html, ScrapeError> {
        let text = self.fetch_text(url).await?;
        Ok(Html::parse_document(&text))
    }
}
