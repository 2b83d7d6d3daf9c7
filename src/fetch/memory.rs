// In-memory PageSource for tests.

use anyhow::{anyhow, Result};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

use super::PageSource;

#[derive(Default)]
pub struct MemorySource {
    pages: HashMap<String, Vec<u8>>,
    failures: Mutex<HashMap<String, u32>>,
    requests: Mutex<HashMap<String, u32>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    /// Fail the next `times` requests for `url` before serving it.
    pub fn failing(self, url: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    pub fn requests(&self, url: &str) -> u32 {
        self.requests.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl PageSource for MemorySource {
    fn get_bytes<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>>> {
        let key = url.as_str();
        *self.requests.lock().unwrap().entry(key.to_string()).or_default() += 1;

        let mut failures = self.failures.lock().unwrap();
        if let Some(left) = failures.get_mut(key).filter(|n| **n > 0) {
            *left -= 1;
            return future::ready(Err(anyhow!("simulated failure for {}", key))).boxed();
        }
        let res = self
            .pages
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("404 for {}", key));
        future::ready(res).boxed()
    }
}
