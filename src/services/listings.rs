use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Phrases the listings site uses when a search comes back empty
const NO_RESULTS_MARKERS: [&str; 2] = ["No results found", "did not match any homes"];

/// Errors that can occur when talking to the listings proxy
#[derive(Debug, Error)]
pub enum ListingsError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Proxy returned {status}")]
    Status { status: StatusCode },
}

/// Outcome of a listings lookup. Never an error from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ListingsLookup {
    /// The search page came back with content
    Found { bytes: usize },
    /// The search ran but matched no homes
    NoResults,
    /// The proxy could not be reached, timed out or returned an error
    Unavailable { reason: String },
}

/// Client for fetching the listings search page through a scraping proxy.
///
/// The proxy is called as `GET {proxy_url}?token=..&url=..`. The raw page is
/// not parsed; callers only learn whether homes were found.
pub struct ListingsClient {
    client: Client,
    proxy_url: String,
    token: String,
}

impl ListingsClient {
    pub fn new(proxy_url: String, token: String, timeout: Duration) -> Result<Self, ListingsError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            proxy_url,
            token,
        })
    }

    /// Fetch the search page for `search_url`, mapping every failure to
    /// [`ListingsLookup::Unavailable`]
    pub async fn lookup(&self, search_url: &str) -> ListingsLookup {
        match self.fetch(search_url).await {
            Ok(body) if NO_RESULTS_MARKERS.iter().any(|m| body.contains(m)) => ListingsLookup::NoResults,
            Ok(body) => ListingsLookup::Found { bytes: body.len() },
            Err(e) => {
                tracing::warn!("Listings lookup failed for {}: {}", search_url, e);
                ListingsLookup::Unavailable { reason: e.to_string() }
            }
        }
    }

    async fn fetch(&self, search_url: &str) -> Result<String, ListingsError> {
        let response = self
            .client
            .get(&self.proxy_url)
            .query(&[("token", self.token.as_str()), ("url", search_url)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ListingsError::Status { status });
        }

        Ok(response.text().await?)
    }
}
