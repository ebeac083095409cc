use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::item::Item;
use crate::models::config::{FeedConfig, SourceKind};

pub mod html;
pub mod rss;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("feedwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Build(String),
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to parse {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("invalid selector {0:?}")]
    Selector(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// A content source adapter producing [`Item`]s for a configured feed.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches every item currently published by `feed`.
    async fn fetch(&self, feed: &FeedConfig) -> FetchResult<Vec<Item>>;
}

pub fn build_reqwest_client() -> FetchResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Build(e.to_string()))
}

/// Fetches a URL and returns the response body.
async fn fetch_text(client: &reqwest::Client, url: &str) -> FetchResult<String> {
    let res = client.get(url).send().await.map_err(|e| FetchError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !res.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: res.status().as_u16(),
        });
    }
    res.text().await.map_err(|e| FetchError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Collapses runs of whitespace and trims the ends.
pub(crate) fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetcher that dispatches each feed to the HTTP adapter matching its kind.
pub struct HttpSourceFetcher {
    client: reqwest::Client,
}

impl HttpSourceFetcher {
    pub fn new() -> FetchResult<Self> {
        Ok(Self {
            client: build_reqwest_client()?,
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, feed: &FeedConfig) -> FetchResult<Vec<Item>> {
        let body = fetch_text(&self.client, &feed.url).await?;
        match feed.source_kind() {
            SourceKind::Rss => rss::parse_feed(&body, feed),
            SourceKind::Html => html::extract_items(&body, feed),
        }
    }
}
