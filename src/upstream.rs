//! Upstream npm registry and download-statistics client
//!
//! Four independent GET calls, each with its own timeout. How a 404 is
//! interpreted depends on the endpoint; the aggregator decides what is fatal.

mod models;

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;

pub use models::{
    DayDownloads, DistTags, PointDownloads, RangeDownloads, RegistryMetadata, SearchObject,
    SearchPackage, SearchResults, VersionManifest,
};

/// Failure of a single upstream call
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{what} not found upstream")]
    NotFound { what: String },
    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },
    #[error("{url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    fn from_reqwest(url: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Everything the aggregator needs from upstream.
///
/// Implemented over HTTP by [`UpstreamClient`]; tests substitute an in-memory source.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Package document. A 404 is [`UpstreamError::NotFound`].
    async fn fetch_registry_metadata(&self, package: &str)
    -> Result<RegistryMetadata, UpstreamError>;

    /// Trailing 7-day download count. A 404 means "no data" and yields `Ok(None)`.
    async fn fetch_weekly_downloads(
        &self,
        package: &str,
    ) -> Result<Option<PointDownloads>, UpstreamError>;

    /// Per-day downloads for a named period or `YYYY-MM-DD:YYYY-MM-DD`.
    /// A 404 is [`UpstreamError::NotFound`].
    async fn fetch_downloads_range(
        &self,
        package: &str,
        range: &str,
    ) -> Result<RangeDownloads, UpstreamError>;

    /// Packages maintained by `username`. Anything but 200 is an upstream failure.
    async fn search_by_maintainer(
        &self,
        username: &str,
        size: u32,
        from: u32,
    ) -> Result<SearchResults, UpstreamError>;
}

/// reqwest-backed registry client
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    registry: Url,
    downloads: Url,
    timeout: Duration,
    downloads_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        for base in [&config.registry_url, &config.downloads_url] {
            if base.cannot_be_a_base() {
                bail!("upstream url {base} cannot be used as a base");
            }
        }

        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("building upstream HTTP client")?;

        tracing::info!(
            registry = %config.registry_url,
            downloads = %config.downloads_url,
            timeout_secs = config.timeout_secs,
            downloads_timeout_secs = config.downloads_timeout_secs,
            "upstream client initialized"
        );

        Ok(Self {
            http,
            registry: config.registry_url.clone(),
            downloads: config.downloads_url.clone(),
            timeout: config.timeout(),
            downloads_timeout: config.downloads_timeout(),
        })
    }

    /// `{registry}/{name}`; a scoped name's `/` is sent as `%2F`
    pub fn metadata_url(&self, package: &str) -> Url {
        endpoint(&self.registry, [package])
    }

    pub fn weekly_downloads_url(&self, package: &str) -> Url {
        endpoint(
            &self.downloads,
            ["point", "last-week"].into_iter().chain(package.split('/')),
        )
    }

    pub fn downloads_range_url(&self, package: &str, range: &str) -> Url {
        endpoint(
            &self.downloads,
            ["range", range].into_iter().chain(package.split('/')),
        )
    }

    pub fn search_url(&self, username: &str, size: u32, from: u32) -> Url {
        let mut url = endpoint(&self.registry, ["-", "v1", "search"]);
        url.query_pairs_mut()
            .append_pair("text", &format!("maintainer:{username}"))
            .append_pair("size", &size.to_string())
            .append_pair("from", &from.to_string());
        url
    }

    async fn get(&self, url: &Url, timeout: Duration) -> Result<reqwest::Response, UpstreamError> {
        let started = Instant::now();
        let response = self
            .http
            .get(url.clone())
            .timeout(timeout)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| UpstreamError::from_reqwest(url, err))?;
        debug!(
            url = %url,
            status = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis(),
            "upstream responded"
        );
        Ok(response)
    }
}

#[async_trait]
impl RegistrySource for UpstreamClient {
    async fn fetch_registry_metadata(
        &self,
        package: &str,
    ) -> Result<RegistryMetadata, UpstreamError> {
        let url = self.metadata_url(package);
        let response = self.get(&url, self.timeout).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(UpstreamError::NotFound {
                what: format!("package {package}"),
            }),
            status if !status.is_success() => Err(status_error(&url, status)),
            _ => decode(&url, response).await,
        }
    }

    async fn fetch_weekly_downloads(
        &self,
        package: &str,
    ) -> Result<Option<PointDownloads>, UpstreamError> {
        let url = self.weekly_downloads_url(package);
        let response = self.get(&url, self.downloads_timeout).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if !status.is_success() => Err(status_error(&url, status)),
            _ => decode(&url, response).await.map(Some),
        }
    }

    async fn fetch_downloads_range(
        &self,
        package: &str,
        range: &str,
    ) -> Result<RangeDownloads, UpstreamError> {
        let url = self.downloads_range_url(package, range);
        let response = self.get(&url, self.timeout).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(UpstreamError::NotFound {
                what: format!("downloads for {package} over {range}"),
            }),
            status if !status.is_success() => Err(status_error(&url, status)),
            _ => decode(&url, response).await,
        }
    }

    async fn search_by_maintainer(
        &self,
        username: &str,
        size: u32,
        from: u32,
    ) -> Result<SearchResults, UpstreamError> {
        let url = self.search_url(username, size, from);
        let response = self.get(&url, self.timeout).await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(&url, response.status()));
        }
        decode(&url, response).await
    }
}

fn endpoint<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn status_error(url: &Url, status: StatusCode) -> UpstreamError {
    UpstreamError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    }
}

async fn decode<T: DeserializeOwned>(
    url: &Url,
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let body = response
        .bytes()
        .await
        .map_err(|err| UpstreamError::from_reqwest(url, err))?;
    serde_json::from_slice(&body).map_err(|source| UpstreamError::Decode {
        url: url.to_string(),
        source,
    })
}
