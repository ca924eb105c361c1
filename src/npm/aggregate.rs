use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use npm_info_adapter::ResponseCache;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::upstream::{RegistrySource, UpstreamError};

use super::request::{CacheKey, CacheKeyed, ChartQuery, PackageQuery, UserQuery};
use super::shape;

/// Serialized response bodies keyed by [`CacheKey`]
pub type ResponseStore = ResponseCache<Bytes>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// A JSON body ready to send, and whether it came from the cache
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub body: Bytes,
    pub outcome: CacheOutcome,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Upstream(UpstreamError),
    #[error("encoding response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<UpstreamError> for AggregateError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound { what } => Self::NotFound(what),
            other => Self::Upstream(other),
        }
    }
}

/// Read-through aggregation over the registry.
///
/// Every public method builds its key, answers from the cache when it can,
/// and otherwise fetches, shapes, stores and returns. Errors are never stored.
#[derive(Clone)]
pub struct NpmAggregator {
    cache: Arc<ResponseStore>,
    source: Arc<dyn RegistrySource>,
}

impl NpmAggregator {
    pub fn new(cache: Arc<ResponseStore>, source: Arc<dyn RegistrySource>) -> Self {
        Self { cache, source }
    }

    /// Package summary with best-effort weekly downloads.
    ///
    /// Metadata and weekly downloads are requested concurrently. Only the
    /// metadata call can fail the request.
    pub async fn package_info(&self, query: &PackageQuery) -> Result<Aggregated, AggregateError> {
        self.read_through(query.cache_key(), move || async move {
            let (metadata, weekly) = tokio::join!(
                self.source.fetch_registry_metadata(&query.name),
                best_effort(
                    "weekly downloads",
                    &query.name,
                    self.source.fetch_weekly_downloads(&query.name),
                ),
            );
            let summary = shape::package_summary(query, metadata?, weekly);
            encode(&summary)
        })
        .await
    }

    pub async fn user_packages(&self, query: &UserQuery) -> Result<Aggregated, AggregateError> {
        self.read_through(query.cache_key(), move || async move {
            let results = self
                .source
                .search_by_maintainer(&query.username, query.size, query.from)
                .await?;
            encode(&shape::user_packages(&query.username, results))
        })
        .await
    }

    /// Bare JSON array of `{date, downloads}`; no fallback when upstream has nothing.
    pub async fn downloads_chart(&self, query: &ChartQuery) -> Result<Aggregated, AggregateError> {
        self.read_through(query.cache_key(), move || async move {
            let range = self
                .source
                .fetch_downloads_range(&query.package, &query.range)
                .await?;
            encode(&shape::download_points(range))
        })
        .await
    }

    async fn read_through<F, Fut>(
        &self,
        key: CacheKey,
        fill: F,
    ) -> Result<Aggregated, AggregateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, AggregateError>>,
    {
        if let Some(body) = self.cache.get(key.as_str()) {
            debug!(%key, "served from cache");
            return Ok(Aggregated {
                body,
                outcome: CacheOutcome::Hit,
            });
        }

        let body = fill().await?;
        self.cache.set(key, body.clone());
        Ok(Aggregated {
            body,
            outcome: CacheOutcome::Miss,
        })
    }
}

/// Policy for optional augmenting calls: any failure is logged and becomes `None`.
pub async fn best_effort<T, Fut>(what: &str, package: &str, call: Fut) -> Option<T>
where
    Fut: Future<Output = Result<Option<T>, UpstreamError>>,
{
    match call.await {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, package, "{what} unavailable, continuing without it");
            None
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Bytes, AggregateError> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}
