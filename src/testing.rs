//! In-memory [`RegistrySource`] shared by the aggregator and proxy tests

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use npm_info_adapter::{ManualClock, ResponseCache};
use parking_lot::Mutex;
use serde_json::{Value as JsonValue, json};

use crate::npm::{NpmAggregator, ResponseStore};
use crate::upstream::{
    PointDownloads, RangeDownloads, RegistryMetadata, RegistrySource, SearchResults,
    UpstreamError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    Metadata,
    Weekly,
    Range,
    Search,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    Status(u16),
    Timeout,
}

impl Fault {
    fn into_error(self, endpoint: Endpoint) -> UpstreamError {
        let url = format!("fake://{endpoint:?}");
        match self {
            Fault::Status(status) => UpstreamError::Status { url, status },
            Fault::Timeout => UpstreamError::Timeout { url },
        }
    }
}

/// Canned registry. Unknown packages 404 the way the real endpoints do.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    metadata: Mutex<HashMap<String, JsonValue>>,
    weekly: Mutex<HashMap<String, u64>>,
    ranges: Mutex<HashMap<(String, String), JsonValue>>,
    searches: Mutex<HashMap<String, JsonValue>>,
    faults: Mutex<HashMap<Endpoint, Fault>>,
    calls: Mutex<HashMap<Endpoint, usize>>,
    last_search: Mutex<Option<(String, u32, u32)>>,
}

impl FakeRegistry {
    pub(crate) fn with_package(self, name: &str, document: JsonValue) -> Self {
        self.metadata.lock().insert(name.to_string(), document);
        self
    }

    pub(crate) fn with_weekly(self, name: &str, downloads: u64) -> Self {
        self.weekly.lock().insert(name.to_string(), downloads);
        self
    }

    pub(crate) fn with_range(self, name: &str, range: &str, document: JsonValue) -> Self {
        self.ranges
            .lock()
            .insert((name.to_string(), range.to_string()), document);
        self
    }

    pub(crate) fn with_search(self, username: &str, document: JsonValue) -> Self {
        self.searches.lock().insert(username.to_string(), document);
        self
    }

    pub(crate) fn failing(self, endpoint: Endpoint, fault: Fault) -> Self {
        self.fail(endpoint, fault);
        self
    }

    pub(crate) fn fail(&self, endpoint: Endpoint, fault: Fault) {
        self.faults.lock().insert(endpoint, fault);
    }

    pub(crate) fn recover(&self, endpoint: Endpoint) {
        self.faults.lock().remove(&endpoint);
    }

    pub(crate) fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls.lock().get(&endpoint).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub(crate) fn last_search(&self) -> Option<(String, u32, u32)> {
        self.last_search.lock().clone()
    }

    fn record(&self, endpoint: Endpoint) -> Result<(), UpstreamError> {
        *self.calls.lock().entry(endpoint).or_default() += 1;
        match self.faults.lock().get(&endpoint) {
            Some(fault) => Err(fault.into_error(endpoint)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RegistrySource for FakeRegistry {
    async fn fetch_registry_metadata(
        &self,
        package: &str,
    ) -> Result<RegistryMetadata, UpstreamError> {
        self.record(Endpoint::Metadata)?;
        let document = self
            .metadata
            .lock()
            .get(package)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound {
                what: format!("package {package}"),
            })?;
        Ok(serde_json::from_value(document).unwrap_or_default())
    }

    async fn fetch_weekly_downloads(
        &self,
        package: &str,
    ) -> Result<Option<PointDownloads>, UpstreamError> {
        self.record(Endpoint::Weekly)?;
        Ok(self.weekly.lock().get(package).map(|&downloads| PointDownloads {
            downloads: Some(downloads),
            package: Some(package.to_string()),
            ..PointDownloads::default()
        }))
    }

    async fn fetch_downloads_range(
        &self,
        package: &str,
        range: &str,
    ) -> Result<RangeDownloads, UpstreamError> {
        self.record(Endpoint::Range)?;
        let document = self
            .ranges
            .lock()
            .get(&(package.to_string(), range.to_string()))
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound {
                what: format!("downloads for {package} over {range}"),
            })?;
        Ok(serde_json::from_value(document).unwrap_or_default())
    }

    async fn search_by_maintainer(
        &self,
        username: &str,
        size: u32,
        from: u32,
    ) -> Result<SearchResults, UpstreamError> {
        self.record(Endpoint::Search)?;
        *self.last_search.lock() = Some((username.to_string(), size, from));
        let document = self
            .searches
            .lock()
            .get(username)
            .cloned()
            .unwrap_or_else(|| json!({ "objects": [], "total": 0 }));
        Ok(serde_json::from_value(document).unwrap_or_default())
    }
}

pub(crate) fn left_pad_document() -> JsonValue {
    json!({
        "name": "left-pad",
        "description": "String left pad",
        "homepage": "https://github.com/stevemao/left-pad#readme",
        "repository": { "type": "git", "url": "git+https://github.com/stevemao/left-pad.git" },
        "dist-tags": { "latest": "1.3.0" },
        "versions": {
            "1.2.0": { "version": "1.2.0", "license": "WTFPL" },
            "1.3.0": {
                "version": "1.3.0",
                "license": "MIT",
                "dependencies": {},
                "dist": {
                    "shasum": "5b8a3a7765dfe001261dde915589e782f8c94d1e",
                    "tarball": "https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz"
                }
            }
        },
        "readme": "# left-pad\n"
    })
}

/// Registry preloaded with `left-pad` and its weekly count.
pub(crate) fn left_pad_registry() -> FakeRegistry {
    FakeRegistry::default()
        .with_package("left-pad", left_pad_document())
        .with_weekly("left-pad", 500_000)
}

pub(crate) const TEST_TTL: Duration = Duration::from_secs(60);

pub(crate) struct Harness {
    pub(crate) registry: Arc<FakeRegistry>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) cache: Arc<ResponseStore>,
    pub(crate) aggregator: NpmAggregator,
}

impl Harness {
    pub(crate) fn new(registry: FakeRegistry) -> Self {
        let registry = Arc::new(registry);
        let clock = Arc::new(ManualClock::default());
        let cache: Arc<ResponseStore> =
            Arc::new(ResponseCache::with_clock(TEST_TTL, clock.clone()));
        let aggregator = NpmAggregator::new(cache.clone(), registry.clone());
        Self {
            registry,
            clock,
            cache,
            aggregator,
        }
    }
}
