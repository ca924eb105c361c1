//! npm package aggregation
//!
//! Turns the three public queries (package summary, maintainer listing,
//! download chart) into cached JSON bodies built from upstream registry data.

mod aggregate;
mod request;
mod shape;
mod types;

pub use aggregate::{
    AggregateError, Aggregated, CacheOutcome, NpmAggregator, ResponseStore, best_effort,
};
pub use request::{
    CacheKey, CacheKeyed, ChartQuery, DEFAULT_CHART_RANGE, DEFAULT_PAGE_SIZE, PackageQuery,
    UserQuery,
};
pub use shape::RECENT_VERSIONS;
pub use types::{DownloadPoint, LatestMeta, PackageSummary, UserPackageEntry, UserPackages};
