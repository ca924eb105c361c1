//! Projection of raw upstream payloads into response shapes

use crate::upstream::{PointDownloads, RangeDownloads, RegistryMetadata, SearchResults};

use super::request::PackageQuery;
use super::types::{DownloadPoint, LatestMeta, PackageSummary, UserPackageEntry, UserPackages};

/// How many trailing versions `include_versions` returns
pub const RECENT_VERSIONS: usize = 20;

pub fn package_summary(
    query: &PackageQuery,
    metadata: RegistryMetadata,
    weekly: Option<PointDownloads>,
) -> PackageSummary {
    let latest = metadata.latest_tag().map(str::to_owned);
    let manifest = latest
        .as_deref()
        .map(|version| metadata.manifest(version))
        .unwrap_or_default();

    let versions = query
        .include_versions
        .then(|| recent_versions(&metadata, RECENT_VERSIONS));

    let readme = query
        .include_readme
        .then(|| metadata.readme.clone().unwrap_or_default());

    PackageSummary {
        name: metadata.name,
        description: metadata.description,
        homepage: metadata.homepage,
        repository: metadata.repository,
        latest,
        latest_meta: LatestMeta {
            version: manifest.version,
            license: manifest.license,
            dependencies: manifest.dependencies,
            dist: manifest.dist,
        },
        downloads_last_week: weekly.and_then(|point| point.downloads),
        versions,
        readme,
    }
}

/// The last `limit` version keys, in the order the registry listed them.
pub fn recent_versions(metadata: &RegistryMetadata, limit: usize) -> Vec<String> {
    let skip = metadata.versions.len().saturating_sub(limit);
    metadata.versions.keys().skip(skip).cloned().collect()
}

pub fn user_packages(username: &str, results: SearchResults) -> UserPackages {
    let packages = results
        .objects
        .into_iter()
        .map(|object| {
            let package = object.package;
            UserPackageEntry {
                name: package.name,
                version: package.version,
                description: package.description,
                date: package.date,
                links: package.links,
            }
        })
        .collect();

    UserPackages {
        username: username.to_string(),
        count: results.total.unwrap_or(0),
        packages,
    }
}

pub fn download_points(range: RangeDownloads) -> Vec<DownloadPoint> {
    range
        .downloads
        .into_iter()
        .map(|day| DownloadPoint {
            date: day.day,
            downloads: day.downloads,
        })
        .collect()
}
