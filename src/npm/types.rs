//! Public response shapes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// `GET /api/package/{name}` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub name: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub repository: Option<JsonValue>,
    pub latest: Option<String>,
    pub latest_meta: LatestMeta,
    /// `null` whenever weekly statistics are unavailable
    pub downloads_last_week: Option<u64>,
    /// Last 20 versions in registry order; present only when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<String>>,
    /// Raw README text; present only when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestMeta {
    pub version: Option<String>,
    pub license: Option<JsonValue>,
    pub dependencies: Map<String, JsonValue>,
    pub dist: Map<String, JsonValue>,
}

/// `GET /api/user/{username}` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPackages {
    pub username: String,
    pub count: u64,
    pub packages: Vec<UserPackageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPackageEntry {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub links: Option<Map<String, JsonValue>>,
}

/// One element of the chart array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPoint {
    pub date: NaiveDate,
    pub downloads: u64,
}
