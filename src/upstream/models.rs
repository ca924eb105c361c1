//! Raw upstream payloads
//!
//! Registry documents are loosely structured, so almost every field decodes
//! leniently: a missing, null or oddly-typed value becomes the field default
//! instead of failing the whole document.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value as JsonValue};

/// Decodes `T`, falling back to `T::default()` when the value has the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decodes a list element by element, so one malformed entry becomes
/// `T::default()` in place instead of emptying the whole list.
pub(crate) fn lenient_each<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let items = match JsonValue::deserialize(deserializer)? {
        JsonValue::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// Package document from `GET {registry}/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub homepage: Option<String>,
    /// Either a URL string or `{ type, url, directory }`; passed through untouched
    #[serde(default)]
    pub repository: Option<JsonValue>,
    #[serde(rename = "dist-tags", default, deserialize_with = "lenient")]
    pub dist_tags: Option<DistTags>,
    /// Version manifests keyed by version, in the order the registry sent them
    #[serde(default, deserialize_with = "lenient")]
    pub versions: Map<String, JsonValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub readme: Option<String>,
}

impl RegistryMetadata {
    pub fn latest_tag(&self) -> Option<&str> {
        self.dist_tags.as_ref()?.latest.as_deref()
    }

    /// Manifest for `version`, or an empty manifest when the registry has none.
    pub fn manifest(&self, version: &str) -> VersionManifest {
        self.versions
            .get(version)
            .cloned()
            .and_then(|raw| serde_json::from_value(raw).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistTags {
    #[serde(default, deserialize_with = "lenient")]
    pub latest: Option<String>,
}

/// The subset of a version manifest the summary exposes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionManifest {
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
    /// SPDX string, or the legacy `{ type, url }` object
    #[serde(default)]
    pub license: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub dependencies: Map<String, JsonValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub dist: Map<String, JsonValue>,
}

/// `GET {downloads}/point/last-week/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointDownloads {
    #[serde(default, deserialize_with = "lenient")]
    pub downloads: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub package: Option<String>,
}

/// `GET {downloads}/range/{range}/{name}`
///
/// Day records decode strictly; a chart with a malformed day is an upstream fault.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeDownloads {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub downloads: Vec<DayDownloads>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayDownloads {
    pub day: NaiveDate,
    pub downloads: u64,
}

/// `GET {registry}/-/v1/search?text=maintainer:{user}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default, deserialize_with = "lenient_each")]
    pub objects: Vec<SearchObject>,
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchObject {
    #[serde(default, deserialize_with = "lenient")]
    pub package: SearchPackage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPackage {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub links: Option<Map<String, JsonValue>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_metadata_keeps_version_order() {
        let raw = json!({
            "name": "demo",
            "versions": { "1.0.0": {}, "0.9.0": {}, "2.0.0-beta": {}, "1.1.0": {} }
        });
        let meta: RegistryMetadata = serde_json::from_value(raw).unwrap();
        let keys: Vec<&str> = meta.versions.keys().map(String::as_str).collect();
        assert_eq!(keys, ["1.0.0", "0.9.0", "2.0.0-beta", "1.1.0"]);
    }

    #[test]
    fn registry_metadata_tolerates_odd_shapes() {
        let raw = json!({
            "name": "demo",
            "description": 42,
            "homepage": null,
            "dist-tags": "oops",
            "versions": [],
            "readme": { "not": "text" }
        });
        let meta: RegistryMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(meta.name.as_deref(), Some("demo"));
        assert!(meta.description.is_none());
        assert!(meta.homepage.is_none());
        assert!(meta.latest_tag().is_none());
        assert!(meta.versions.is_empty());
        assert!(meta.readme.is_none());
    }

    #[test]
    fn latest_tag_reads_dist_tags() {
        let raw = json!({ "dist-tags": { "latest": "1.3.0", "next": "2.0.0" } });
        let meta: RegistryMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(meta.latest_tag(), Some("1.3.0"));
    }

    #[test]
    fn manifest_for_missing_version_is_empty() {
        let meta = RegistryMetadata::default();
        let manifest = meta.manifest("1.0.0");
        assert!(manifest.version.is_none());
        assert!(manifest.license.is_none());
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.dist.is_empty());
    }

    #[test]
    fn manifest_keeps_license_object() {
        let raw = json!({
            "versions": {
                "0.1.0": {
                    "version": "0.1.0",
                    "license": { "type": "BSD", "url": "https://example.com" },
                    "dependencies": { "b": "^1", "a": "^2" }
                }
            }
        });
        let meta: RegistryMetadata = serde_json::from_value(raw).unwrap();
        let manifest = meta.manifest("0.1.0");
        assert_eq!(manifest.license.unwrap()["type"], "BSD");
        let deps: Vec<&str> = manifest.dependencies.keys().map(String::as_str).collect();
        assert_eq!(deps, ["b", "a"]);
    }

    #[test]
    fn range_downloads_parse_days() {
        let raw = json!({
            "start": "2024-01-01",
            "end": "2024-01-02",
            "package": "left-pad",
            "downloads": [
                { "day": "2024-01-01", "downloads": 10 },
                { "day": "2024-01-02", "downloads": 0 }
            ]
        });
        let range: RangeDownloads = serde_json::from_value(raw).unwrap();
        assert_eq!(range.downloads.len(), 2);
        assert_eq!(
            range.downloads[0].day,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn range_downloads_reject_bad_day() {
        let raw = json!({ "downloads": [ { "day": "yesterday", "downloads": 1 } ] });
        assert!(serde_json::from_value::<RangeDownloads>(raw).is_err());
    }

    #[test]
    fn search_results_default_total() {
        let raw = json!({ "objects": [ { "package": { "name": "a" } } ] });
        let results: SearchResults = serde_json::from_value(raw).unwrap();
        assert!(results.total.is_none());
        assert_eq!(results.objects[0].package.name.as_deref(), Some("a"));
    }

    #[test]
    fn search_results_keep_good_hits_around_bad_ones() {
        let raw = json!({
            "objects": [
                { "package": { "name": "a" } },
                null,
                "junk",
                { "package": { "name": "b" } }
            ],
            "total": 3
        });
        let results: SearchResults = serde_json::from_value(raw).unwrap();
        let names: Vec<_> = results
            .objects
            .iter()
            .map(|o| o.package.name.as_deref())
            .collect();
        assert_eq!(names, [Some("a"), None, None, Some("b")]);
        assert_eq!(results.total, Some(3));
    }

    #[test]
    fn search_results_non_array_objects_is_empty() {
        let raw = json!({ "objects": { "package": {} }, "total": 1 });
        let results: SearchResults = serde_json::from_value(raw).unwrap();
        assert!(results.objects.is_empty());
    }
}
