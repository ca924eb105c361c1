//! Typed aggregation requests and their cache keys

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_CHART_RANGE: &str = "last-month";

/// Characters escaped inside a key component. `:` separates components and
/// `%` introduces an escape, so escaping both keeps keys unambiguous.
const KEY_COMPONENT: &AsciiSet = &CONTROLS.add(b':').add(b'%');

/// Cache key derived from a request type and every parameter that changes
/// the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    fn build(kind: &str, parts: &[&str]) -> Self {
        let mut key = String::from(kind);
        for part in parts {
            key.push(':');
            key.extend(utf8_percent_encode(part, KEY_COMPONENT));
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Anything that can be served through the response cache
pub trait CacheKeyed {
    fn cache_key(&self) -> CacheKey;
}

/// `GET /api/package/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageQuery {
    pub name: String,
    pub include_versions: bool,
    pub include_readme: bool,
}

impl PackageQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include_versions: false,
            include_readme: false,
        }
    }
}

impl CacheKeyed for PackageQuery {
    fn cache_key(&self) -> CacheKey {
        CacheKey::build(
            "pkg",
            &[
                self.name.as_str(),
                flag(self.include_versions),
                flag(self.include_readme),
            ],
        )
    }
}

/// `GET /api/user/{username}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub username: String,
    pub size: u32,
    pub from: u32,
}

impl UserQuery {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            size: DEFAULT_PAGE_SIZE,
            from: 0,
        }
    }
}

impl CacheKeyed for UserQuery {
    fn cache_key(&self) -> CacheKey {
        CacheKey::build(
            "user",
            &[
                self.username.as_str(),
                self.size.to_string().as_str(),
                self.from.to_string().as_str(),
            ],
        )
    }
}

/// `GET /api/user/package/downloads/chart`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartQuery {
    pub package: String,
    /// `last-day`, `last-week`, `last-month` or `YYYY-MM-DD:YYYY-MM-DD`; sent upstream as-is
    pub range: String,
}

impl ChartQuery {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            range: DEFAULT_CHART_RANGE.to_string(),
        }
    }
}

impl CacheKeyed for ChartQuery {
    fn cache_key(&self) -> CacheKey {
        CacheKey::build("chart", &[self.package.as_str(), self.range.as_str()])
    }
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
