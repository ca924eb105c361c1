//! Path routing and query-string parsing

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::form_urlencoded;

use crate::npm::{ChartQuery, PackageQuery, UserQuery};

const PACKAGE_PREFIX: &str = "/api/package/";
const USER_PREFIX: &str = "/api/user/";
const CHART_PATH: &str = "/api/user/package/downloads/chart";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    Health,
    Ping,
    /// Decoded package name; scoped names arrive as `@scope/name` or `@scope%2Fname`
    Package(String),
    User(String),
    Chart,
}

impl Route {
    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.trim_end_matches('/') {
            "" => return Some(Self::Home),
            trimmed => trimmed,
        };

        match path {
            "/api/about" => return Some(Self::About),
            "/api/health" => return Some(Self::Health),
            "/api/ping" => return Some(Self::Ping),
            // Must win over the `/api/user/{username}` prefix below.
            CHART_PATH => return Some(Self::Chart),
            _ => {}
        }

        if let Some(rest) = path.strip_prefix(PACKAGE_PREFIX) {
            return decode_segment(rest).map(Self::Package);
        }

        if let Some(rest) = path.strip_prefix(USER_PREFIX) {
            if rest.contains('/') {
                return None;
            }
            return decode_segment(rest).map(Self::User);
        }

        None
    }
}

fn decode_segment(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(decoded.into_owned())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query parameter `{name}` must be a boolean, got {value:?}")]
    InvalidBool { name: &'static str, value: String },
    #[error("query parameter `{name}` must be a non-negative integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },
    #[error("query parameter `{name}` is required")]
    Missing { name: &'static str },
}

pub fn package_query(name: String, query: Option<&str>) -> Result<PackageQuery, QueryError> {
    let mut parsed = PackageQuery::new(name);
    for (key, value) in pairs(query) {
        match key.as_str() {
            "include_versions" => parsed.include_versions = parse_bool("include_versions", &value)?,
            "include_readme" => parsed.include_readme = parse_bool("include_readme", &value)?,
            _ => {}
        }
    }
    Ok(parsed)
}

pub fn user_query(username: String, query: Option<&str>) -> Result<UserQuery, QueryError> {
    let mut parsed = UserQuery::new(username);
    for (key, value) in pairs(query) {
        match key.as_str() {
            "size" => parsed.size = parse_u32("size", &value)?,
            "from" | "from_" => parsed.from = parse_u32("from", &value)?,
            _ => {}
        }
    }
    Ok(parsed)
}

pub fn chart_query(query: Option<&str>) -> Result<ChartQuery, QueryError> {
    let mut package = None;
    let mut range = None;
    for (key, value) in pairs(query) {
        match key.as_str() {
            "package" => package = Some(value),
            "range" => range = Some(value),
            _ => {}
        }
    }

    let package = package
        .filter(|p| !p.is_empty())
        .ok_or(QueryError::Missing { name: "package" })?;
    let mut parsed = ChartQuery::new(package);
    if let Some(range) = range.filter(|r| !r.is_empty()) {
        parsed.range = range;
    }
    Ok(parsed)
}

fn pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_bool(name: &'static str, value: &str) -> Result<bool, QueryError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(QueryError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_u32(name: &'static str, value: &str) -> Result<u32, QueryError> {
    value
        .trim()
        .parse()
        .map_err(|_| QueryError::InvalidInteger {
            name,
            value: value.to_string(),
        })
}
