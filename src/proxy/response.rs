use anyhow::{Context, Result};
use bytes::Bytes;
use rama::http::{Body, HeaderValue, Response, StatusCode, header};
use serde_json::json;

use crate::config::Config;

use super::types::CacheStatus;

pub const X_CACHE: &str = "x-cache";

/// Responds with a serialized JSON body
pub fn respond_json(
    status: StatusCode,
    body: Bytes,
    cors: &str,
    cache: Option<CacheStatus>,
) -> Result<Response<Body>> {
    let mut builder = Response::builder()
        .status(status)
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_str(cors).context("invalid cors origin")?,
        );
    if let Some(cache) = cache {
        builder = builder.header(X_CACHE, cache.to_string());
    }
    builder
        .body(Body::from(body))
        .context("building json response")
}

/// Responds with `{"error": message}`, never cacheable downstream
pub fn respond_error(status: StatusCode, message: &str, cors: &str) -> Result<Response<Body>> {
    let body = json!({ "error": message }).to_string();
    let mut response = respond_json(status, Bytes::from(body), cors, None)?;
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    Ok(response)
}

pub fn respond_method_not_allowed(cors: &str) -> Result<Response<Body>> {
    let mut response = respond_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed", cors)?;
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, OPTIONS"));
    Ok(response)
}

/// CORS preflight answer
pub fn respond_preflight(cors: &str) -> Result<Response<Body>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_str(cors).context("invalid cors origin")?,
        )
        .header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        )
        .header(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        )
        .header(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"))
        .body(Body::empty())
        .context("building preflight response")
}

/// Informational page served at `/` and `/api/about`
pub fn respond_homepage(config: &Config) -> Result<Response<Body>> {
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>npm-info</title>
    <style>
      :root {{
        color-scheme: light dark;
        --bg: #0f1117;
        --fg: #f4f6ff;
        --accent: #cb3837;
        --muted: #9aa2b2;
      }}
      @media (prefers-color-scheme: light) {{
        :root {{
          --bg: #f9fbff;
          --fg: #1b2130;
          --accent: #cb3837;
          --muted: #525f7a;
        }}
      }}
      body {{
        margin: 0;
        min-height: 100vh;
        display: flex;
        align-items: center;
        justify-content: center;
        background: var(--bg);
        color: var(--fg);
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
      }}
      main {{
        max-width: 720px;
        padding: 3rem;
        border-radius: 20px;
        background: color-mix(in srgb, var(--bg) 88%, var(--fg) 12%);
      }}
      h1 {{
        font-size: 2.25rem;
        margin: 0 0 1rem;
      }}
      p {{
        margin: 0 0 1.25rem;
        line-height: 1.6;
        color: var(--muted);
      }}
      code {{
        padding: 0.2rem 0.45rem;
        border-radius: 8px;
        background: color-mix(in srgb, var(--bg) 70%, var(--fg) 30%);
        color: var(--fg);
        font-size: 0.95rem;
      }}
      li {{
        margin-bottom: 0.6rem;
      }}
    </style>
  </head>
  <body>
    <main>
      <h1>npm-info is online</h1>
      <p>
        Cached summaries of npm packages, maintainers and download statistics,
        built from <code>{registry}</code>. Responses are kept for {ttl}s.
      </p>
      <ul>
        <li>
          <code>GET /api/package/{{name}}?include_versions=true&amp;include_readme=true</code>
        </li>
        <li><code>GET /api/user/{{username}}?size=10&amp;from=0</code></li>
        <li>
          <code>GET /api/user/package/downloads/chart?package={{name}}&amp;range=last-month</code>
        </li>
        <li><code>GET /api/health</code> and <code>GET /api/ping</code></li>
      </ul>
      <p>npm-info {version}</p>
    </main>
  </body>
</html>
"#,
        registry = config.upstream.registry_url,
        ttl = config.cache.ttl_secs,
        version = env!("CARGO_PKG_VERSION"),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        )
        .header(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        )
        .body(Body::from(body))
        .context("building homepage response")
}
