use anyhow::Result;
use bytes::Bytes;
use rama::http::{Body, Response, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use crate::npm::{AggregateError, Aggregated};

use super::response::{respond_error, respond_json};
use super::routes::QueryError;
use super::types::CacheStatus;

pub fn handle_health(cors: &str) -> Result<(Response<Body>, CacheStatus)> {
    let body = json!({ "status": "ok" }).to_string();
    let resp = respond_json(StatusCode::OK, Bytes::from(body), cors, None)?;
    Ok((resp, CacheStatus::Pass))
}

pub fn handle_ping(cors: &str) -> Result<(Response<Body>, CacheStatus)> {
    let body = json!({ "status": "pong" }).to_string();
    let resp = respond_json(StatusCode::OK, Bytes::from(body), cors, None)?;
    Ok((resp, CacheStatus::Pass))
}

pub fn handle_bad_query(err: &QueryError, cors: &str) -> Result<(Response<Body>, CacheStatus)> {
    debug!(error = %err, "rejecting query");
    let resp = respond_error(StatusCode::BAD_REQUEST, &err.to_string(), cors)?;
    Ok((resp, CacheStatus::Pass))
}

/// Maps an aggregation outcome onto the wire.
///
/// NotFound is 404, upstream failure is 502, a body we failed to encode is 500.
pub fn respond_aggregated(
    result: Result<Aggregated, AggregateError>,
    cors: &str,
) -> Result<(Response<Body>, CacheStatus)> {
    match result {
        Ok(aggregated) => {
            let status = CacheStatus::from(aggregated.outcome);
            let resp = respond_json(StatusCode::OK, aggregated.body, cors, Some(status))?;
            Ok((resp, status))
        }
        Err(err @ AggregateError::NotFound(_)) => {
            debug!(error = %err, "upstream reported not found");
            let resp = respond_error(StatusCode::NOT_FOUND, &err.to_string(), cors)?;
            Ok((resp, CacheStatus::Miss))
        }
        Err(AggregateError::Upstream(err)) => {
            warn!(error = %err, "upstream request failed");
            let resp = respond_error(
                StatusCode::BAD_GATEWAY,
                &format!("upstream error: {err}"),
                cors,
            )?;
            Ok((resp, CacheStatus::Error))
        }
        Err(err @ AggregateError::Encode(_)) => {
            warn!(error = %err, "failed to encode response");
            let resp = respond_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error", cors)?;
            Ok((resp, CacheStatus::Error))
        }
    }
}
