mod handlers;
mod response;
mod routes;
mod types;

use std::sync::Arc;

use anyhow::Result;
use rama::{
    Service,
    error::BoxError,
    http::{Body, Method, Request, Response, StatusCode},
};
use tracing::{error, info};

use crate::config::Config;
use crate::npm::NpmAggregator;

pub use routes::{QueryError, Route, parse_bool};
pub use types::{CacheStatus, RequestContext};

/// HTTP front of the aggregator
#[derive(Clone)]
pub struct NpmInfoProxy {
    config: Arc<Config>,
    aggregator: NpmAggregator,
}

impl NpmInfoProxy {
    pub fn new(config: Arc<Config>, aggregator: NpmAggregator) -> Self {
        Self { config, aggregator }
    }

    async fn handle(&self, req: Request<Body>, ctx: &mut RequestContext) -> Result<Response<Body>> {
        let cors = self.config.server.cors_allow_origin.as_str();

        let Some(route) = Route::from_path(req.uri().path()) else {
            return response::respond_error(StatusCode::NOT_FOUND, "not found", cors);
        };

        if req.method() == Method::OPTIONS {
            return response::respond_preflight(cors);
        }

        if req.method() != Method::GET {
            return response::respond_method_not_allowed(cors);
        }

        let query = req.uri().query().map(str::to_owned);
        let query = query.as_deref();
        let (resp, status) = match route {
            Route::Home | Route::About => {
                (response::respond_homepage(&self.config)?, CacheStatus::Pass)
            }
            Route::Health => handlers::handle_health(cors)?,
            Route::Ping => handlers::handle_ping(cors)?,
            Route::Package(name) => match routes::package_query(name, query) {
                Ok(query) => {
                    handlers::respond_aggregated(self.aggregator.package_info(&query).await, cors)?
                }
                Err(err) => handlers::handle_bad_query(&err, cors)?,
            },
            Route::User(username) => match routes::user_query(username, query) {
                Ok(query) => {
                    handlers::respond_aggregated(self.aggregator.user_packages(&query).await, cors)?
                }
                Err(err) => handlers::handle_bad_query(&err, cors)?,
            },
            Route::Chart => match routes::chart_query(query) {
                Ok(query) => handlers::respond_aggregated(
                    self.aggregator.downloads_chart(&query).await,
                    cors,
                )?,
                Err(err) => handlers::handle_bad_query(&err, cors)?,
            },
        };

        ctx.cache = status;
        Ok(resp)
    }
}

impl Service<Request<Body>> for NpmInfoProxy {
    type Output = Response<Body>;
    type Error = BoxError;

    async fn serve(&self, req: Request<Body>) -> Result<Self::Output, Self::Error> {
        let mut ctx = RequestContext::from_request(&req);

        let result = self.handle(req, &mut ctx).await;

        match &result {
            Ok(resp) => {
                let response_code = resp.status().as_u16();
                let duration_ms = ctx.start.elapsed().as_millis();
                info!(
                    summary = %ctx.summary(),
                    response_code,
                    duration_ms,
                    cache_status = %ctx.cache,
                    "request handled"
                );
            }
            Err(err) => {
                let duration_ms = ctx.start.elapsed().as_millis();
                error!(
                    summary = %ctx.summary(),
                    duration_ms,
                    cache_status = %ctx.cache,
                    error = %err,
                    "request failed"
                );
            }
        }

        result.map_err(|e| e.into())
    }
}
