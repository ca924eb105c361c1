#![warn(
    rust_2024_compatibility,
    clippy::all,
    clippy::future_not_send,
    clippy::mod_module_files,
    clippy::needless_pass_by_ref_mut,
    clippy::unused_async
)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_sdk::{resource::Resource, trace as sdktrace};
use rama::{
    Layer as RamaLayer,
    graceful::Shutdown,
    http::{layer::trace::TraceLayer, server::HttpServer},
    layer::ConsumeErrLayer,
    rt::Executor,
    tcp::server::TcpListener,
};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use npm_info::config::Config;
use npm_info::npm::{NpmAggregator, ResponseStore};
use npm_info::proxy::NpmInfoProxy;
use npm_info::sweep;
use npm_info::upstream::UpstreamClient;

const SERVICE_NAME: &str = "npm-info";
const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

#[derive(Debug, Parser)]
#[command(author, version, about = "Cached npm package information API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve {
        /// Path to the configuration file
        #[arg(long, default_value = "npm-info.toml")]
        config: PathBuf,
    },
    /// Perform a health check against a running instance
    Health {
        /// URL of the health endpoint (defaults to local server)
        #[arg(long, default_value = "http://127.0.0.1:8000/api/health")]
        url: String,
        /// Timeout in seconds for the request
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { config } => run_server(config),
        Command::Health { url, timeout } => run_health(url, timeout),
    }
}

fn run_server(config_path: PathBuf) -> Result<()> {
    let config = Arc::new(Config::load(Some(config_path)).context("loading configuration")?);
    config.validate().context("validating configuration")?;
    init_tracing(&config)?;

    let upstream = UpstreamClient::new(&config.upstream).context("building upstream client")?;
    let cache = Arc::new(ResponseStore::new(config.cache.ttl()));
    tracing::info!(ttl_secs = cache.ttl().as_secs(), "response cache initialized");

    let aggregator = NpmAggregator::new(cache.clone(), Arc::new(upstream));
    let proxy = NpmInfoProxy::new(config.clone(), aggregator);

    let rt_server = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()
        .context("constructing server runtime")?;

    rt_server.block_on(async move {
        let mut sweeper = if config.cache.sweep_schedule.is_empty() {
            None
        } else {
            Some(sweep::start_cache_sweeper(cache, &config.cache.sweep_schedule).await?)
        };

        let graceful = Shutdown::default();
        let addr = format!("{}:{}", config.server.host, config.server.port);

        // Bind before spawning so a taken port fails startup instead of a task.
        let tcp_service = TcpListener::build()
            .bind(addr.clone())
            .await
            .map_err(|err| anyhow::anyhow!("binding {addr}: {err}"))?;

        tracing::info!(%addr, "starting Rama HTTP server");

        graceful.spawn_task_fn(move |guard| async move {
            let exec = Executor::graceful(guard.clone());
            let http_service = HttpServer::auto(exec).service(
                (TraceLayer::new_for_http(), ConsumeErrLayer::default()).into_layer(proxy),
            );

            tcp_service.serve_graceful(guard, http_service).await;
        });

        tokio::signal::ctrl_c()
            .await
            .context("listening for shutdown signal")?;

        graceful
            .shutdown_with_limit(Duration::from_secs(30))
            .await?;

        if let Some(sched) = sweeper.as_mut() {
            sched
                .shutdown()
                .await
                .context("stopping cache sweep scheduler")?;
        }

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn run_health(url: String, timeout: u64) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()
        .context("building health check client")?;

    let response = client
        .get(&url)
        .send()
        .context("sending health check request")?;

    if response.status().is_success() {
        println!("npm-info healthy: {}", response.status());
        Ok(())
    } else {
        bail!("health endpoint returned status {}", response.status());
    }
}

/// Installs the global subscriber: `[logging]` filter and format, plus span
/// export when `OTEL_EXPORTER_OTLP_ENDPOINT` names a collector.
fn init_tracing(config: &Config) -> Result<()> {
    let filter = config.logging.env_filter()?;

    let fmt_layer = if config.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };

    let otel_layer = match std::env::var(OTLP_ENDPOINT_ENV) {
        Ok(endpoint) => Some(tracing_opentelemetry::layer().with_tracer(otlp_tracer(endpoint)?)),
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::debug!(
        level = %config.logging.level,
        json = config.logging.json,
        "tracing initialized"
    );
    Ok(())
}

/// Batch-exports spans over OTLP/HTTP and registers the provider globally.
fn otlp_tracer(endpoint: String) -> Result<sdktrace::SdkTracer> {
    use opentelemetry_otlp::WithExportConfig;

    let resource = Resource::builder_empty()
        .with_attributes([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint.clone())
        .build()
        .with_context(|| format!("building OTLP exporter for {endpoint}"))?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let tracer = provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(provider);
    Ok(tracer)
}
