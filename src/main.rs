//! Trend Keyword Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the fetch pipeline, shared state,
//! and the background retention schedule.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_keyword_service::api::{self, AppState};
use trend_keyword_service::cache::MemoryCache;
use trend_keyword_service::clock::{Clock, SystemClock};
use trend_keyword_service::config::ServiceConfig;
use trend_keyword_service::metrics::Metrics;
use trend_keyword_service::orchestrator::TrendFetchOrchestrator;
use trend_keyword_service::providers::{
    related_queries::RelatedQueriesProvider, widget_json::WidgetJsonProvider, TrendProvider,
};
use trend_keyword_service::rate_limit::RateLimiter;
use trend_keyword_service::retention::{spawn_sweeper, RetentionSweeper};
use trend_keyword_service::store::{SupabaseStore, TrendStore};
use trend_keyword_service::taxonomy::{self, SeedTopics};

const CACHE_PURGE_INTERVAL_SECS: u64 = 7200;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_keyword_service=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ServiceConfig::from_env();
    let metrics = Metrics::init(
        cfg.memory_ttl.num_seconds() as u64,
        cfg.max_requests_per_hour,
    );

    let http = reqwest::Client::builder()
        .timeout(cfg.upstream_timeout)
        .build()
        .context("building http client")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(MemoryCache::new(cfg.memory_ttl));
    let limiter = Arc::new(RateLimiter::new(
        cfg.min_request_interval,
        cfg.max_requests_per_hour,
    ));
    let store: Arc<dyn TrendStore> = Arc::new(SupabaseStore::from_env(http.clone())?);

    let providers: Vec<Arc<dyn TrendProvider>> = vec![
        Arc::new(RelatedQueriesProvider::new(http.clone(), cfg.geo.clone())),
        Arc::new(WidgetJsonProvider::new(http, cfg.geo.clone())),
    ];

    // Periodic memory-cache cleanup; `get` expires lazily, this keeps the
    // map from accumulating dead topics.
    let purge_cache = cache.clone();
    let purge_clock = clock.clone();
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(CACHE_PURGE_INTERVAL_SECS));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = purge_cache.purge_expired(purge_clock.now());
            tracing::info!(removed, "memory cache purge");
        }
    });

    let orchestrator = Arc::new(TrendFetchOrchestrator::new(
        cache,
        limiter,
        store.clone(),
        providers,
        clock.clone(),
        Arc::new(|k: &str| Some(taxonomy::classify_intent(k).to_string())),
        cfg.clone(),
    ));

    let sweeper = Arc::new(RetentionSweeper::new(store, clock.clone()));
    let _sweep_task = spawn_sweeper(
        sweeper.clone(),
        cfg.retention_days,
        cfg.sweep_interval_secs,
    );

    let state = AppState {
        orchestrator,
        sweeper,
        seeds: Arc::new(SeedTopics::load_default()),
        cfg: cfg.clone(),
        started_at: clock.now(),
    };

    let app = api::router(state).merge(metrics.router());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding listener")?;
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
