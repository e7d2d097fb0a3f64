// src/orchestrator.rs
//! # Trend Fetch Orchestrator
//! Tiered lookup for one topic: memory cache, then the persisted store
//! within its freshness window, then a rate-limited upstream fetch that
//! writes back through the tiers it bypassed.
//!
//! Concurrent requests for the same uncached topic coalesce behind a
//! per-topic flight gate so only the first one can reach the rate limiter;
//! waiters re-check the memory cache and reuse its result.

use std::sync::Arc;

use anyhow::anyhow;
use dashmap::DashMap;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::cache::MemoryCache;
use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::dedup;
use crate::error::FetchError;
use crate::providers::TrendProvider;
use crate::rate_limit::RateLimiter;
use crate::store::TrendStore;
use crate::types::{FetchOutcome, RawTrend, ServedBy, TrendSource};

/// Caller-supplied intent taxonomy; labels pass through to persisted rows.
pub type IntentClassifier = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("trend_requests_total", "Topic fetches entering the orchestrator.");
        describe_counter!("trend_served_total", "Fetches served, labelled by tier.");
        describe_counter!("trend_rate_limited_total", "Fetches denied by the rate limiter.");
        describe_counter!(
            "trend_upstream_errors_total",
            "Provider attempts that failed or timed out."
        );
        describe_counter!(
            "trend_store_read_errors_total",
            "Store lookups that failed and were treated as cache misses."
        );
        describe_counter!(
            "trend_store_write_errors_total",
            "Best-effort persistence failures on the fresh path."
        );
        describe_counter!("trend_rows_upserted_total", "Shaped rows written to the store.");
    });
}

pub struct TrendFetchOrchestrator {
    cache: Arc<MemoryCache>,
    limiter: Arc<RateLimiter>,
    store: Arc<dyn TrendStore>,
    providers: Vec<Arc<dyn TrendProvider>>,
    clock: Arc<dyn Clock>,
    intent_of: IntentClassifier,
    cfg: ServiceConfig,
    /// Per-topic single-flight gates. Bounded by the set of distinct topics.
    inflight: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl TrendFetchOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: Arc<MemoryCache>,
        limiter: Arc<RateLimiter>,
        store: Arc<dyn TrendStore>,
        providers: Vec<Arc<dyn TrendProvider>>,
        clock: Arc<dyn Clock>,
        intent_of: IntentClassifier,
        cfg: ServiceConfig,
    ) -> Self {
        ensure_metrics_described();
        Self {
            cache,
            limiter,
            store,
            providers,
            clock,
            intent_of,
            cfg,
            inflight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Tiered fetch for `topic`. `cluster` is pass-through taxonomy.
    pub async fn fetch(
        &self,
        topic: &str,
        cluster: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(FetchError::InvalidTopic(topic.to_string()));
        }
        counter!("trend_requests_total").increment(1);

        // Fast path, no gate needed.
        if let Some(records) = self.cache.get(topic, self.clock.now()) {
            return Ok(self.served(records, ServedBy::Memory, topic));
        }

        // Single flight: first caller proceeds, the rest queue here and find
        // the result in the memory cache when they wake.
        let gate = self
            .inflight
            .entry(topic.to_string())
            .or_default()
            .clone();
        let _flight = gate.lock().await;

        if let Some(records) = self.cache.get(topic, self.clock.now()) {
            return Ok(self.served(records, ServedBy::Memory, topic));
        }

        // Persisted tier, bounded by the freshness window. Read failures are
        // a cache miss, not a request failure.
        let now = self.clock.now();
        let since = now - self.cfg.database_ttl;
        match self
            .store
            .query_recent(topic, since, self.cfg.database_cache_limit)
            .await
        {
            Ok(rows) if !rows.is_empty() => {
                self.cache.put(topic, rows.clone(), now);
                return Ok(self.served(rows, ServedBy::DatabaseCache, topic));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(topic, error = ?e, "store lookup failed, treating as miss");
                counter!("trend_store_read_errors_total").increment(1);
            }
        }

        // Upstream, gated by the shared budget.
        self.limiter
            .try_admit(self.clock.now())
            .map_err(|denied| {
                counter!("trend_rate_limited_total").increment(1);
                FetchError::RateLimited {
                    reason: denied.reason,
                    retry_after: denied.retry_after,
                }
            })?;

        let (raw, source) = self.fetch_upstream(topic).await?;

        let now = self.clock.now();
        let shaped = dedup::shape(topic, cluster, source, raw, now, &|k| (self.intent_of)(k));

        if shaped.is_empty() {
            // Valid outcome: cache briefly so a dead topic doesn't hammer
            // the limiter.
            self.cache
                .put_with_ttl(topic, Vec::new(), now, self.cfg.empty_result_ttl);
            return Ok(self.served(Vec::new(), ServedBy::Fresh, topic));
        }

        // Best effort: a refused write must not fail the request.
        match self.store.upsert_ignore_conflict(&shaped).await {
            Ok(written) => {
                counter!("trend_rows_upserted_total").increment(written as u64);
            }
            Err(e) => {
                tracing::warn!(topic, error = ?e, "store write failed, serving records anyway");
                counter!("trend_store_write_errors_total").increment(1);
            }
        }

        self.cache.put(topic, shaped.clone(), now);
        Ok(self.served(shaped, ServedBy::Fresh, topic))
    }

    /// Walk the provider strategies in order; the next one is tried only on
    /// explicit failure or timeout of the previous.
    async fn fetch_upstream(
        &self,
        topic: &str,
    ) -> Result<(Vec<RawTrend>, TrendSource), FetchError> {
        let mut last_err: Option<anyhow::Error> = None;

        for provider in &self.providers {
            match tokio::time::timeout(self.cfg.upstream_timeout, provider.query_trends(topic))
                .await
            {
                Ok(Ok(raw)) => {
                    tracing::debug!(topic, provider = provider.name(), n = raw.len(), "upstream ok");
                    return Ok((raw, provider.source()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(topic, provider = provider.name(), error = ?e, "provider failed");
                    counter!("trend_upstream_errors_total").increment(1);
                    last_err = Some(e);
                }
                Err(_) => {
                    tracing::warn!(topic, provider = provider.name(), "provider timed out");
                    counter!("trend_upstream_errors_total").increment(1);
                    last_err = Some(anyhow!("provider {} timed out", provider.name()));
                }
            }
        }

        Err(FetchError::UpstreamUnavailable(
            last_err.unwrap_or_else(|| anyhow!("no trend providers configured")),
        ))
    }

    fn served(&self, records: Vec<crate::types::TrendKeyword>, tier: ServedBy, topic: &str) -> FetchOutcome {
        counter!("trend_served_total", "tier" => tier.as_str()).increment(1);
        tracing::info!(topic, tier = tier.as_str(), n = records.len(), "served");
        FetchOutcome {
            records,
            served_by: tier,
        }
    }
}
