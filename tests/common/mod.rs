// tests/common/mod.rs
// Shared mocks: scripted providers, an in-memory store honoring the
// uniqueness triple, and an orchestrator builder around a manual clock.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use trend_keyword_service::cache::MemoryCache;
use trend_keyword_service::clock::{Clock, ManualClock};
use trend_keyword_service::config::ServiceConfig;
use trend_keyword_service::orchestrator::TrendFetchOrchestrator;
use trend_keyword_service::providers::TrendProvider;
use trend_keyword_service::rate_limit::RateLimiter;
use trend_keyword_service::store::TrendStore;
use trend_keyword_service::types::{RawTrend, TrendKeyword, TrendSource};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 27, 12, 0, 0).unwrap()
}

/// Provider that returns a fixed script and counts calls.
pub struct ScriptedProvider {
    pub provider_name: &'static str,
    pub source: TrendSource,
    pub calls: AtomicUsize,
    pub fail: bool,
    pub raw: Vec<RawTrend>,
    /// Optional artificial latency, for coalescing tests.
    pub delay: std::time::Duration,
}

impl ScriptedProvider {
    pub fn primary(raw: Vec<RawTrend>) -> Self {
        Self {
            provider_name: "primary",
            source: TrendSource::ProviderPrimary,
            calls: AtomicUsize::new(0),
            fail: false,
            raw,
            delay: std::time::Duration::ZERO,
        }
    }

    pub fn failing_primary() -> Self {
        Self {
            fail: true,
            ..Self::primary(Vec::new())
        }
    }

    pub fn fallback(raw: Vec<RawTrend>) -> Self {
        Self {
            provider_name: "fallback",
            source: TrendSource::ProviderFallback,
            calls: AtomicUsize::new(0),
            fail: false,
            raw,
            delay: std::time::Duration::ZERO,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrendProvider for ScriptedProvider {
    async fn query_trends(&self, _topic: &str) -> Result<Vec<RawTrend>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(anyhow!("scripted provider failure"));
        }
        Ok(self.raw.clone())
    }

    fn name(&self) -> &'static str {
        self.provider_name
    }

    fn source(&self) -> TrendSource {
        self.source
    }
}

/// In-memory store enforcing the (topic, keyword, day_bucket) uniqueness
/// constraint the way the real storage layer does.
#[derive(Default)]
pub struct MockStore {
    pub rows: parking_lot::Mutex<Vec<TrendKeyword>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub read_calls: AtomicUsize,
    pub upsert_calls: AtomicUsize,
}

impl MockStore {
    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn seed(&self, rows: Vec<TrendKeyword>) {
        self.rows.lock().extend(rows);
    }
}

#[async_trait]
impl TrendStore for MockStore {
    async fn upsert_ignore_conflict(&self, records: &[TrendKeyword]) -> Result<usize> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("mock write failure"));
        }
        let mut rows = self.rows.lock();
        let mut written = 0;
        for r in records {
            let exists = rows.iter().any(|e| {
                e.topic == r.topic && e.keyword == r.keyword && e.day_bucket == r.day_bucket
            });
            if !exists {
                rows.push(r.clone());
                written += 1;
            }
        }
        Ok(written)
    }

    async fn query_recent(
        &self,
        topic: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrendKeyword>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("mock read failure"));
        }
        let rows = self.rows.lock();
        let mut hits: Vec<TrendKeyword> = rows
            .iter()
            .filter(|r| r.topic == topic && r.timestamp >= since)
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|r| r.timestamp >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

pub fn make_keyword(topic: &str, keyword: &str, at: DateTime<Utc>) -> TrendKeyword {
    TrendKeyword {
        keyword: keyword.to_string(),
        topic: topic.to_string(),
        score: 50,
        source: TrendSource::ProviderPrimary,
        topic_cluster: None,
        intent: None,
        keyword_hash: trend_keyword_service::dedup::keyword_hash(
            topic,
            keyword,
            at.date_naive(),
        ),
        day_bucket: at.date_naive(),
        timestamp: at,
    }
}

pub fn build_orchestrator(
    store: Arc<MockStore>,
    providers: Vec<Arc<dyn TrendProvider>>,
    clock: Arc<ManualClock>,
) -> TrendFetchOrchestrator {
    let cfg = ServiceConfig::default();
    let clock_dyn: Arc<dyn Clock> = clock;
    TrendFetchOrchestrator::new(
        Arc::new(MemoryCache::new(cfg.memory_ttl)),
        Arc::new(RateLimiter::new(
            cfg.min_request_interval,
            cfg.max_requests_per_hour,
        )),
        store,
        providers,
        clock_dyn,
        Arc::new(|_: &str| -> Option<String> { None }),
        cfg,
    )
}
