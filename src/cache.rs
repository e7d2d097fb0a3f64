// src/cache.rs
//! # Memory Cache
//! In-process topic → records map, first tier of the cache hierarchy.
//!
//! Expiry is lazy: `get` treats stale entries as misses but leaves them in
//! place; `purge_expired` exists for the periodic/maintenance path and is
//! idempotent. Entries carry their own TTL so empty upstream results can be
//! cached for a shorter time than real hits.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::types::TrendKeyword;

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<TrendKeyword>,
    fetched_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at <= self.ttl
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub expired_entries: usize,
    pub cached_topics: Vec<String>,
}

#[derive(Debug)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl MemoryCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Fresh records for `topic`, or `None` on absence/expiry.
    pub fn get(&self, topic: &str, now: DateTime<Utc>) -> Option<Vec<TrendKeyword>> {
        let entry = self.entries.get(topic)?;
        if entry.is_fresh(now) {
            Some(entry.records.clone())
        } else {
            None
        }
    }

    pub fn put(&self, topic: &str, records: Vec<TrendKeyword>, now: DateTime<Utc>) {
        self.put_with_ttl(topic, records, now, self.default_ttl);
    }

    pub fn put_with_ttl(
        &self,
        topic: &str,
        records: Vec<TrendKeyword>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) {
        self.entries.insert(
            topic.to_string(),
            CacheEntry {
                records,
                fetched_at: now,
                ttl,
            },
        );
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_fresh(now));
        before - self.entries.len()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        let mut fresh = 0usize;
        let mut topics = Vec::with_capacity(self.entries.len());
        for e in self.entries.iter() {
            if e.value().is_fresh(now) {
                fresh += 1;
            }
            topics.push(e.key().clone());
        }
        topics.sort();
        CacheStats {
            total_entries: topics.len(),
            fresh_entries: fresh,
            expired_entries: topics.len() - fresh,
            cached_topics: topics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 27, 8, 0, 0).unwrap()
    }

    fn cache_1h() -> MemoryCache {
        MemoryCache::new(Duration::seconds(3600))
    }

    #[test]
    fn hit_just_inside_ttl_miss_just_past_it() {
        let c = cache_1h();
        c.put("ai art", vec![], t0());
        assert!(c.get("ai art", t0() + Duration::seconds(3599)).is_some());
        assert!(c.get("ai art", t0() + Duration::seconds(3601)).is_none());
    }

    #[test]
    fn get_does_not_remove_expired_entries() {
        let c = cache_1h();
        c.put("poster", vec![], t0());
        let later = t0() + Duration::seconds(4000);
        assert!(c.get("poster", later).is_none());
        // Still present until purged.
        assert_eq!(c.stats(later).total_entries, 1);
        assert_eq!(c.stats(later).expired_entries, 1);
    }

    #[test]
    fn purge_expired_is_idempotent() {
        let c = cache_1h();
        c.put("a", vec![], t0());
        c.put("b", vec![], t0() + Duration::seconds(3000));
        let later = t0() + Duration::seconds(3700);
        assert_eq!(c.purge_expired(later), 1);
        assert_eq!(c.purge_expired(later), 0);
        assert!(c.get("b", later).is_some());
    }

    #[test]
    fn per_entry_ttl_overrides_default() {
        let c = cache_1h();
        c.put_with_ttl("empty topic", vec![], t0(), Duration::seconds(300));
        assert!(c.get("empty topic", t0() + Duration::seconds(299)).is_some());
        assert!(c.get("empty topic", t0() + Duration::seconds(301)).is_none());
    }
}
