// src/config.rs
// Env-driven service configuration. `.env` is loaded by the binary before
// this runs; every knob has a default so tests never need a populated env.

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Minimum spacing between upstream calls.
    pub min_request_interval: Duration,
    /// Upstream call budget per fixed hourly window.
    pub max_requests_per_hour: u32,
    /// How long a memory-cache entry stays fresh.
    pub memory_ttl: Duration,
    /// Shorter TTL for cached empty upstream results.
    pub empty_result_ttl: Duration,
    /// Freshness window for the persisted-store cache tier.
    pub database_ttl: Duration,
    /// Cap on rows pulled from the store per topic lookup.
    pub database_cache_limit: usize,
    /// Persisted rows older than this are swept.
    pub retention_days: i64,
    /// Scheduled sweep interval in seconds; 0 disables the background task.
    pub sweep_interval_secs: u64,
    /// Hard bound on a single upstream provider call.
    pub upstream_timeout: std::time::Duration,
    /// Geo restriction passed to the trend providers.
    pub geo: String,
    pub port: u16,
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::seconds(10),
            max_requests_per_hour: 100,
            memory_ttl: Duration::seconds(3600),
            empty_result_ttl: Duration::seconds(300),
            database_ttl: Duration::seconds(7200),
            database_cache_limit: 10,
            retention_days: 30,
            sweep_interval_secs: 43_200,
            upstream_timeout: std::time::Duration::from_secs(10),
            geo: "ID".to_string(),
            port: 8000,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            min_request_interval: Duration::seconds(env_u64(
                "MIN_REQUEST_INTERVAL",
                d.min_request_interval.num_seconds() as u64,
            ) as i64),
            max_requests_per_hour: env_u64(
                "MAX_REQUESTS_PER_HOUR",
                d.max_requests_per_hour as u64,
            ) as u32,
            memory_ttl: Duration::seconds(env_u64(
                "MEMORY_CACHE_TTL_SECS",
                d.memory_ttl.num_seconds() as u64,
            ) as i64),
            empty_result_ttl: Duration::seconds(env_u64(
                "EMPTY_RESULT_TTL_SECS",
                d.empty_result_ttl.num_seconds() as u64,
            ) as i64),
            database_ttl: Duration::seconds(env_u64(
                "DATABASE_CACHE_TTL_SECS",
                d.database_ttl.num_seconds() as u64,
            ) as i64),
            database_cache_limit: env_u64("DATABASE_CACHE_LIMIT", d.database_cache_limit as u64)
                as usize,
            retention_days: env_u64("DB_RETENTION_DAYS", d.retention_days as u64) as i64,
            sweep_interval_secs: env_u64("DATABASE_CLEANUP_INTERVAL", d.sweep_interval_secs),
            upstream_timeout: std::time::Duration::from_secs(env_u64(
                "UPSTREAM_TIMEOUT_SECS",
                d.upstream_timeout.as_secs(),
            )),
            geo: std::env::var("TREND_GEO").unwrap_or(d.geo),
            port: env_u64("PORT", d.port as u64) as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn defaults_match_documented_values() {
        std::env::remove_var("MIN_REQUEST_INTERVAL");
        std::env::remove_var("MAX_REQUESTS_PER_HOUR");
        let cfg = ServiceConfig::from_env();
        assert_eq!(cfg.min_request_interval, Duration::seconds(10));
        assert_eq!(cfg.max_requests_per_hour, 100);
        assert_eq!(cfg.memory_ttl, Duration::seconds(3600));
        assert_eq!(cfg.retention_days, 30);
        assert_eq!(cfg.sweep_interval_secs, 43_200);
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_apply() {
        std::env::set_var("MIN_REQUEST_INTERVAL", "3");
        std::env::set_var("MAX_REQUESTS_PER_HOUR", "7");
        let cfg = ServiceConfig::from_env();
        assert_eq!(cfg.min_request_interval, Duration::seconds(3));
        assert_eq!(cfg.max_requests_per_hour, 7);
        std::env::remove_var("MIN_REQUEST_INTERVAL");
        std::env::remove_var("MAX_REQUESTS_PER_HOUR");
    }
}
