// src/error.rs
use chrono::Duration;
use thiserror::Error;

/// Why the rate limiter turned a call away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Last upstream call was less than `min_request_interval` ago.
    TooSoon,
    /// The hourly budget is exhausted.
    HourlyCap,
}

/// Typed outcomes of a tiered fetch. Denials and upstream failures surface
/// distinctly; callers opt into any serve-stale policy themselves.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited ({reason:?}), retry after {}s", .retry_after.num_seconds())]
    RateLimited {
        reason: DenyReason,
        retry_after: Duration,
    },

    #[error("upstream trend providers unavailable")]
    UpstreamUnavailable(#[source] anyhow::Error),

    #[error("persisted store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),

    #[error("invalid topic: {0:?}")]
    InvalidTopic(String),
}

impl FetchError {
    /// Seconds the caller should wait before retrying, when known.
    pub fn retry_after_secs(&self) -> Option<i64> {
        match self {
            FetchError::RateLimited { retry_after, .. } => Some(retry_after.num_seconds().max(0)),
            _ => None,
        }
    }
}
