// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod providers;
pub mod rate_limit;
pub mod retention;
pub mod store;
pub mod taxonomy;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::MemoryCache;
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::ServiceConfig;
pub use crate::error::{DenyReason, FetchError};
pub use crate::orchestrator::TrendFetchOrchestrator;
pub use crate::rate_limit::RateLimiter;
pub use crate::retention::RetentionSweeper;
pub use crate::store::TrendStore;
pub use crate::types::{FetchOutcome, RawTrend, ServedBy, TrendKeyword, TrendSource};
