// src/types.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One raw `{keyword, score}` pair as returned by an upstream provider,
/// before shaping/deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrend {
    pub keyword: String,
    pub score: i64,
}

/// Which upstream strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSource {
    ProviderPrimary,
    ProviderFallback,
}

/// One observed keyword for one topic at one point in time. Matches the
/// persisted `trend_keywords` schema field-for-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendKeyword {
    pub keyword: String,
    pub topic: String,
    /// Popularity signal in [0, 100].
    pub score: u8,
    pub source: TrendSource,
    #[serde(default)]
    pub topic_cluster: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    /// Stable dedup identity: truncated SHA-256 of `topic|keyword|day_bucket`.
    pub keyword_hash: String,
    /// UTC calendar date the observation belongs to; derived from `timestamp`.
    pub day_bucket: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

/// Which tier served a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedBy {
    Memory,
    DatabaseCache,
    Fresh,
}

impl ServedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedBy::Memory => "memory",
            ServedBy::DatabaseCache => "database_cache",
            ServedBy::Fresh => "fresh",
        }
    }
}

/// Result of a tiered fetch: the records plus which tier produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    pub records: Vec<TrendKeyword>,
    pub served_by: ServedBy,
}
