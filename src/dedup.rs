// src/dedup.rs
//! # Record Deduplicator
//! Pure shaping of raw provider output into persistable `TrendKeyword`s.
//!
//! No storage, no side effects: identity (`keyword_hash`, `day_bucket`) is
//! derived deterministically so repeated fetches of the same topic/day
//! collapse onto the storage layer's uniqueness constraint instead of
//! duplicating rows.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};

use crate::types::{RawTrend, TrendKeyword, TrendSource};

const HASH_HEX_LEN: usize = 16;

/// Stable dedup identity for one (topic, keyword, day) observation.
/// Truncated SHA-256, stable across process restarts.
pub fn keyword_hash(topic: &str, keyword: &str, day_bucket: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(topic.as_bytes());
    hasher.update(b"|");
    hasher.update(keyword.as_bytes());
    hasher.update(b"|");
    hasher.update(day_bucket.to_string().as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(HASH_HEX_LEN);
    for b in digest.iter().take(HASH_HEX_LEN / 2) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Shape one raw provider batch for `topic` observed at `now`.
///
/// Keywords are trimmed; empties are dropped. The same keyword appearing
/// twice in one batch collapses to a single record keeping the higher score.
/// Scores are clamped to [0, 100]. `cluster` and `intent_of` are caller-
/// supplied taxonomy and pass through unchanged. Output preserves first-
/// appearance order.
pub fn shape(
    topic: &str,
    cluster: Option<&str>,
    source: TrendSource,
    raw: Vec<RawTrend>,
    now: DateTime<Utc>,
    intent_of: &dyn Fn(&str) -> Option<String>,
) -> Vec<TrendKeyword> {
    let day_bucket = now.date_naive();
    let mut out: Vec<TrendKeyword> = Vec::with_capacity(raw.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(raw.len());

    for item in raw {
        let keyword = item.keyword.trim();
        if keyword.is_empty() {
            continue;
        }
        let score = item.score.clamp(0, 100) as u8;

        if let Some(&i) = index.get(keyword) {
            if score > out[i].score {
                out[i].score = score;
            }
            continue;
        }

        index.insert(keyword.to_string(), out.len());
        out.push(TrendKeyword {
            keyword: keyword.to_string(),
            topic: topic.to_string(),
            score,
            source,
            topic_cluster: cluster.map(str::to_string),
            intent: intent_of(keyword),
            keyword_hash: keyword_hash(topic, keyword, day_bucket),
            day_bucket,
            timestamp: now,
        });
    }

    out
}
