// src/providers/mod.rs
pub mod related_queries;
pub mod widget_json;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{RawTrend, TrendSource};

/// Raw scores at or below this are noise and never surface.
pub const MIN_SCORE: i64 = 20;

/// One upstream fetch strategy. The orchestrator holds an ordered list of
/// these and walks it on explicit failure only.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    async fn query_trends(&self, topic: &str) -> Result<Vec<RawTrend>>;
    fn name(&self) -> &'static str;
    /// Tag applied to records this provider produced.
    fn source(&self) -> TrendSource;
}

// Both Google endpoints return the same ranked-keyword envelope, prefixed
// with the `)]}',` anti-JSON-hijacking guard.

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    default: RankedLists,
}

#[derive(Debug, Default, Deserialize)]
struct RankedLists {
    #[serde(rename = "rankedList", default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword", default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Deserialize)]
struct RankedKeyword {
    query: String,
    #[serde(default)]
    value: i64,
}

/// Parse a related-searches response body into raw trends, dropping
/// low-signal entries.
pub(crate) fn parse_ranked_keywords(body: &str) -> Result<Vec<RawTrend>> {
    let clean = body.trim_start().trim_start_matches(")]}',").trim_start();
    let env: Envelope = serde_json::from_str(clean).context("parsing ranked keyword json")?;

    let mut out = Vec::new();
    for list in env.default.ranked_list {
        for item in list.ranked_keyword {
            if item.value > MIN_SCORE {
                out.push(RawTrend {
                    keyword: item.query,
                    score: item.value,
                });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#")]}',
{"default":{"rankedList":[{"rankedKeyword":[
  {"query":"ai poster","value":90},
  {"query":"ai poster maker","value":45},
  {"query":"faint signal","value":12}
]}]}}"#;

    #[test]
    fn parses_and_filters_low_scores() {
        let out = parse_ranked_keywords(BODY).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].keyword, "ai poster");
        assert_eq!(out[0].score, 90);
    }

    #[test]
    fn rejects_non_json_bodies() {
        assert!(parse_ranked_keywords("<html>captcha</html>").is_err());
    }

    #[test]
    fn empty_ranked_list_yields_empty_vec() {
        let out = parse_ranked_keywords(r#")]}',{"default":{"rankedList":[]}}"#).unwrap();
        assert!(out.is_empty());
    }
}
