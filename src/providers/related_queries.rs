// src/providers/related_queries.rs
//! Primary strategy: the related-searches widget API for a topic over the
//! last 7 days, restricted to one geo.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;

use super::{parse_ranked_keywords, TrendProvider};
use crate::types::{RawTrend, TrendSource};

const BASE_URL: &str = "https://trends.google.com/trends/api/widgetdata/relatedsearches";

pub struct RelatedQueriesProvider {
    client: reqwest::Client,
    geo: String,
}

impl RelatedQueriesProvider {
    pub fn new(client: reqwest::Client, geo: impl Into<String>) -> Self {
        Self {
            client,
            geo: geo.into(),
        }
    }

    fn request_payload(&self, topic: &str) -> String {
        serde_json::json!({
            "restriction": {
                "complexKeywordsRestriction": {
                    "keyword": [{"type": "BROAD", "value": topic}]
                }
            },
            "keywordType": "QUERY",
            "metric": ["TOP"],
            "trendinessSettings": {"compareTime": "now 7-d"},
            "requestOptions": {"property": self.geo, "backend": "IZG", "category": 0},
            "language": "id"
        })
        .to_string()
    }
}

#[async_trait]
impl TrendProvider for RelatedQueriesProvider {
    async fn query_trends(&self, topic: &str) -> Result<Vec<RawTrend>> {
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("hl", "id"),
                ("tz", "420"),
                ("req", &self.request_payload(topic)),
            ])
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await
            .context("related queries get")?;

        if !resp.status().is_success() {
            counter!("trend_provider_errors_total", "provider" => self.name()).increment(1);
            anyhow::bail!("related queries status {}", resp.status());
        }

        let body = resp.text().await.context("related queries body")?;
        parse_ranked_keywords(&body)
    }

    fn name(&self) -> &'static str {
        "related_queries"
    }

    fn source(&self) -> TrendSource {
        TrendSource::ProviderPrimary
    }
}
