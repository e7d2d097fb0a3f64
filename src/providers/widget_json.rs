// src/providers/widget_json.rs
//! Fallback strategy: the tokenless best-effort widget endpoint. Same
//! envelope as the primary, different backend, noticeably flakier; records
//! it produces carry the fallback source tag.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;

use super::{parse_ranked_keywords, TrendProvider};
use crate::types::{RawTrend, TrendSource};

const BASE_URL: &str = "https://trends.google.com/trends/api/widgetdata/relatedsearches";

pub struct WidgetJsonProvider {
    client: reqwest::Client,
    geo: String,
}

impl WidgetJsonProvider {
    pub fn new(client: reqwest::Client, geo: impl Into<String>) -> Self {
        Self {
            client,
            geo: geo.into(),
        }
    }
}

#[async_trait]
impl TrendProvider for WidgetJsonProvider {
    async fn query_trends(&self, topic: &str) -> Result<Vec<RawTrend>> {
        let req = serde_json::json!({
            "restriction": {
                "complexKeywordsRestriction": {
                    "keyword": [{"type": "BROAD", "value": topic}]
                }
            },
            "keywordType": "QUERY",
            "metric": ["TOP"],
            "trendinessSettings": {"compareTime": "now 7-d"},
            "requestOptions": {"property": self.geo, "backend": "CM", "category": 0},
            "language": "id"
        })
        .to_string();

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[("hl", "id"), ("tz", "420"), ("req", &req), ("token", "")])
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await
            .context("widget json get")?;

        if !resp.status().is_success() {
            counter!("trend_provider_errors_total", "provider" => self.name()).increment(1);
            anyhow::bail!("widget json status {}", resp.status());
        }

        let body = resp.text().await.context("widget json body")?;
        parse_ranked_keywords(&body)
    }

    fn name(&self) -> &'static str {
        "widget_json"
    }

    fn source(&self) -> TrendSource {
        TrendSource::ProviderFallback
    }
}
