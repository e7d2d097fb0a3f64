// src/store.rs
//! Persisted store boundary: the second cache tier and system of record.
//!
//! The core depends only on the three `TrendStore` operations plus the
//! storage-side uniqueness constraint on (topic, keyword, day_bucket).
//! `SupabaseStore` talks PostgREST; tests substitute their own impls.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::TrendKeyword;

const TABLE: &str = "trend_keywords";

#[async_trait]
pub trait TrendStore: Send + Sync {
    /// Insert records, silently keeping the existing row when one already
    /// exists for the same (topic, keyword, day_bucket). Returns how many
    /// rows were actually written.
    async fn upsert_ignore_conflict(&self, records: &[TrendKeyword]) -> Result<usize>;

    /// Rows for `topic` with `timestamp >= since`, newest first, at most
    /// `limit` of them.
    async fn query_recent(
        &self,
        topic: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrendKeyword>>;

    /// Delete rows with `timestamp < cutoff`; returns the exact count.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// PostgREST-backed store.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let url = std::env::var("SUPABASE_URL").context("SUPABASE_URL not set")?;
        let key = std::env::var("SUPABASE_KEY").context("SUPABASE_KEY not set")?;
        Ok(Self::new(client, url, key))
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), TABLE)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl TrendStore for SupabaseStore {
    async fn upsert_ignore_conflict(&self, records: &[TrendKeyword]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let req = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "topic,keyword,day_bucket")])
            .header("Prefer", "resolution=ignore-duplicates,return=representation")
            .json(records);
        let resp = self
            .authed(req)
            .send()
            .await
            .context("store upsert request")?
            .error_for_status()
            .context("store upsert status")?;
        let rows: Vec<Value> = resp.json().await.context("store upsert body")?;
        Ok(rows.len())
    }

    async fn query_recent(
        &self,
        topic: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrendKeyword>> {
        let req = self.client.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("topic", format!("eq.{topic}")),
            ("timestamp", format!("gte.{}", since.to_rfc3339())),
            ("order", "timestamp.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        let resp = self
            .authed(req)
            .send()
            .await
            .context("store query request")?
            .error_for_status()
            .context("store query status")?;
        let rows: Vec<TrendKeyword> = resp.json().await.context("store query body")?;
        Ok(rows)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let req = self
            .client
            .delete(self.table_url())
            .query(&[("timestamp", format!("lt.{}", cutoff.to_rfc3339()))])
            .header("Prefer", "return=representation");
        let resp = self
            .authed(req)
            .send()
            .await
            .context("store delete request")?
            .error_for_status()
            .context("store delete status")?;
        let rows: Vec<Value> = resp.json().await.context("store delete body")?;
        Ok(rows.len() as u64)
    }
}
