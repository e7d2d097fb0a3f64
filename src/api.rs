// src/api.rs
// Thin HTTP surface over the fetch pipeline. The interesting behavior lives
// in the orchestrator; handlers translate query params and typed errors.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::ServiceConfig;
use crate::error::FetchError;
use crate::orchestrator::TrendFetchOrchestrator;
use crate::retention::RetentionSweeper;
use crate::taxonomy::SeedTopics;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TrendFetchOrchestrator>,
    pub sweeper: Arc<RetentionSweeper>,
    pub seeds: Arc<SeedTopics>,
    pub cfg: ServiceConfig,
    pub started_at: DateTime<Utc>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/trends", get(get_trends))
        .route("/cache-status", get(cache_status))
        .route("/maintenance/db-cleanup", post(db_cleanup))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

struct ApiError(FetchError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            FetchError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Rate limited",
                    "message": self.0.to_string(),
                    "retry_after": self.0.retry_after_secs(),
                }),
            ),
            FetchError::UpstreamUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                json!({"error": "Upstream unavailable", "message": self.0.to_string()}),
            ),
            FetchError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": "Store unavailable", "message": self.0.to_string()}),
            ),
            FetchError::InvalidTopic(_) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Invalid topic", "message": self.0.to_string()}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        Self(e)
    }
}

/// `GET /trends?topic=..&cluster=..`: explicit topic, or a random pick from
/// the seed taxonomy (optionally restricted to one cluster).
async fn get_trends(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req_cluster = q.get("cluster").map(String::as_str);

    let (topic, cluster) = match q.get("topic") {
        Some(t) => (t.clone(), req_cluster.map(str::to_string)),
        None => {
            let (topic, cluster) = state
                .seeds
                .pick_topic(req_cluster)
                .ok_or_else(|| {
                    FetchError::InvalidTopic(req_cluster.unwrap_or_default().to_string())
                })?;
            (topic, Some(cluster))
        }
    };

    let outcome = state.orchestrator.fetch(&topic, cluster.as_deref()).await?;

    Ok(Json(json!({
        "topic": topic,
        "cluster": cluster,
        "cache_hit": outcome.served_by,
        "trend_keywords": outcome.records,
        "timestamp": state.orchestrator.clock().now(),
    })))
}

async fn cache_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let now = state.orchestrator.clock().now();
    let cache = state.orchestrator.cache().stats(now);
    let limiter = state.orchestrator.limiter().stats(now);
    let uptime_hours = (now - state.started_at).num_seconds() as f64 / 3600.0;

    Json(json!({
        "cache_stats": {
            "total_entries": cache.total_entries,
            "fresh_entries": cache.fresh_entries,
            "expired_entries": cache.expired_entries,
            "cache_duration_hours": state.cfg.memory_ttl.num_seconds() as f64 / 3600.0,
        },
        "rate_limiting": limiter,
        "system_info": {
            "uptime_hours": uptime_hours,
            "cached_topics": cache.cached_topics,
        },
    }))
}

/// `POST /maintenance/db-cleanup?days=N`: manual retention sweep; same
/// `sweep` entry point as the background schedule.
async fn db_cleanup(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let days = match q.get("days") {
        Some(raw) => match raw.parse::<i64>() {
            Ok(d) => d,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Invalid days parameter"})),
                )
                    .into_response();
            }
        },
        None => state.cfg.retention_days,
    };

    match state.sweeper.sweep(days).await {
        Ok(deleted) => Json(json!({
            "message": "Database cleanup executed",
            "retention_days": days,
            "deleted_rows": deleted,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = ?e, "manual cleanup failed");
            ApiError(FetchError::StoreUnavailable(e)).into_response()
        }
    }
}
