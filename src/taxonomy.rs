// src/taxonomy.rs
//! Seed-topic clusters and the rule-based intent classifier.
//!
//! Data-shaping taxonomy, external to the fetch/cache core: the orchestrator
//! only passes these labels through. Clusters load from TOML
//! ($SEED_TOPICS_PATH, then config/seed_topics.toml, then the embedded
//! default) so the topic list can change without a rebuild.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;

const ENV_PATH: &str = "SEED_TOPICS_PATH";
const DEFAULT_PATH: &str = "config/seed_topics.toml";
const EMBEDDED: &str = include_str!("../config/seed_topics.toml");

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SeedTopics {
    /// Cluster name → seed topics. BTreeMap keeps iteration order stable.
    pub clusters: BTreeMap<String, Vec<String>>,
}

impl SeedTopics {
    pub fn from_toml(s: &str) -> Result<Self> {
        let parsed: SeedTopics = toml::from_str(s).context("parsing seed topics toml")?;
        Ok(parsed)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed topics from {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Env path, then config/, then the embedded default.
    pub fn load_default() -> Self {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            match Self::load_from(&pb) {
                Ok(v) => return v,
                Err(e) => tracing::warn!(error = ?e, "seed topics env path unusable, falling back"),
            }
        }
        let default_p = PathBuf::from(DEFAULT_PATH);
        if default_p.exists() {
            if let Ok(v) = Self::load_from(&default_p) {
                return v;
            }
        }
        Self::from_toml(EMBEDDED).expect("embedded seed topics must parse")
    }

    /// Random topic, optionally restricted to one cluster.
    /// Returns `(topic, cluster)`, or `None` for an unknown/empty cluster.
    pub fn pick_topic(&self, cluster: Option<&str>) -> Option<(String, String)> {
        let mut rng = rand::rng();
        let cluster_name = match cluster {
            Some(c) => {
                if !self.clusters.contains_key(c) {
                    return None;
                }
                c.to_string()
            }
            None => {
                let names: Vec<&String> = self.clusters.keys().collect();
                (*names.choose(&mut rng)?).clone()
            }
        };
        let topics = self.clusters.get(&cluster_name)?;
        let topic = topics.choose(&mut rng)?.clone();
        Some((topic, cluster_name))
    }
}

static COMMERCIAL_TOKENS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "beli", "jual", "jualan", "iklan", "promo", "order", "harga", "toko", "shop",
        "video produk", "tiktok shop", "affiliate",
    ]
});

static CREATIVE_TOKENS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "prompt", "aesthetic", "poster", "midjourney", "art", "desain", "template", "keren",
        "vintage", "surreal", "cyberpunk", "anime",
    ]
});

/// Rule-based intent label: commercial beats creative beats informational.
pub fn classify_intent(keyword: &str) -> &'static str {
    let k = keyword.to_lowercase();
    if COMMERCIAL_TOKENS.iter().any(|t| k.contains(t)) {
        return "commercial";
    }
    if CREATIVE_TOKENS.iter().any(|t| k.contains(t)) {
        return "creative";
    }
    "informational"
}
