// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Result cache for finished mining runs

use marketbasket_core::{Metric, MiningConfig};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Content address of a mining request: payload bytes, metric, and every
/// config field that affects the output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(payload: &str, metric: Metric, config: &MiningConfig) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(payload.len() as u64).to_le_bytes());
        hasher.update(payload.as_bytes());
        hasher.update(metric.as_str().as_bytes());
        hasher.update(&config.min_support.to_bits().to_le_bytes());
        for m in Metric::ALL {
            hasher.update(&config.thresholds.get(m).to_bits().to_le_bytes());
        }
        hasher.update(&(config.credit_marker.len() as u64).to_le_bytes());
        hasher.update(config.credit_marker.as_bytes());
        let max_len = config.max_len.map_or(0u64, |n| n as u64 + 1);
        hasher.update(&max_len.to_le_bytes());
        Self(hex::encode(hasher.finalize().as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct ResultCache {
    cache: Cache<CacheKey, String>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl ResultCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        match self.cache.get(key).await {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn insert(&self, key: CacheKey, result: String) {
        self.cache.insert(key, result).await;
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
            entry_count: self.cache.entry_count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entry_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_depends_on_every_input() {
        let config = MiningConfig::default();
        let base = CacheKey::new("[]", Metric::Lift, &config);

        assert_eq!(base, CacheKey::new("[]", Metric::Lift, &config));
        assert_ne!(base, CacheKey::new("[ ]", Metric::Lift, &config));
        assert_ne!(base, CacheKey::new("[]", Metric::Confidence, &config));
        assert_ne!(
            base,
            CacheKey::new("[]", Metric::Lift, &config.clone().with_min_support(0.5))
        );
        assert_ne!(
            base,
            CacheKey::new("[]", Metric::Lift, &config.clone().with_max_len(Some(2)))
        );
        assert_eq!(base.as_str().len(), 64);
    }

    #[tokio::test]
    async fn test_hits_and_misses() {
        let cache = ResultCache::new(16, 3600);
        let key = CacheKey::new("[]", Metric::Lift, &MiningConfig::default());

        assert!(cache.get(&key).await.is_none());
        cache.insert(key.clone(), "{}".to_string()).await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("{}"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }
}
