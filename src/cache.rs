use std::future::Future;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// String-keyed TTL cache for rarely changing carrier data (branch list,
/// per-destination rates). Passed around by handle; no global singleton.
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.entries.remove(key);
            None
        }
    }

    pub fn put(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Return the live entry for `key`, or run `compute`, store its result
    /// for `ttl`, and return it. Failed computes are not cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Value, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, AppError>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = compute().await?;
        self.put(key, value.clone(), ttl);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::TtlCache;
    use crate::error::AppError;

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = TtlCache::new();
        let mut calls = 0;

        for _ in 0..2 {
            let value = cache
                .get_or_compute("branches", Duration::from_secs(60), || {
                    calls += 1;
                    async { Ok(json!(["KATHMANDU", "BIRGUNJ"])) }
                })
                .await
                .unwrap();
            assert_eq!(value, json!(["KATHMANDU", "BIRGUNJ"]));
        }

        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn expired_entries_are_recomputed() {
        let cache = TtlCache::new();
        cache.put("rate", json!({ "charge": 100 }), Duration::from_secs(0));

        let value = cache
            .get_or_compute("rate", Duration::from_secs(60), || async {
                Ok(json!({ "charge": 150 }))
            })
            .await
            .unwrap();

        assert_eq!(value, json!({ "charge": 150 }));
    }

    #[tokio::test]
    async fn failed_computes_are_not_cached() {
        let cache = TtlCache::new();

        let err = cache
            .get_or_compute("rate", Duration::from_secs(60), || async {
                Err(AppError::Upstream("carrier down".to_string()))
            })
            .await;
        assert!(err.is_err());
        assert!(cache.get("rate").is_none());

        let value = cache
            .get_or_compute("rate", Duration::from_secs(60), || async {
                Ok(json!({ "charge": 90 }))
            })
            .await
            .unwrap();
        assert_eq!(value, json!({ "charge": 90 }));
    }
}
