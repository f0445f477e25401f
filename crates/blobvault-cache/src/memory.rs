//! In-memory cache implementation
//!
//! Entries expire lazily: a stale entry is dropped on the read that finds
//! it, which is all the cache-aside decorator needs for bounded staleness.

use crate::cache::Cache;
use async_trait::async_trait;
use blobvault_common::Result;
use bytes::Bytes;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: Bytes,
    expires_at: Instant,
}

/// Cache backed by an in-process concurrent map
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (stale ones included until touched)
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }
        // Stale: drop it and report a miss
        self.entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = MemoryCache::new();
        cache
            .set("k", Bytes::from_static(b"v"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.get("k").await.unwrap(),
            Some(Bytes::from_static(b"v"))
        );
    }

    #[tokio::test]
    async fn test_miss_is_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = MemoryCache::new();
        cache
            .set("k", Bytes::from_static(b"v"), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_immediately_stale() {
        let cache = MemoryCache::new();
        cache
            .set("k", Bytes::from_static(b"v"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let cache = MemoryCache::new();
        cache
            .set("a", Bytes::from_static(b"1"), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("b", Bytes::from_static(b"2"), Duration::from_secs(60))
            .await
            .unwrap();

        cache.delete(&["a", "b", "missing"]).await.unwrap();
        assert!(cache.is_empty());
    }
}
