//! Cache contract

use async_trait::async_trait;
use blobvault_common::Result;
use bytes::Bytes;
use std::time::Duration;

/// Key/value store with per-key TTL and miss signaling
///
/// A miss is `Ok(None)`, never an error; errors mean the cache itself
/// failed. The decorator treats set/delete failures as non-fatal.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up `key`, returning `None` on a miss
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store `value` under `key` for at most `ttl`
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;

    /// Remove the given keys; missing keys are not an error
    async fn delete(&self, keys: &[&str]) -> Result<()>;
}
