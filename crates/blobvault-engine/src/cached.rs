//! Cache-aside decorator
//!
//! Wraps any `FileHosting` implementation and serves reads from the cache
//! when it can. Reads probe the cache first and populate it on a miss;
//! mutations go to the inner service first and only touch the cache after
//! the source of truth has accepted the change.
//!
//! A cache *lookup* failure is a real error and propagates: the caller
//! asked a question we could not answer. A cache *population* or
//! *invalidation* failure is logged and swallowed: the inner operation
//! already succeeded and is not rolled back over a cache hiccup. Staleness
//! is bounded by the per-key TTL, which never exceeds the configured
//! ceiling.

use crate::service::{FileHosting, UploadMeta};
use async_trait::async_trait;
use blobvault_cache::Cache;
use blobvault_common::config::CacheConfig;
use blobvault_common::{Expiry, File, FileMetadata, Result};
use bytes::Bytes;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Cache TTL for an entry describing content with the given expiry
///
/// Content is cached until it expires, but never longer than `ceiling`;
/// infinite-expiry content gets exactly the ceiling.
fn cache_ttl(expiry: Expiry, ceiling: Duration) -> Duration {
    match expiry.time_until(Utc::now()) {
        None => ceiling,
        Some(delta) => delta.to_std().unwrap_or(Duration::ZERO).min(ceiling),
    }
}

/// Cache-aside wrapper around a hosting service
pub struct CachedHosting<S> {
    inner: S,
    cache: Arc<dyn Cache>,
    key_prefix: String,
    ttl_ceiling: Duration,
}

impl<S: FileHosting> CachedHosting<S> {
    /// Wrap `inner`, namespacing cache keys per `config`
    #[must_use]
    pub fn new(inner: S, cache: Arc<dyn Cache>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache,
            key_prefix: config.key_prefix.clone(),
            ttl_ceiling: Duration::from_secs(config.ttl_ceiling_secs),
        }
    }

    fn file_key(&self, name: &str) -> String {
        format!("{}:file:{name}", self.key_prefix)
    }

    fn metadata_key(&self, name: &str) -> String {
        format!("{}:file:{name}:metadata", self.key_prefix)
    }

    fn files_key(&self) -> String {
        format!("{}:files", self.key_prefix)
    }

    /// Probe the cache for a serialized `T` under `key`
    ///
    /// A lookup failure propagates; an entry that no longer deserializes
    /// is treated as a miss so the read falls through and overwrites it.
    async fn probe<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.cache.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let encoded = match serde_json::to_vec(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key, error = %err, "fail encode cache entry");
                return;
            }
        };
        if let Err(err) = self.cache.set(key, encoded.into(), ttl).await {
            warn!(key, error = %err, "fail populate cache");
        }
    }

    async fn invalidate(&self, keys: &[&str]) {
        if let Err(err) = self.cache.delete(keys).await {
            warn!(?keys, error = %err, "fail invalidate cache");
        }
    }

    /// Cache both per-name entries for a freshly read or written file
    async fn prime(&self, name: &str, file: &File) {
        let ttl = cache_ttl(file.metadata.expired_at, self.ttl_ceiling);
        self.populate(&self.file_key(name), file, ttl).await;
        self.populate(&self.metadata_key(name), &file.metadata, ttl)
            .await;
    }
}

#[async_trait]
impl<S: FileHosting> FileHosting for CachedHosting<S> {
    async fn upload_file(
        &self,
        name: &str,
        content: Bytes,
        meta: UploadMeta,
        ttl_spec: &str,
    ) -> Result<(String, File)> {
        let (name, file) = self.inner.upload_file(name, content, meta, ttl_spec).await?;
        self.prime(&name, &file).await;
        self.invalidate(&[&self.files_key()]).await;
        Ok((name, file))
    }

    async fn upload_file_with_generated_name(
        &self,
        content: Bytes,
        meta: UploadMeta,
        ttl_spec: &str,
    ) -> Result<(String, File)> {
        let (name, file) = self
            .inner
            .upload_file_with_generated_name(content, meta, ttl_spec)
            .await?;
        self.prime(&name, &file).await;
        self.invalidate(&[&self.files_key()]).await;
        Ok((name, file))
    }

    async fn get_file(&self, name: &str) -> Result<File> {
        let key = self.file_key(name);
        if let Some(file) = self.probe::<File>(&key).await? {
            return Ok(file);
        }
        let file = self.inner.get_file(name).await?;
        self.prime(name, &file).await;
        Ok(file)
    }

    async fn get_file_metadata(&self, name: &str) -> Result<FileMetadata> {
        let key = self.metadata_key(name);
        if let Some(metadata) = self.probe::<FileMetadata>(&key).await? {
            return Ok(metadata);
        }
        let metadata = self.inner.get_file_metadata(name).await?;
        let ttl = cache_ttl(metadata.expired_at, self.ttl_ceiling);
        self.populate(&key, &metadata, ttl).await;
        Ok(metadata)
    }

    async fn get_files(&self) -> Result<Vec<FileMetadata>> {
        let key = self.files_key();
        if let Some(files) = self.probe::<Vec<FileMetadata>>(&key).await? {
            return Ok(files);
        }
        let files = self.inner.get_files().await?;
        // The listing has no single expiry; the ceiling bounds it.
        self.populate(&key, &files, self.ttl_ceiling).await;
        Ok(files)
    }

    async fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.inner.rename_file(old_name, new_name).await?;
        self.invalidate(&[
            &self.file_key(old_name),
            &self.metadata_key(old_name),
            &self.files_key(),
        ])
        .await;
        Ok(())
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        self.inner.delete_file(name).await?;
        self.invalidate(&[
            &self.file_key(name),
            &self.metadata_key(name),
            &self.files_key(),
        ])
        .await;
        Ok(())
    }
}
