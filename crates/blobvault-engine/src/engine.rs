//! File lifecycle engine
//!
//! Orchestrates upload (dedup + versioning + TTL), read, rename and delete
//! against the byte store, and schedules deletion jobs on the queue for
//! every finite-TTL generation.
//!
//! A deletion job is published *before* the content is written: a crash
//! between publish and write leaves a spurious job for a name with no
//! metadata, which the consumer drops, whereas the opposite order could
//! leave a finite-TTL object nobody will ever delete.
//!
//! Known race, kept on purpose: the exists-then-write sequence in the
//! upload path is not atomic. Two concurrent uploads to the same fresh
//! name can both observe "does not exist"; the store's no-overwrite rule
//! then fails the loser with `Conflict`. No per-name lock is taken.

use crate::mime;
use crate::service::{FileHosting, UploadMeta};
use crate::ttl::{TtlSpec, TtlTable};
use async_trait::async_trait;
use blobvault_common::config::EngineConfig;
use blobvault_common::hash::content_hash;
use blobvault_common::{
    sidecar_name, DeletionJob, Error, Expiry, File, FileMetadata, FileName, Result,
};
use blobvault_queue::Queue;
use blobvault_store::ByteStore;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

/// The lifecycle engine
///
/// Holds no mutable state; all coordination happens through the byte
/// store and the queue, which must be safe for concurrent use.
pub struct HostingEngine {
    store: Arc<dyn ByteStore>,
    queue: Arc<dyn Queue>,
    ttl: TtlTable,
    deletion_queue: String,
}

impl HostingEngine {
    /// Create an engine and declare its deletion queue
    pub async fn new(
        store: Arc<dyn ByteStore>,
        queue: Arc<dyn Queue>,
        config: &EngineConfig,
    ) -> Result<Self> {
        Self::with_ttl_table(store, queue, &config.deletion_queue, TtlTable::from_config(config))
            .await
    }

    /// Create an engine with an explicit TTL table
    pub async fn with_ttl_table(
        store: Arc<dyn ByteStore>,
        queue: Arc<dyn Queue>,
        deletion_queue: &str,
        ttl: TtlTable,
    ) -> Result<Self> {
        queue.declare(deletion_queue).await?;
        Ok(Self {
            store,
            queue,
            ttl,
            deletion_queue: deletion_queue.to_string(),
        })
    }

    /// Name of the queue deletion jobs are published on
    #[must_use]
    pub fn deletion_queue(&self) -> &str {
        &self.deletion_queue
    }

    async fn schedule_delete(
        &self,
        name: &str,
        hash: &str,
        expired_at: DateTime<Utc>,
    ) -> Result<()> {
        let job = DeletionJob {
            file_name: name.to_string(),
            content_hash: hash.to_string(),
            expired_at,
        };
        let payload = job
            .to_bytes()
            .map_err(|err| Error::serialization(format!("fail serialize deletion job: {err}")))?;
        self.queue
            .publish(&self.deletion_queue, payload.into())
            .await
            .map_err(|err| Error::internal(format!("fail schedule deletion of {name}: {err}")))?;
        debug!(file = name, expired_at = %expired_at, "scheduled deletion job");
        Ok(())
    }

    /// Archive the current generation under a timestamp-suffixed name
    ///
    /// Returns the archival name recorded as `backup_name` on the new
    /// generation. The inherited deletion job is published before the
    /// moves, mirroring the publish-before-write rule for uploads.
    async fn archive_generation(&self, name: &str, now: DateTime<Utc>) -> Result<String> {
        let archival = format!("{name}.{}", unix_nanos(now));

        if let Ok(old_metadata) = self.read_metadata(name).await {
            if let Expiry::At(at) = old_metadata.expired_at {
                self.schedule_delete(&archival, &old_metadata.content_hash, at)
                    .await?;
            }
        }

        self.store.rename(name, &archival).await?;
        if let Err(err) = self
            .store
            .rename(&sidecar_name(name), &sidecar_name(&archival))
            .await
        {
            // Best-effort compensation: put the content back so readers
            // do not see a half-archived generation.
            if let Err(undo) = self.store.rename(&archival, name).await {
                error!(file = name, error = %undo, "fail restore content after sidecar move failure");
            }
            return Err(Error::internal(format!(
                "fail archive metadata of file {name}: {err}"
            )));
        }

        info!(file = name, archival = archival.as_str(), "archived prior generation");
        Ok(archival)
    }

    async fn read_metadata(&self, name: &str) -> Result<FileMetadata> {
        let data = self.store.read(&sidecar_name(name)).await?;
        FileMetadata::from_bytes(&data)
            .map_err(|_| Error::internal(format!("fail read metadata of file {name}")))
    }

    /// Write content then sidecar; a sidecar failure deletes the content
    /// again so no partial generation stays visible.
    async fn write_generation(
        &self,
        name: &str,
        content: Bytes,
        metadata: &FileMetadata,
    ) -> Result<()> {
        let encoded = metadata
            .to_bytes()
            .map_err(|err| Error::serialization(format!("fail serialize metadata: {err}")))?;

        self.store
            .write(name, content, &metadata.mime_type)
            .await?;
        if let Err(err) = self
            .store
            .write(&sidecar_name(name), encoded.into(), "application/json")
            .await
        {
            if let Err(undo) = self.store.delete(name).await {
                error!(file = name, error = %undo, "fail delete content after sidecar write failure");
            }
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl FileHosting for HostingEngine {
    async fn upload_file(
        &self,
        name: &str,
        content: Bytes,
        meta: UploadMeta,
        ttl_spec: &str,
    ) -> Result<(String, File)> {
        let name = FileName::new(name)?;
        let name = name.as_str();
        let now = Utc::now();

        let mime_type = meta
            .mime_type
            .unwrap_or_else(|| mime::sniff(&content).to_string());
        let expired_at = match self.ttl.resolve(ttl_spec) {
            TtlSpec::Infinite => Expiry::Never,
            TtlSpec::Finite(delta) => Expiry::At(now + delta),
        };
        let new_hash = content_hash(&content);

        let mut backup_name = None;
        if self.store.exists(name).await {
            if let Ok(old_content) = self.store.read(name).await {
                if content_hash(&old_content) == new_hash {
                    // Identical bytes: idempotent no-op, nothing written,
                    // nothing scheduled.
                    debug!(file = name, "idempotent upload, content unchanged");
                    let metadata = self.read_metadata(name).await?;
                    return Ok((name.to_string(), File { content, metadata }));
                }
            }
            backup_name = Some(self.archive_generation(name, now).await?);
        }

        let metadata = FileMetadata {
            id: name.to_string(),
            name: name.to_string(),
            mime_type,
            content_hash: new_hash,
            tags: meta.tags,
            created_at: now,
            expired_at,
            backup_name,
        };

        if let Expiry::At(at) = metadata.expired_at {
            self.schedule_delete(name, &metadata.content_hash, at).await?;
        }
        self.write_generation(name, content.clone(), &metadata).await?;

        info!(file = name, mime = metadata.mime_type.as_str(), "uploaded file");
        Ok((name.to_string(), File { content, metadata }))
    }

    async fn upload_file_with_generated_name(
        &self,
        content: Bytes,
        meta: UploadMeta,
        ttl_spec: &str,
    ) -> Result<(String, File)> {
        let mut name = generate_name();
        while self.store.exists(&name).await {
            name = generate_name();
        }

        let now = Utc::now();
        let mime_type = meta
            .mime_type
            .unwrap_or_else(|| mime::sniff(&content).to_string());
        let expired_at = now + self.ttl.resolve_finite(ttl_spec);

        let metadata = FileMetadata {
            id: name.clone(),
            name: meta.name.unwrap_or_else(|| name.clone()),
            mime_type,
            content_hash: content_hash(&content),
            tags: meta.tags,
            created_at: now,
            expired_at: Expiry::At(expired_at),
            backup_name: None,
        };

        self.schedule_delete(&name, &metadata.content_hash, expired_at)
            .await?;
        self.write_generation(&name, content.clone(), &metadata).await?;

        info!(file = name.as_str(), "uploaded file under generated name");
        Ok((name, File { content, metadata }))
    }

    async fn get_file(&self, name: &str) -> Result<File> {
        let name = FileName::new(name)?;
        let content = self.store.read(name.as_str()).await?;
        let metadata = self.read_metadata(name.as_str()).await?;
        Ok(File { content, metadata })
    }

    async fn get_file_metadata(&self, name: &str) -> Result<FileMetadata> {
        let name = FileName::new(name)?;
        self.read_metadata(name.as_str()).await
    }

    async fn get_files(&self) -> Result<Vec<FileMetadata>> {
        let names = self.store.list().await?;
        let mut files = Vec::with_capacity(names.len());
        for name in &names {
            files.push(self.read_metadata(name).await?);
        }
        Ok(files)
    }

    async fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        let old_name = FileName::new(old_name)?;
        let new_name = FileName::new(new_name)?;
        let (old_name, new_name) = (old_name.as_str(), new_name.as_str());

        self.store.rename(old_name, new_name).await?;
        if let Err(err) = self
            .store
            .rename(&sidecar_name(old_name), &sidecar_name(new_name))
            .await
        {
            if let Err(undo) = self.store.rename(new_name, old_name).await {
                error!(file = old_name, error = %undo, "fail restore content after sidecar move failure");
            }
            return Err(err);
        }
        info!(file = old_name, to = new_name, "renamed file");
        Ok(())
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        let name = FileName::new(name)?;
        self.store.delete(name.as_str()).await?;
        self.store.delete(&sidecar_name(name.as_str())).await?;
        info!(file = %name, "deleted file");
        Ok(())
    }
}

/// Nanoseconds since the Unix epoch, wide enough to never overflow
fn unix_nanos(at: DateTime<Utc>) -> i128 {
    i128::from(at.timestamp()) * 1_000_000_000 + i128::from(at.timestamp_subsec_nanos())
}

/// Generate a short collision-resistant name: the last four base-36
/// digits of the current Unix-millis time plus a random 16-bit hex suffix
fn generate_name() -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    let time_part = to_base36(millis);
    let time_part = &time_part[time_part.len().saturating_sub(4)..];
    let rand_part: u16 = rand::random();
    format!("{time_part}{rand_part:x}")
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
