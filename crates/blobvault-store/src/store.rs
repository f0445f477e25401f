//! Byte store contract

use async_trait::async_trait;
use blobvault_common::Result;
use bytes::Bytes;

/// Named-object storage primitive consumed by the lifecycle engine
///
/// `write` never overwrites silently: a write to an occupied name fails
/// with `Conflict`, and the engine is responsible for relocating the
/// existing object first. Implementations must be safe for concurrent use;
/// the engine adds no locking of its own.
#[async_trait]
pub trait ByteStore: Send + Sync {
    /// Whether an object exists under `name`
    async fn exists(&self, name: &str) -> bool;

    /// Read the object stored under `name`
    ///
    /// Fails with `NotFound` if the name is unoccupied.
    async fn read(&self, name: &str) -> Result<Bytes>;

    /// Write `data` under `name`
    ///
    /// Fails with `Conflict` if the name is occupied. `content_type` is
    /// advisory; the disk adapter ignores it while an object-storage
    /// adapter would forward it.
    async fn write(&self, name: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Move the object at `name` to `new_name`
    async fn rename(&self, name: &str, new_name: &str) -> Result<()>;

    /// Delete the object stored under `name`
    async fn delete(&self, name: &str) -> Result<()>;

    /// List all content object names, excluding metadata sidecars
    async fn list(&self) -> Result<Vec<String>>;
}
